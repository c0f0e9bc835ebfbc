//! PxWeb query bodies
//!
//! A PxWeb table is queried by POSTing a list of per-variable filters plus
//! the desired response format:
//!
//! ```json
//! {"query": [{"code": "Vuosi", "selection": {"filter": "item", "values": ["2021"]}}],
//!  "response": {"format": "json-stat2"}}
//! ```

use crate::types::ResponseFormat;
use serde::{Deserialize, Serialize};

/// Selection filter of one query item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// `item`, `all`, `top`, or an aggregation such as `agg:...` / `vs:...`
    pub filter: String,
    pub values: Vec<String>,
}

/// Filter for one table variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    /// Variable code (e.g. "Alue")
    pub code: String,
    pub selection: QueryFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub format: ResponseFormat,
}

/// Complete PxWeb query body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PxQuery {
    pub query: Vec<QueryItem>,
    pub response: ResponseSpec,
}

impl Default for PxQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl PxQuery {
    /// Empty query asking for JSON-stat2
    pub fn new() -> Self {
        Self {
            query: Vec::new(),
            response: ResponseSpec {
                format: ResponseFormat::JsonStat2,
            },
        }
    }

    /// Add an item with an arbitrary filter
    #[must_use]
    pub fn filter<I, S>(mut self, code: impl Into<String>, filter: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.push(QueryItem {
            code: code.into(),
            selection: QueryFilter {
                filter: filter.into(),
                values: values.into_iter().map(Into::into).collect(),
            },
        });
        self
    }

    /// Select listed values of a variable
    #[must_use]
    pub fn item<I, S>(self, code: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(code, "item", values)
    }

    /// Select every value of a variable
    #[must_use]
    pub fn all(self, code: impl Into<String>) -> Self {
        self.filter(code, "all", ["*"])
    }

    /// Select the latest `n` values of a (time) variable
    #[must_use]
    pub fn top(self, code: impl Into<String>, n: usize) -> Self {
        self.filter(code, "top", [n.to_string()])
    }

    /// Set the response format
    #[must_use]
    pub fn format(mut self, format: ResponseFormat) -> Self {
        self.response.format = format;
        self
    }

    /// Item for a variable code
    pub fn get(&self, code: &str) -> Option<&QueryItem> {
        self.query.iter().find(|q| q.code == code)
    }

    /// JSON body
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "query": self.query,
            "response": { "format": self.response.format.as_str() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_body_shape() {
        let query = PxQuery::new()
            .item("Vuosi", ["2021"])
            .all("Alue")
            .item("Sukupuoli", ["SSS"]);

        assert_eq!(
            query.to_json(),
            json!({
                "query": [
                    {"code": "Vuosi", "selection": {"filter": "item", "values": ["2021"]}},
                    {"code": "Alue", "selection": {"filter": "all", "values": ["*"]}},
                    {"code": "Sukupuoli", "selection": {"filter": "item", "values": ["SSS"]}}
                ],
                "response": {"format": "json-stat2"}
            })
        );
    }

    #[test]
    fn test_top_and_format() {
        let query = PxQuery::new().top("Vuosi", 1).format(ResponseFormat::Px);
        let body = query.to_json();
        assert_eq!(body["query"][0]["selection"]["filter"], "top");
        assert_eq!(body["query"][0]["selection"]["values"][0], "1");
        assert_eq!(body["response"]["format"], "px");
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
query:
  - code: Tiedot
    selection:
      filter: item
      values: [vm01, vm11]
response:
  format: json-stat2
"#;
        let query: PxQuery = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(query.get("Tiedot").unwrap().selection.values, vec!["vm01", "vm11"]);
        assert_eq!(query.response.format, ResponseFormat::JsonStat2);
    }
}
