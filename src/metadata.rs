//! PxWeb table metadata
//!
//! A GET on a PxWeb table URL returns its variables and their value codes,
//! which is how a front-end turns a municipality name typed by a user into
//! the code used in a query.

use serde::{Deserialize, Serialize};

/// One variable of a PxWeb table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub code: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub value_texts: Vec<String>,
    /// Whether the variable may be left out of a query
    #[serde(default)]
    pub elimination: bool,
    #[serde(default)]
    pub time: bool,
}

impl Variable {
    /// Find a value code by its text (or by the code itself), ignoring case
    /// and surrounding whitespace. Returns `(code, text)`.
    pub fn find_value(&self, text: &str) -> Option<(&str, &str)> {
        let wanted = text.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        let by_text = self
            .value_texts
            .iter()
            .position(|t| t.trim().to_lowercase() == wanted);
        let pos = by_text.or_else(|| self.values.iter().position(|v| v.to_lowercase() == wanted))?;

        let code = self.values.get(pos)?;
        let text = self.value_texts.get(pos).unwrap_or(code);
        Some((code.as_str(), text.as_str()))
    }

    /// Text for a value code
    pub fn text_of(&self, code: &str) -> Option<&str> {
        let pos = self.values.iter().position(|v| v == code)?;
        self.value_texts.get(pos).map(String::as_str)
    }
}

/// Metadata of a PxWeb table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl TableMetadata {
    /// Variable by exact code (case-insensitive), then by text substring
    pub fn variable(&self, code_or_hint: &str) -> Option<&Variable> {
        let wanted = code_or_hint.to_lowercase();
        self.variables
            .iter()
            .find(|v| v.code.to_lowercase() == wanted)
            .or_else(|| {
                self.variables
                    .iter()
                    .find(|v| v.text.to_lowercase().contains(&wanted))
            })
    }

    /// Value code for a text within a variable
    pub fn find_value(&self, variable: &str, text: &str) -> Option<(&str, &str)> {
        self.variable(variable)?.find_value(text)
    }

    /// The time variable
    pub fn time_variable(&self) -> Option<&Variable> {
        self.variables.iter().find(|v| v.time)
    }

    /// Last value of the time variable (PxWeb lists time ascending)
    pub fn latest_time_value(&self) -> Option<&str> {
        self.time_variable()?.values.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TableMetadata {
        serde_json::from_value(serde_json::json!({
            "title": "Births and deaths by area",
            "variables": [
                {
                    "code": "Alue",
                    "text": "Area",
                    "values": ["SSS", "KU049", "KU091"],
                    "valueTexts": ["WHOLE COUNTRY", "Espoo", "Helsinki"],
                    "elimination": true
                },
                {
                    "code": "Vuosi",
                    "text": "Year",
                    "values": ["2020", "2021", "2022"],
                    "valueTexts": ["2020", "2021", "2022"],
                    "time": true
                },
                {
                    "code": "Tiedot",
                    "text": "Information",
                    "values": ["vm01", "vm11"],
                    "valueTexts": ["Live births", "Deaths"]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_find_value_by_name() {
        let meta = metadata();
        assert_eq!(meta.find_value("Alue", "  helsinki "), Some(("KU091", "Helsinki")));
        assert_eq!(meta.find_value("alue", "KU049"), Some(("KU049", "Espoo")));
        assert_eq!(meta.find_value("Alue", "Atlantis"), None);
        assert_eq!(meta.find_value("Alue", ""), None);
    }

    #[test]
    fn test_variable_lookup_by_text() {
        let meta = metadata();
        assert_eq!(meta.variable("information").unwrap().code, "Tiedot");
        assert!(meta.variable("Sukupuoli").is_none());
    }

    #[test]
    fn test_latest_time_value() {
        let meta = metadata();
        assert_eq!(meta.time_variable().unwrap().code, "Vuosi");
        assert_eq!(meta.latest_time_value(), Some("2022"));
    }

    #[test]
    fn test_text_of() {
        let meta = metadata();
        assert_eq!(meta.variable("Tiedot").unwrap().text_of("vm11"), Some("Deaths"));
    }
}
