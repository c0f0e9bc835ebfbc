//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML catalog → PxWeb POST → decoded rows

use pretty_assertions::assert_eq;
use pxcube::catalogs;
use pxcube::join::{AreaKeyIndex, JoinStrategy};
use pxcube::loader::load_catalog_from_str;
use pxcube::stats;
use pxcube::{load_catalog, Cell, DatasetLoader, DecodedValue, Error, Origin};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_yaml(base_url: &str) -> String {
    format!(
        r#"
name: mock-statfin
base_url: {base_url}
http:
  max_retries: 0
  rate_limit: null
headers:
  Content-Type: application/json
datasets:
  - name: unemployment
    title: Unemployment rate (%)
    path: /tyokay/115b.px
    query:
      - code: Alue
        filter: all
        values: ["*"]
      - code: Tiedot
        values: [tyottomyysaste]
    fixed:
      - role: measure
        hints: [tiedot]
        key: tyottomyysaste
    fallback:
      rows:
        - {{ key: KU091, label: Helsinki, value: 5.5 }}
        - {{ key: KU049, label: Espoo, value: 4.8 }}
  - name: births_deaths
    path: /synt/12dy.px
    fixed:
      - role: year
        hints: [vuosi]
        key: "2023"
      - role: measure
        hints: [tiedot]
        keys: [vm01, vm11]
    measures: [Births, Deaths]
  - name: population
    path: /vaerak/11ra.px
    scale:
      kind: infer_thousands
"#
    )
}

/// JSON-stat2 response: two areas by two years by two measures
fn births_deaths_table() -> serde_json::Value {
    json!({
        "version": "2.0",
        "class": "dataset",
        "label": "Births and deaths by area",
        "source": "Statistics Finland",
        "id": ["Alue", "Vuosi", "Tiedot"],
        "size": [2, 2, 2],
        "dimension": {
            "Alue": {"label": "Area", "category": {
                "index": {"KU091": 0, "KU049": 1},
                "label": {"KU091": "Helsinki", "KU049": "Espoo"}
            }},
            "Vuosi": {"label": "Year", "category": {"index": {"2022": 0, "2023": 1}}},
            "Tiedot": {"label": "Information", "category": {"index": {"vm01": 0, "vm11": 1}}}
        },
        "value": [6100, 5200, 6000, 5300, 3000, 1500, 2900, null]
    })
}

/// PxWeb "px" bundle with the dimension ids nested under `dimension`
fn unemployment_bundle() -> serde_json::Value {
    json!({
        "dataset": {
            "label": "Unemployment rate",
            "dimension": {
                "Alue": {"category": {
                    "index": {"KU091": 0, "KU049": 1, "KU837": 2},
                    "label": {"KU091": "Helsinki", "KU049": "Espoo", "KU837": "Tampere"}
                }},
                "Tiedot": {"category": {"index": {"tyottomyysaste": 0}}},
                "id": ["Alue", "Tiedot"],
                "size": [3, 1]
            },
            "value": [9.8, 7.6, 11.2]
        }
    })
}

async fn loader_for(server: &MockServer) -> DatasetLoader {
    let catalog = load_catalog_from_str(&catalog_yaml(&server.uri())).unwrap();
    DatasetLoader::new(catalog).unwrap()
}

// ============================================================================
// Live Loading Tests
// ============================================================================

#[tokio::test]
async fn test_live_px_bundle_scalar() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tyokay/115b.px"))
        .and(body_partial_json(json!({
            "query": [
                {"code": "Alue", "selection": {"filter": "all", "values": ["*"]}},
                {"code": "Tiedot", "selection": {"filter": "item", "values": ["tyottomyysaste"]}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(unemployment_bundle()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let loaded = loader.load("unemployment").await.unwrap();

    assert_eq!(loaded.origin, Origin::Live);
    assert_eq!(loaded.table.area_dimension, "Alue");
    assert_eq!(loaded.table.keys().collect::<Vec<_>>(), vec!["KU091", "KU049", "KU837"]);
    assert_eq!(loaded.table.get("KU837"), Some(&DecodedValue::Scalar(Cell::Present(11.2))));
    assert_eq!(loaded.table.row("KU049").unwrap().label.as_deref(), Some("Espoo"));
}

#[tokio::test]
async fn test_live_json_stat2_vector() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/synt/12dy.px"))
        .respond_with(ResponseTemplate::new(200).set_body_json(births_deaths_table()))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let loaded = loader.load("births_deaths").await.unwrap();

    assert!(loaded.table.is_vector());
    assert_eq!(loaded.table.measures, vec!["Births", "Deaths"]);

    let helsinki = loaded.table.get("KU091").unwrap();
    assert_eq!(helsinki.channel("Births"), Some(Cell::Present(6000.0)));
    assert_eq!(helsinki.channel("Deaths"), Some(Cell::Present(5300.0)));

    let espoo = loaded.table.get("KU049").unwrap();
    assert_eq!(espoo.channel("Births"), Some(Cell::Present(2900.0)));
    assert_eq!(espoo.channel("Deaths"), Some(Cell::Missing));

    assert_eq!(stats::leading_channel(helsinki), Some("Births"));
    let means = stats::channel_means(&loaded.table);
    assert_eq!(means[0], ("Births".to_string(), Some(4450.0)));
    assert_eq!(means[1], ("Deaths".to_string(), Some(5300.0)));
}

#[tokio::test]
async fn test_live_scale_inference() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vaerak/11ra.px"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "class": "dataset",
            "id": ["Alue"],
            "size": [2],
            "dimension": {"Alue": {"category": {"index": ["KU091", "KU049"]}}},
            "value": [664.0, 305.2]
        })))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let loaded = loader.load("population").await.unwrap();

    assert_eq!(loaded.multiplier, 1000.0);
    assert_eq!(loaded.table.get("KU091"), Some(&DecodedValue::Scalar(Cell::Present(664_000.0))));
}

// ============================================================================
// Fallback Tests
// ============================================================================

#[tokio::test]
async fn test_server_error_serves_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tyokay/115b.px"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let loaded = loader.load("unemployment").await.unwrap();

    assert!(loaded.origin.is_fallback());
    assert_eq!(loaded.table.get("KU091"), Some(&DecodedValue::Scalar(Cell::Present(5.5))));
    let mean = stats::mean(&loaded.table).unwrap();
    assert!((mean - 5.15).abs() < 1e-9);
}

#[tokio::test]
async fn test_server_error_without_fallback_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/synt/12dy.px"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let err = loader.load("births_deaths").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_offline_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unemployment_bundle()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server)
        .await
        .with_options(pxcube::engine::LoadOptions::offline());
    let loaded = loader.load("unemployment").await.unwrap();

    assert_eq!(loaded.origin, Origin::fallback("offline"));
    assert_eq!(loaded.table.len(), 2);
}

// ============================================================================
// Join Tests
// ============================================================================

#[tokio::test]
async fn test_join_loaded_table_to_features() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tyokay/115b.px"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unemployment_bundle()))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server).await;
    let loaded = loader.load("unemployment").await.unwrap();
    let index = AreaKeyIndex::from_table(&loaded.table);

    let joined = index.join(vec![
        ("KU091", None),
        ("049", None),
        ("837", Some("Tampere")),
        ("999", Some("Nowhere")),
        ("X", Some("helsinki")),
    ]);

    let strategies: Vec<_> = joined.iter().map(|(_, m)| m.map(|(s, _)| s)).collect();
    assert_eq!(
        strategies,
        vec![
            Some(JoinStrategy::Exact),
            Some(JoinStrategy::Normalized),
            Some(JoinStrategy::Normalized),
            None,
            Some(JoinStrategy::Name),
        ]
    );
    let (_, espoo) = joined[1].1.unwrap();
    assert_eq!(espoo.key, "KU049");
}

// ============================================================================
// Built-in Catalog Tests
// ============================================================================

#[test]
fn test_builtin_statfin_catalog() {
    let catalog = load_catalog(catalogs::DEFAULT_CATALOG).unwrap();

    assert_eq!(catalog.name, "statfin");
    assert!(catalog.base_url.starts_with("https://pxdata.stat.fi/"));
    for dataset in &catalog.datasets {
        assert!(dataset.selection().is_ok(), "dataset {}", dataset.name);
    }
}

#[tokio::test]
async fn test_builtin_catalog_offline() {
    let catalog = load_catalog("statfin").unwrap();
    let loader = DatasetLoader::new(catalog)
        .unwrap()
        .with_options(pxcube::engine::LoadOptions::offline());

    let loaded = loader.load("unemployment").await.unwrap();
    assert!(loaded.origin.is_fallback());
    assert_eq!(loaded.table.area_dimension, "Alue");
    assert_eq!(loaded.table.get("KU091"), Some(&DecodedValue::Scalar(Cell::Present(5.5))));
}
