use yahoo_chart_api::types::ChartResponse;

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[test]
fn deserialize_chart_full() {
    let json = load_fixture("chart.json");
    let resp: ChartResponse = serde_json::from_str(&json).unwrap();
    assert!(resp.chart.error.is_none());

    let result = &resp.chart.result.as_ref().unwrap()[0];
    let meta = result.meta.as_ref().unwrap();
    assert_eq!(meta.symbol.as_deref(), Some("EGS01041C010.CA"));
    assert_eq!(meta.currency.as_deref(), Some("EGP"));
    assert_eq!(meta.exchange_name.as_deref(), Some("CAI"));
    assert_eq!(meta.regular_market_price, Some(74.5));
    assert_eq!(result.timestamp.as_deref(), Some(&[1718438400][..]));
    assert_eq!(result.indicators.quote[0].open, vec![Some(73.9)]);
    assert_eq!(resp.first_close(), Some(74.456));
}

#[test]
fn deserialize_chart_null_close() {
    let json = load_fixture("chart_null_close.json");
    let resp: ChartResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(resp.chart.result.as_ref().unwrap().len(), 1);
    assert_eq!(resp.first_close(), None);
}

#[test]
fn deserialize_chart_error() {
    let json = load_fixture("chart_not_found.json");
    let resp: ChartResponse = serde_json::from_str(&json).unwrap();
    assert!(resp.chart.result.is_none());
    let err = resp.chart.error.unwrap();
    assert_eq!(err.code, "Not Found");
    assert!(err.description.contains("delisted"));
}

#[test]
fn deserialize_chart_sparse_meta() {
    let json = load_fixture("chart_sparse_meta.json");
    let resp: ChartResponse = serde_json::from_str(&json).unwrap();
    let meta = resp.chart.result.as_ref().unwrap()[0].meta.as_ref().unwrap();
    assert!(meta.symbol.is_none());
    assert_eq!(resp.first_close(), Some(12.5));
}
