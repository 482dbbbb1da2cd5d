use super::*;

fn search_request() -> SearchRequest {
    SearchRequest {
        repo_url: "https://github.com/acme/widgets".to_string(),
        query: "authentication".to_string(),
        tool_chain: ToolChainKind::LangChain,
        limit: 10,
        since: None,
        until: None,
    }
}

// ===== LoadRequest =====

#[test]
fn test_load_request_new_defaults() {
    let req = LoadRequest::new("https://github.com/acme/widgets", "main", vec![ToolChainKind::LangChain]);
    assert!(!req.local);
    assert!(!req.create_index);
    assert!(req.max_threads.is_none());
    assert!(req.validate().is_ok());
}

#[test]
fn test_load_request_requires_tool_chain() {
    let req = LoadRequest::new("https://github.com/acme/widgets", "main", vec![]);
    assert!(matches!(req.validate(), Err(ValidationError::NoToolChains)));
}

#[test]
fn test_load_request_rejects_empty_url() {
    let req = LoadRequest::new("  ", "main", vec![ToolChainKind::LangChain]);
    assert!(matches!(req.validate(), Err(ValidationError::Empty(_))));
}

#[test]
fn test_load_request_branch_optional_when_local() {
    let mut req = LoadRequest::new("/tmp/repo", "", vec![ToolChainKind::LlamaIndex]);
    assert!(req.validate().is_err());
    req.local = true;
    assert!(req.validate().is_ok());
}

#[test]
fn test_load_request_rejects_zero_threads() {
    let mut req = LoadRequest::new("/tmp/repo", "main", vec![ToolChainKind::LangChain]);
    req.max_threads = Some(0);
    assert!(matches!(
        req.validate(),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn test_load_request_deserialize_defaults() {
    let json = r#"{"repo_url":"u","branch":"b","tool_chains":["langchain","llamaindex"]}"#;
    let req: LoadRequest = serde_json::from_str(json).unwrap();
    assert_eq!(
        req.tool_chains,
        vec![ToolChainKind::LangChain, ToolChainKind::LlamaIndex]
    );
    assert!(!req.local);
}

// ===== LoadSummary =====

#[test]
fn test_load_summary_totals() {
    let mut rows_written = BTreeMap::new();
    rows_written.insert("langchain".to_string(), 7);
    rows_written.insert("llamaindex".to_string(), 5);
    let summary = LoadSummary {
        repo_url: "u".to_string(),
        commit_count: 7,
        workloads: vec![],
        ranges: vec![],
        rows_written,
        tables: BTreeMap::new(),
        failed_ranges: vec![],
        indexed_tables: vec![],
        duration_ms: 1,
    };

    assert_eq!(summary.total_rows(), 12);
    assert!(summary.is_complete());
}

// ===== SearchRequest =====

#[test]
fn test_search_request_default_limit() {
    let json = r#"{"repo_url":"u","query":"q","tool_chain":"llamaindex"}"#;
    let req: SearchRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.limit, 10);
    assert_eq!(req.tool_chain, ToolChainKind::LlamaIndex);
}

#[test]
fn test_search_request_validation() {
    assert!(search_request().validate().is_ok());

    let mut empty = search_request();
    empty.query = " ".to_string();
    assert!(empty.validate().is_err());

    let mut zero = search_request();
    zero.limit = 0;
    assert!(zero.validate().is_err());
}

#[test]
fn test_time_window_open() {
    assert_eq!(search_request().time_window().unwrap(), TimeWindow::default());
}

#[test]
fn test_time_window_bare_dates_cover_whole_days() {
    let mut req = search_request();
    req.since = Some("2024-01-01".to_string());
    req.until = Some("2024-01-01".to_string());

    let window = req.time_window().unwrap();
    assert_eq!(window.since, Some(1_704_067_200));
    assert_eq!(window.until, Some(1_704_067_200 + 86_399));
}

#[test]
fn test_time_window_rejects_garbage() {
    let mut req = search_request();
    req.until = Some("last tuesday".to_string());
    assert!(matches!(
        req.time_window(),
        Err(ValidationError::InvalidDate(ref s)) if s == "last tuesday"
    ));
}

// ===== parse_date_filter =====

#[test]
fn test_parse_unix_seconds() {
    assert_eq!(parse_date_filter("1704067200").unwrap(), 1_704_067_200);
}

#[test]
fn test_parse_rfc3339_with_offset() {
    assert_eq!(
        parse_date_filter("2024-01-01T02:00:00+02:00").unwrap(),
        1_704_067_200
    );
}

#[test]
fn test_parse_plain_date_is_utc_midnight() {
    assert_eq!(parse_date_filter(" 2024-01-01 ").unwrap(), 1_704_067_200);
}

#[test]
fn test_parse_until_keeps_precise_times() {
    assert_eq!(parse_until_filter("1704067200").unwrap(), 1_704_067_200);
}
