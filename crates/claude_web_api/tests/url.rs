use claude_web_api::url::{conversation_route, endpoint, normalize_base_url, DEFAULT_BASE_URL};

#[test]
fn normalize_appends_trailing_slash() {
    assert_eq!(
        normalize_base_url("https://example.test/api"),
        "https://example.test/api/"
    );
    assert_eq!(
        normalize_base_url("https://example.test/api/"),
        "https://example.test/api/"
    );
}

#[test]
fn normalize_blank_uses_default_origin() {
    assert_eq!(normalize_base_url("  "), format!("{DEFAULT_BASE_URL}/"));
}

#[test]
fn endpoint_joins_routes_without_double_slash() {
    assert_eq!(
        endpoint("http://127.0.0.1:9000", "/append_message"),
        "http://127.0.0.1:9000/append_message"
    );
    assert_eq!(
        endpoint(
            "http://127.0.0.1:9000/",
            &conversation_route("org-1", "conv-2")
        ),
        "http://127.0.0.1:9000/organizations/org-1/chat_conversations/conv-2"
    );
}
