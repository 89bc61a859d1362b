use prometheus_expfmt::{
    NameConfig, ValidationScheme, is_valid_legacy_metric_name, is_valid_legacy_metric_name_bytes,
    is_valid_metric_name,
};

#[test]
fn test_legacy_names() {
    let cases = [
        ("", false),
        ("http_requests_total", true),
        ("job:errors:rate5m", true),
        ("_leading_underscore", true),
        (":leading_colon", true),
        ("CamelCase", true),
        ("abc123", true),
        ("1leading_digit", false),
        ("with.dot", false),
        ("with-dash", false),
        ("with space", false),
        ("umlaut_ä", false),
        ("😱", false),
    ];

    for (name, expected) in cases {
        assert_eq!(is_valid_legacy_metric_name(name), expected, "{name:?}");
        assert_eq!(
            is_valid_legacy_metric_name_bytes(name.as_bytes()),
            expected,
            "{name:?}"
        );
    }
}

#[test]
fn test_legacy_bytes_reject_invalid_utf8() {
    assert!(!is_valid_legacy_metric_name_bytes(b"foo\xff"));
}

#[test]
fn test_utf8_validation() {
    let config = NameConfig::new().with_validation_scheme(ValidationScheme::Utf8);

    assert!(!config.is_valid_metric_name(""));
    assert!(config.is_valid_metric_name("http.server.duration"));
    assert!(config.is_valid_metric_name("label with 😱"));
    assert!(config.is_valid_metric_name("1leading_digit"));
    assert!(!config.is_valid_metric_name(b"foo\xffbar"));
}

#[test]
fn test_legacy_validation_ignores_utf8() {
    let config = NameConfig::new().with_validation_scheme(ValidationScheme::Legacy);

    assert!(config.is_valid_metric_name("http_server_duration"));
    assert!(!config.is_valid_metric_name("http.server.duration"));
    assert!(!config.is_valid_metric_name(""));
}

#[test]
fn test_global_defaults_to_legacy() {
    // No configuration is installed in this test binary
    assert!(is_valid_metric_name("foo_bar"));
    assert!(!is_valid_metric_name("foo.bar"));
}
