use prometheus_expfmt::{
    EscapingScheme, Format, FormatType, NameConfig, Negotiator, escaping_scheme_to_format,
    format_to_escaping_scheme,
};

const PROTO_ACCEPT: &str = "application/vnd.google.protobuf;proto=io.prometheus.client.MetricFamily";

fn negotiator(default: EscapingScheme) -> Negotiator {
    Negotiator::new(NameConfig::new().with_default_escaping_scheme(default))
}

#[test]
fn test_negotiate() {
    let cases = [
        (
            "delimited format",
            format!("{PROTO_ACCEPT};encoding=delimited"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited; escaping=underscores",
        ),
        (
            "text format",
            format!("{PROTO_ACCEPT};encoding=text"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=text; escaping=underscores",
        ),
        (
            "compact text format",
            format!("{PROTO_ACCEPT};encoding=compact-text"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=compact-text; escaping=underscores",
        ),
        (
            "plain text format",
            "text/plain;version=0.0.4".to_owned(),
            "text/plain; version=0.0.4; charset=utf-8; escaping=underscores",
        ),
        (
            "delimited format utf8",
            format!("{PROTO_ACCEPT};encoding=delimited; validation-scheme=utf8;"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited; validchars=utf8",
        ),
        (
            "text format utf8",
            format!("{PROTO_ACCEPT};encoding=text; validation-scheme=utf8;"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=text; validchars=utf8",
        ),
        (
            "compact text format utf8",
            format!("{PROTO_ACCEPT};encoding=compact-text; validation-scheme=utf8;"),
            "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=compact-text; validchars=utf8",
        ),
        (
            "plain text format 0.0.4 with utf8 not valid, falls back",
            "text/plain;version=0.0.4;validation-scheme=utf8;".to_owned(),
            "text/plain; version=0.0.4; charset=utf-8; escaping=underscores",
        ),
        (
            "plain text format 1.0.0",
            "text/plain;version=1.0.0;".to_owned(),
            "text/plain; version=1.0.0; charset=utf-8; escaping=underscores",
        ),
        (
            "plain text format 1.0.0 with utf8",
            "text/plain;version=1.0.0; validation-scheme=utf8;".to_owned(),
            "text/plain; version=1.0.0; charset=utf-8; validchars=utf8",
        ),
        (
            "OpenMetrics is not offered",
            "application/openmetrics-text;version=1.0.0".to_owned(),
            "text/plain; version=0.0.4; charset=utf-8; escaping=underscores",
        ),
    ];

    let negotiator = negotiator(EscapingScheme::Underscores);
    for (name, accept, expected) in cases {
        assert_eq!(negotiator.negotiate(&accept).as_str(), expected, "{name}");
    }
}

#[test]
fn test_negotiate_open_metrics() {
    let cases = [
        (
            "OM format, no version",
            "application/openmetrics-text",
            "application/openmetrics-text; version=0.0.1; charset=utf-8; escaping=values",
        ),
        (
            "OM format, 0.0.1 version",
            "application/openmetrics-text;version=0.0.1",
            "application/openmetrics-text; version=0.0.1; charset=utf-8; escaping=values",
        ),
        (
            "OM format, 1.0.0 version",
            "application/openmetrics-text;version=1.0.0",
            "application/openmetrics-text; version=1.0.0; charset=utf-8; escaping=values",
        ),
        (
            "OM format, 2.0.0 version, legacy",
            "application/openmetrics-text;version=2.0.0;escaping=dots",
            "application/openmetrics-text; version=2.0.0; charset=utf-8; escaping=dots",
        ),
        (
            "OM format, 2.0.0 version, utf8",
            "application/openmetrics-text;version=2.0.0;validation-scheme=utf8;",
            "application/openmetrics-text; version=2.0.0; charset=utf-8; validchars=utf8",
        ),
        (
            "OM format, 0.0.1 version with utf8 is not valid, falls back",
            "application/openmetrics-text;version=0.0.1;validation-scheme=utf8;",
            "application/openmetrics-text; version=0.0.1; charset=utf-8; escaping=values",
        ),
        (
            "OM format, 1.0.0 version with utf8 is not valid, falls back",
            "application/openmetrics-text;version=1.0.0;validation-scheme=utf8;",
            "application/openmetrics-text; version=1.0.0; charset=utf-8; escaping=values",
        ),
        (
            "OM format, invalid version",
            "application/openmetrics-text;version=0.0.4",
            "text/plain; version=0.0.4; charset=utf-8; escaping=values",
        ),
    ];

    let negotiator = negotiator(EscapingScheme::Values);
    for (name, accept, expected) in cases {
        assert_eq!(
            negotiator.negotiate_including_open_metrics(accept).as_str(),
            expected,
            "{name}"
        );
    }
}

#[test]
fn test_fallbacks() {
    let negotiator = negotiator(EscapingScheme::Underscores);
    let fallback = "text/plain; version=0.0.4; charset=utf-8; escaping=underscores";

    assert_eq!(negotiator.negotiate("").as_str(), fallback);
    assert_eq!(negotiator.negotiate("*/*").as_str(), fallback);
    assert_eq!(negotiator.negotiate("application/json").as_str(), fallback);
    // Protobuf needs a known encoding and the right message type
    assert_eq!(negotiator.negotiate(PROTO_ACCEPT).as_str(), fallback);
    assert_eq!(
        negotiator
            .negotiate("application/vnd.google.protobuf;proto=foo.Bar;encoding=delimited")
            .as_str(),
        fallback
    );
    // Unknown text versions are served as 0.0.4
    assert_eq!(negotiator.negotiate("text/plain;version=9.9.9").as_str(), fallback);
    assert_eq!(negotiator.negotiate("text/plain").as_str(), fallback);
}

#[test]
fn test_offer_precedence() {
    let negotiator = negotiator(EscapingScheme::Underscores);

    let accept = format!("text/plain;version=0.0.4;q=0.5,{PROTO_ACCEPT};encoding=delimited;q=0.7");
    assert_eq!(negotiator.negotiate(&accept), Format::PROTO_DELIM.with_escaping_scheme(EscapingScheme::Underscores));

    // Unsupported offers are skipped, not fatal
    let accept = "application/openmetrics-text;version=9.0.0,text/plain;version=1.0.0;q=0.2";
    assert_eq!(
        negotiator.negotiate_including_open_metrics(accept).as_str(),
        "text/plain; version=1.0.0; charset=utf-8; escaping=underscores"
    );

    // Not acceptable at all
    let accept = "text/plain;version=1.0.0;q=0,application/json";
    assert_eq!(
        negotiator.negotiate(accept).as_str(),
        "text/plain; version=0.0.4; charset=utf-8; escaping=underscores"
    );
}

#[test]
fn test_escaping_parameter() {
    let negotiator = negotiator(EscapingScheme::Underscores);

    assert_eq!(
        negotiator.negotiate("text/plain;version=0.0.4;escaping=values").as_str(),
        "text/plain; version=0.0.4; charset=utf-8; escaping=values"
    );
    assert_eq!(
        negotiator.negotiate("text/plain;version=0.0.4;escaping=none").as_str(),
        "text/plain; version=0.0.4; charset=utf-8; escaping=none"
    );
    // UTF-8 wins over an explicit escaping when the format allows it
    assert_eq!(
        negotiator
            .negotiate("text/plain;version=1.0.0;escaping=dots;validation-scheme=utf8")
            .as_str(),
        "text/plain; version=1.0.0; charset=utf-8; validchars=utf8"
    );
    // ... and the escaping parameter is used when it does not
    assert_eq!(
        negotiator
            .negotiate("text/plain;version=0.0.4;escaping=dots;validation-scheme=utf8")
            .as_str(),
        "text/plain; version=0.0.4; charset=utf-8; escaping=dots"
    );
    // Unknown values are ignored
    assert_eq!(
        negotiator.negotiate("text/plain;version=0.0.4;escaping=allow-utf-8").as_str(),
        "text/plain; version=0.0.4; charset=utf-8; escaping=underscores"
    );
    // Quoted values are accepted
    assert_eq!(
        negotiator.negotiate("text/plain;version=\"1.0.0\";escaping=\"dots\"").as_str(),
        "text/plain; version=1.0.0; charset=utf-8; escaping=dots"
    );
}

#[test]
fn test_format_to_escaping_scheme() {
    let negotiator = negotiator(EscapingScheme::Dots);

    let cases = [
        (Format::TEXT_0_0_4.with_utf8_names(), EscapingScheme::NoEscaping),
        (
            Format::TEXT_0_0_4.with_escaping_scheme(EscapingScheme::NoEscaping),
            EscapingScheme::NoEscaping,
        ),
        (
            Format::PROTO_DELIM.with_escaping_scheme(EscapingScheme::Underscores),
            EscapingScheme::Underscores,
        ),
        (
            Format::OPEN_METRICS_1_0_0.with_escaping_scheme(EscapingScheme::Values),
            EscapingScheme::Values,
        ),
        // No annotation at all
        (Format::TEXT_0_0_4, EscapingScheme::Dots),
        (Format::from("escaping=values"), EscapingScheme::Values),
    ];

    for (format, expected) in cases {
        assert_eq!(negotiator.format_to_escaping_scheme(&format), expected, "{format}");
    }

    // The process-wide default applies to the free function
    assert_eq!(format_to_escaping_scheme(&Format::TEXT_0_0_4), EscapingScheme::Underscores);
}

#[test]
fn test_try_escaping_scheme_reports_unknown_tokens() {
    let format = Format::from("text/plain; version=0.0.4; charset=utf-8; escaping=bogus");
    let err = format.try_escaping_scheme(&NameConfig::new()).unwrap_err();
    assert_eq!(err.token(), "bogus");
}

#[test]
#[should_panic(expected = "unknown escaping scheme")]
fn test_format_to_escaping_scheme_panics_on_unknown_token() {
    let format = Format::from("text/plain; version=0.0.4; charset=utf-8; escaping=bogus");
    let _ = negotiator(EscapingScheme::Underscores).format_to_escaping_scheme(&format);
}

#[test]
fn test_escaping_scheme_to_format() {
    assert_eq!(escaping_scheme_to_format(EscapingScheme::NoEscaping), "none");
    assert_eq!(escaping_scheme_to_format(EscapingScheme::Underscores), "underscores");
    assert_eq!(escaping_scheme_to_format(EscapingScheme::Dots), "dots");
    assert_eq!(escaping_scheme_to_format(EscapingScheme::Values), "values");
}

#[test]
fn test_content_type() {
    let cases = [
        (Format::UNKNOWN, FormatType::Unknown),
        (Format::TEXT_0_0_4, FormatType::TextPlain),
        (Format::TEXT_1_0_0, FormatType::TextPlain),
        (Format::PROTO_DELIM, FormatType::ProtoDelim),
        (Format::PROTO_TEXT, FormatType::ProtoText),
        (Format::PROTO_COMPACT, FormatType::ProtoCompact),
        (Format::OPEN_METRICS_0_0_1, FormatType::OpenMetrics),
        (Format::OPEN_METRICS_2_0_0, FormatType::OpenMetrics),
        (
            Format::OPEN_METRICS_2_0_0.with_utf8_names(),
            FormatType::OpenMetrics,
        ),
        (
            Format::PROTO_DELIM.with_escaping_scheme(EscapingScheme::Dots),
            FormatType::ProtoDelim,
        ),
        (Format::from("text/plain"), FormatType::Unknown),
        (Format::from("text/plain; charset=latin1"), FormatType::Unknown),
        (
            Format::from("application/vnd.google.protobuf; proto=foo.Bar; encoding=delimited"),
            FormatType::Unknown,
        ),
        (
            Format::from("application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily"),
            FormatType::Unknown,
        ),
        (Format::from("application/json; charset=utf-8"), FormatType::Unknown),
    ];

    for (format, expected) in cases {
        assert_eq!(format.content_type(), expected, "{format}");
    }
}
