use proptest::prelude::*;
use prometheus_expfmt::{
    EscapingScheme, NameConfig, Negotiator, escape_name, is_valid_legacy_metric_name,
};

fn escaping_scheme() -> impl Strategy<Value = EscapingScheme> {
    prop_oneof![
        Just(EscapingScheme::NoEscaping),
        Just(EscapingScheme::Underscores),
        Just(EscapingScheme::Dots),
        Just(EscapingScheme::Values),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn legal_names_are_left_alone(name in "[a-zA-Z_:][a-zA-Z0-9_:]{0,30}") {
        prop_assert!(is_valid_legacy_metric_name(&name));
        prop_assert_eq!(escape_name(&name, EscapingScheme::Underscores), name.as_str());
        prop_assert_eq!(escape_name(&name, EscapingScheme::Values), name.as_str());
    }

    #[test]
    fn escaped_names_are_legal(name in "\\PC{1,30}") {
        for scheme in [EscapingScheme::Underscores, EscapingScheme::Dots, EscapingScheme::Values] {
            let escaped = escape_name(&name, scheme);
            prop_assert!(is_valid_legacy_metric_name(&escaped), "{:?} -> {:?}", name, escaped);
        }
    }

    #[test]
    fn negotiated_scheme_round_trips(
        scheme in escaping_scheme(),
        default in escaping_scheme(),
        accept in prop_oneof![
            Just("text/plain;version=0.0.4"),
            Just("text/plain;version=1.0.0"),
            Just("application/openmetrics-text;version=1.0.0"),
            Just("application/openmetrics-text;version=2.0.0"),
            Just("application/vnd.google.protobuf;proto=io.prometheus.client.MetricFamily;encoding=delimited"),
        ],
    ) {
        let negotiator = Negotiator::new(NameConfig::new().with_default_escaping_scheme(default));

        let format = negotiator.negotiate_including_open_metrics(&format!("{accept};escaping={scheme}"));
        prop_assert_eq!(negotiator.format_to_escaping_scheme(&format), scheme);

        let format = negotiator.negotiate_including_open_metrics(accept);
        prop_assert_eq!(negotiator.format_to_escaping_scheme(&format), default);
    }

    #[test]
    fn negotiation_never_fails(accept in "\\PC{0,80}") {
        let negotiator = Negotiator::new(NameConfig::new());
        let format = negotiator.negotiate_including_open_metrics(&accept);
        // Whatever the header says, the result maps back to a scheme
        let _ = negotiator.format_to_escaping_scheme(&format);
        let format = negotiator.negotiate(&accept);
        let _ = negotiator.format_to_escaping_scheme(&format);
    }
}
