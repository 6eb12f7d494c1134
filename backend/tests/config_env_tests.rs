mod support;

use dealership::config::AppConfig;

use support::with_scoped_env;

#[test]
fn test_env_overrides_listener_and_upstreams() {
    let config = with_scoped_env(
        &[
            ("HOST", Some("127.0.0.1")),
            ("PORT", Some("9090")),
            ("DEALER_BACKEND_URL", Some("http://dealers:3030")),
            ("SENTIMENT_ANALYZER_URL", None),
            ("UPSTREAM_TIMEOUT_SEC", Some("2")),
        ],
        || {
            let mut config = AppConfig::default();
            config.apply_env().map(|_| config)
        },
    )
    .unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1:9090");
    assert_eq!(config.upstream.dealer_backend_url, "http://dealers:3030");
    assert_eq!(config.upstream.sentiment_analyzer_url, "http://localhost:5050/");
    assert_eq!(config.upstream.timeout_sec, 2);
}

#[test]
fn test_invalid_port_is_rejected() {
    let result = with_scoped_env(&[("PORT", Some("eighty"))], || {
        AppConfig::default().apply_env()
    });
    let err = result.unwrap_err();
    assert!(err.to_string().contains("eighty"));
}

#[test]
fn test_invalid_timeout_is_rejected() {
    let result = with_scoped_env(
        &[("PORT", None), ("UPSTREAM_TIMEOUT_SEC", Some("soon"))],
        || AppConfig::default().apply_env(),
    );
    assert!(result.is_err());
}

#[test]
fn test_session_ttl_from_env() {
    let config = with_scoped_env(&[("PORT", None), ("SESSION_TTL_SEC", Some("900"))], || {
        let mut config = AppConfig::default();
        config.apply_env().map(|_| config)
    })
    .unwrap();
    assert_eq!(config.session.ttl_sec, 900);

    for bad in ["0", "a fortnight"] {
        let result = with_scoped_env(&[("PORT", None), ("SESSION_TTL_SEC", Some(bad))], || {
            AppConfig::default().apply_env()
        });
        assert!(result.is_err(), "{}", bad);
    }
}
