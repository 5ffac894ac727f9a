use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(
        settings.server.graceful_shutdown,
        Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_SECS)
    );
    assert_eq!(
        settings.upstream.timeout,
        Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)
    );
    assert!(settings.upstream.retry_transient);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.ttl_hotels_seconds, DEFAULT_TTL_HOTELS_SECS);
    assert!(settings.admin.revalidate_token.is_none());
    assert!(settings.admin.webhook_secret.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn upstream_base_url_cli_override_applies() {
    let mut raw = RawSettings::default();
    raw.upstream.base_url = Some("https://stale.example.test".to_string());

    let overrides = ServeOverrides {
        upstream_base_url: Some("https://cms.example.test".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.upstream.base_url.as_deref(),
        Some("https://cms.example.test")
    );
}

#[test]
fn blank_upstream_values_collapse_to_none() {
    let mut raw = RawSettings::default();
    raw.upstream.base_url = Some("   ".to_string());
    raw.upstream.token = Some("".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(settings.upstream.base_url.is_none());
    assert!(settings.upstream.token.is_none());
}

#[test]
fn blank_admin_secrets_collapse_to_none() {
    let mut raw = RawSettings::default();
    raw.admin.revalidate_token = Some("  ".to_string());
    raw.admin.webhook_secret = Some("hook-secret".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(settings.admin.revalidate_token.is_none());
    assert_eq!(settings.admin.webhook_secret.as_deref(), Some("hook-secret"));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let error = Settings::from_raw(raw).expect_err("invalid settings");
    assert!(matches!(
        error,
        LoadError::Invalid {
            key: "server.port",
            ..
        }
    ));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_rooms_seconds = Some(0);

    let error = Settings::from_raw(raw).expect_err("invalid settings");
    assert!(matches!(
        error,
        LoadError::Invalid {
            key: "cache.ttl_rooms_seconds",
            ..
        }
    ));
}

#[test]
fn zero_upstream_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.upstream.timeout_seconds = Some(0);

    let error = Settings::from_raw(raw).expect_err("invalid settings");
    assert!(matches!(
        error,
        LoadError::Invalid {
            key: "upstream.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn invalid_host_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not-an-ip".to_string());

    let error = Settings::from_raw(raw).expect_err("invalid settings");
    assert!(matches!(
        error,
        LoadError::Invalid {
            key: "server.addr",
            ..
        }
    ));
}
