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
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(
        settings.uploads.max_request_bytes.get(),
        DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES
    );
    assert_eq!(settings.auth.session_ttl, Duration::from_secs(30 * 86_400));
    assert_eq!(settings.auth.password_reset_ttl, Duration::from_secs(3_600));
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.overlay_ttl, Duration::from_secs(600));
    assert_eq!(settings.cache.search_ttl, Duration::from_secs(86_400));
    assert!(settings.cron.secret.is_none());
    assert!(settings.integrations.twitch.is_none());
    assert!(settings.integrations.email.is_none());
    assert!(settings.database.url.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_rate_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.rate_limit.max_requests = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero must be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "rate_limit.max_requests",
            ..
        }
    ));
}

#[test]
fn half_configured_twitch_is_rejected() {
    let mut raw = RawSettings::default();
    raw.integrations.twitch_client_id = Some("id".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn base_urls_gain_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.integrations.jikan_base_url = Some("http://localhost:9000/v4".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.integrations.jikan_base_url.as_str(),
        "http://localhost:9000/v4/"
    );
}

#[test]
fn invalid_cron_expression_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cron.token_purge_schedule = Some("every hour".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cron.token_purge_schedule",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["creatorhub"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_one_shot_commands() {
    let args = CliArgs::parse_from([
        "creatorhub",
        "sync-youtube",
        "--database-url",
        "postgres://example",
    ]);
    match args.command.expect("sync command") {
        Command::SyncYoutube(sync) => assert_eq!(
            sync.database.database_url.as_deref(),
            Some("postgres://example")
        ),
        _ => panic!("wrong command parsed"),
    }

    let args = CliArgs::parse_from(["creatorhub", "purge-tokens"]);
    assert!(matches!(args.command, Some(Command::PurgeTokens(_))));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "creatorhub",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn trusted_proxies_parse_from_a_list() {
    let mut raw = RawSettings::default();
    raw.server.trusted_proxies = Some("10.0.0.1, ::1,".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.server.trusted_proxies,
        vec![
            "10.0.0.1".parse::<std::net::IpAddr>().expect("ip"),
            "::1".parse::<std::net::IpAddr>().expect("ip"),
        ]
    );

    let mut raw = RawSettings::default();
    raw.server.trusted_proxies = Some("proxy.internal".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "server.trusted_proxies",
            ..
        })
    ));
}
