use super::*;

// =============================================================================
// parse_bool / env_bool — env tests use unique keys to avoid parallel races.
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", "On", "  yes  "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "False", " OFF "] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_rejects_garbage() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

#[test]
fn env_bool_reads_process_env() {
    let key = "__SENTRA_TEST_EB_4411__";
    unsafe { std::env::set_var(key, "yes") };
    assert_eq!(env_bool(key), Some(true));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_bool_unset_returns_none() {
    assert_eq!(env_bool("__SENTRA_TEST_EB_SURELY_UNSET_0__"), None);
}

#[test]
fn env_parse_uses_default_when_unset() {
    let value: u16 = env_parse("__SENTRA_TEST_EP_UNSET_1__", 4242).unwrap();
    assert_eq!(value, 4242);
}

#[test]
fn env_parse_reports_invalid_value() {
    let key = "__SENTRA_TEST_EP_BAD_2__";
    unsafe { std::env::set_var(key, "not-a-number") };
    let err = env_parse::<u32>(key, 1).unwrap_err();
    unsafe { std::env::remove_var(key) };
    assert!(matches!(err, ConfigError::Invalid { value, .. } if value == "not-a-number"));
}

#[test]
fn for_database_keeps_features_off() {
    let config = AppConfig::for_database("postgres://localhost/sentra");
    assert_eq!(config.database_url, "postgres://localhost/sentra");
    assert!(!config.allow_signup);
    assert!(!config.demo_login_enabled);
    assert!(config.static_dir.is_none());
    assert_eq!(config.session_ttl_hours, 720);
}

#[test]
fn session_ttl_accepts_default_and_int_max() {
    assert_eq!(checked_session_ttl(DEFAULT_SESSION_TTL_HOURS).unwrap(), DEFAULT_SESSION_TTL_HOURS);
    assert_eq!(checked_session_ttl(i64::from(i32::MAX)).unwrap(), i64::from(i32::MAX));
}

#[test]
fn session_ttl_rejects_non_positive_and_oversized() {
    for hours in [0, -1, i64::from(i32::MAX) + 1, i64::MAX] {
        let err = checked_session_ttl(hours).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { key: "SESSION_TTL_HOURS", value } if value == hours.to_string()),
            "{hours}"
        );
    }
}
