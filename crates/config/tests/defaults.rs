use execunit_config::ChannelConfig;

#[test]
fn defaults_match_documented_timeouts() {
    let cfg = ChannelConfig::default();
    assert_eq!(cfg.pump_join_timeout().as_secs(), 2);
    assert!(cfg.connect_timeout().as_millis() > 0);
}

#[test]
fn load_missing_file_falls_back_to_defaults() {
    let cfg = ChannelConfig::load("/nonexistent/path/does-not-exist").unwrap();
    assert_eq!(cfg, ChannelConfig::default());
}
