use ondemand_agent::AppError;

#[test]
fn display_prefixes_name_the_domain() {
    assert_eq!(
        AppError::Config("bad port".into()).to_string(),
        "config: bad port"
    );
    assert_eq!(
        AppError::NotInitialized("export pipeline is required".into()).to_string(),
        "not initialized: export pipeline is required"
    );
    assert_eq!(
        AppError::Trigger("bind refused".into()).to_string(),
        "trigger: bind refused"
    );
    assert_eq!(
        AppError::Export("spool full".into()).to_string(),
        "export: spool full"
    );
    assert_eq!(AppError::Io("broken pipe".into()).to_string(), "io: broken pipe");
}

#[test]
fn toml_errors_convert_to_config() {
    let toml_err = toml::from_str::<toml::Value>("= nonsense").unwrap_err();
    let err: AppError = toml_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn io_errors_convert_to_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AppError = io_err.into();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Config("x".into()));
}
