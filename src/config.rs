use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.duokan.com";
pub(crate) const DEFAULT_NOTIFY_URL: &str = "https://sctapi.ftqq.com";
pub(crate) const MAX_PACING_SECS: f64 = 86_400.0;
pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; 22101316C Build/UP1A.231005.007) XiaoMi/MiuiBrowser/2.1.1";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SecondsRange {
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl SecondsRange {
    pub(crate) const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) base_url: String,
    pub(crate) notify_url: String,
    pub(crate) user_agent: String,
    pub(crate) log_path: Option<PathBuf>,
    pub(crate) request_timeout_secs: Option<u64>,
    pub(crate) pacing_secs: SecondsRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_path: None,
            request_timeout_secs: None,
            pacing_secs: SecondsRange::new(3.0, 8.0),
        }
    }
}

#[derive(Debug)]
pub(crate) struct LoadedConfig {
    pub(crate) config: Config,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn load_config(path: &Path) -> Result<LoadedConfig, String> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config {}: {}", path.display(), err))?;
    let value: Value = serde_yaml::from_str(&content)
        .map_err(|err| format!("Failed to parse config {}: {}", path.display(), err))?;
    let mapping = match value {
        // An empty file is a valid "all defaults" config.
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(format!("Config {} must be a YAML mapping", path.display())),
    };

    let warnings = unknown_top_level_keys(&mapping);
    emit_unknown_key_warnings(&warnings);

    let config: Config = serde_path_to_error::deserialize(Value::Mapping(mapping))
        .map_err(|err| format!("Failed to parse config {}: {}", path.display(), err))?;
    validate_config(&config)
        .map_err(|err| format!("Invalid config {}: {}", path.display(), err))?;

    Ok(LoadedConfig { config, warnings })
}

pub(crate) fn validate_config(config: &Config) -> Result<(), String> {
    if config.base_url.trim().is_empty() {
        return Err("base_url must not be empty".to_string());
    }
    if config.notify_url.trim().is_empty() {
        return Err("notify_url must not be empty".to_string());
    }
    if config.user_agent.trim().is_empty() {
        return Err("user_agent must not be empty".to_string());
    }
    if config.request_timeout_secs == Some(0) {
        return Err("request_timeout_secs must be a positive integer (got 0)".to_string());
    }
    let pacing = config.pacing_secs;
    if !pacing.min.is_finite() || !pacing.max.is_finite() || pacing.min < 0.0 {
        return Err("pacing_secs bounds must be non-negative numbers".to_string());
    }
    if pacing.max > MAX_PACING_SECS {
        return Err(format!(
            "pacing_secs.max ({}) must not exceed {} seconds",
            pacing.max, MAX_PACING_SECS
        ));
    }
    if pacing.min > pacing.max {
        return Err(format!(
            "pacing_secs.min ({}) must not exceed pacing_secs.max ({})",
            pacing.min, pacing.max
        ));
    }
    Ok(())
}

fn emit_unknown_key_warnings(keys: &[String]) {
    for key in keys {
        eprintln!("Warning: unknown config key: {}", key);
    }
}

fn unknown_top_level_keys(mapping: &Mapping) -> Vec<String> {
    let allowed = [
        "base_url",
        "notify_url",
        "user_agent",
        "log_path",
        "request_timeout_secs",
        "pacing_secs",
    ];

    mapping
        .keys()
        .filter_map(|key| key.as_str().map(|value| value.to_string()))
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    fn write_temp_config(contents: &str) -> NamedTempFile {
        let file = NamedTempFile::new().expect("create temp file");
        fs::write(file.path(), contents).expect("write temp config");
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_temp_config("");
        let loaded = load_config(file.path()).expect("empty config should load");
        assert_eq!(loaded.config.base_url, DEFAULT_BASE_URL);
        assert_eq!(loaded.config.notify_url, DEFAULT_NOTIFY_URL);
        assert_eq!(loaded.config.pacing_secs, SecondsRange::new(3.0, 8.0));
        assert!(loaded.config.log_path.is_none());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn partial_config_overrides_only_given_keys() {
        let config = r#"
base_url: "http://127.0.0.1:9000"
log_path: "./duokan.log"
pacing_secs:
  min: 0
  max: 0.5
"#;
        let file = write_temp_config(config);
        let loaded = load_config(file.path()).expect("config should load");
        assert_eq!(loaded.config.base_url, "http://127.0.0.1:9000");
        assert_eq!(loaded.config.notify_url, DEFAULT_NOTIFY_URL);
        assert_eq!(loaded.config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(
            loaded.config.log_path.as_deref(),
            Some(Path::new("./duokan.log"))
        );
        assert_eq!(loaded.config.pacing_secs, SecondsRange::new(0.0, 0.5));
    }

    #[test]
    fn invalid_yaml_includes_path() {
        let file = write_temp_config("base_url: [");
        let err = load_config(file.path()).expect_err("expected parse error");
        let path = file.path().display().to_string();
        assert!(
            err.contains(&path),
            "error should include path {path}, got: {err}"
        );
    }

    #[test]
    fn type_error_names_the_nested_key() {
        let config = r#"
pacing_secs:
  min: "soon"
  max: 8
"#;
        let file = write_temp_config(config);
        let err = load_config(file.path()).expect_err("expected type error");
        assert!(
            err.contains("pacing_secs.min"),
            "error should name pacing_secs.min, got: {err}"
        );
    }

    #[test]
    fn inverted_pacing_range_is_rejected() {
        let config = r#"
pacing_secs:
  min: 9
  max: 2
"#;
        let file = write_temp_config(config);
        let err = load_config(file.path()).expect_err("expected validation error");
        assert!(err.contains("pacing_secs.min"), "got: {err}");
    }

    #[test]
    fn oversized_pacing_is_rejected() {
        let config = r#"
pacing_secs:
  min: 1.0e20
  max: 1.0e20
"#;
        let file = write_temp_config(config);
        let err = load_config(file.path()).expect_err("expected validation error");
        assert!(err.contains("pacing_secs.max"), "got: {err}");
        assert!(err.contains("86400"), "got: {err}");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let file = write_temp_config("base_url: \"  \"\n");
        let err = load_config(file.path()).expect_err("expected validation error");
        assert!(err.contains("base_url must not be empty"), "got: {err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let file = write_temp_config("request_timeout_secs: 0\n");
        let err = load_config(file.path()).expect_err("expected validation error");
        assert!(err.contains("request_timeout_secs"), "got: {err}");
    }

    #[test]
    fn non_mapping_is_rejected() {
        let file = write_temp_config("- a\n- b\n");
        let err = load_config(file.path()).expect_err("expected mapping error");
        assert!(err.contains("must be a YAML mapping"), "got: {err}");
    }

    #[test]
    fn unknown_keys_reported() {
        let config = r#"
base_url: "https://www.duokan.com"
cookie: "should-live-in-env"
"#;
        let file = write_temp_config(config);
        let loaded = load_config(file.path()).expect("config should load");
        assert_eq!(loaded.warnings, vec!["cookie".to_string()]);
    }
}
