use reqwest::header::HeaderValue;
use reqwest::Url;
use std::path::Path;

use crate::client::{build_http_client, CHECK_IN_PATH, TASK_QUERY_PATH};
use crate::config::{validate_config, Config};
use crate::credentials::{mask_secret, Credentials, COOKIE_ENV, NOTIFY_KEY_ENV};
use crate::logger::Logger;
use crate::run_loop::{quit, Quit};
use crate::task_types::TASK_RULES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Check {
    Ok(String),
    Warn(String),
    Fail(String),
}

impl Check {
    fn render(&self) -> String {
        match self {
            Self::Ok(message) => format!("ok   {}", message),
            Self::Warn(message) => format!("warn {}", message),
            Self::Fail(message) => format!("FAIL {}", message),
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

fn check_url(label: &str, raw: &str) -> Check {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Check::Ok(format!("{} = {}", label, raw))
        }
        Ok(url) => Check::Fail(format!("{} uses unsupported scheme {}", label, url.scheme())),
        Err(err) => Check::Fail(format!("{} is not a valid URL: {}", label, err)),
    }
}

/// Offline checks only; nothing here talks to the platform or the relay.
pub(crate) fn doctor_checks(
    config: &Config,
    config_path: Option<&Path>,
    credentials: &Credentials,
) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(match config_path {
        Some(path) => Check::Ok(format!("config loaded from {}", path.display())),
        None => Check::Ok("no config file, using defaults".to_string()),
    });
    checks.push(match validate_config(config) {
        Ok(()) => Check::Ok("config values are valid".to_string()),
        Err(err) => Check::Fail(err),
    });

    let base = config.base_url.trim_end_matches('/');
    checks.push(check_url("base_url", &config.base_url));
    checks.push(Check::Ok(format!("check-in endpoint {}{}", base, CHECK_IN_PATH)));
    checks.push(Check::Ok(format!("task endpoint {}{}", base, TASK_QUERY_PATH)));
    checks.push(check_url("notify_url", &config.notify_url));

    checks.push(match credentials.cookie.as_deref() {
        None => Check::Fail(format!("{} is not set", COOKIE_ENV)),
        Some(cookie) => match HeaderValue::from_str(cookie) {
            Ok(_) => Check::Ok(format!("{} is set ({} bytes)", COOKIE_ENV, cookie.len())),
            Err(err) => Check::Fail(format!("{} is not a valid header value: {}", COOKIE_ENV, err)),
        },
    });
    checks.push(match credentials.notify_key.as_deref() {
        None => Check::Warn(format!(
            "{} is not set, notifications will only be logged",
            NOTIFY_KEY_ENV
        )),
        Some(key) => Check::Ok(format!("{} = {}", NOTIFY_KEY_ENV, mask_secret(key))),
    });

    checks.push(match build_http_client(config) {
        Ok(_) => Check::Ok("HTTP client builds".to_string()),
        Err(err) => Check::Fail(err),
    });

    let pacing = config.pacing_secs;
    checks.push(Check::Ok(format!(
        "pacing between tasks {}-{}s",
        pacing.min, pacing.max
    )));
    for rule in TASK_RULES {
        checks.push(Check::Ok(format!(
            "simulated task {} ({}-{}s) matches \"{}\"",
            rule.category, rule.simulated_secs.min, rule.simulated_secs.max, rule.pattern
        )));
    }

    checks
}

pub(crate) fn run_doctor_mode(
    config: &Config,
    config_path: Option<&Path>,
    credentials: &Credentials,
    logger: &Logger,
) -> Result<(), Quit> {
    let checks = doctor_checks(config, config_path, credentials);
    for check in &checks {
        println!("{}", check.render());
    }
    let failures = checks.iter().filter(|check| check.is_failure()).count();
    if failures > 0 {
        eprintln!("doctor found {} problem(s)", failures);
        return Err(quit(logger, &format!("doctor_failed:{}", failures), 1));
    }
    println!("doctor: all checks passed");
    Ok(())
}
