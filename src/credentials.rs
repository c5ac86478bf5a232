use std::env;
use std::fmt;

use crate::logger::Logger;

pub(crate) const COOKIE_ENV: &str = "DUOKAN_COOKIE";
pub(crate) const NOTIFY_KEY_ENV: &str = "SERVERCHAN_KEY";

#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) cookie: Option<String>,
    pub(crate) notify_key: Option<String>,
}

// Both values are secrets; keep them out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cookie", &self.cookie.as_ref().map(|_| "<set>"))
            .field("notify_key", &self.notify_key.as_deref().map(mask_secret))
            .finish()
    }
}

impl Credentials {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Blank values count as unset.
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            cookie: read(COOKIE_ENV),
            notify_key: read(NOTIFY_KEY_ENV),
        }
    }

    /// Logs what is missing. Returns `false` when the run cannot proceed.
    pub(crate) fn report(&self, logger: &Logger) -> bool {
        if self.cookie.is_none() {
            logger.log(&format!("❌ 未设置{}环境变量", COOKIE_ENV));
            return false;
        }
        if self.notify_key.is_none() {
            logger.log(&format!("⚠️ 未设置{}，将无法推送微信通知", NOTIFY_KEY_ENV));
        }
        true
    }
}

pub(crate) fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 8 {
        return "****".to_string();
    }
    format!("{}****", visible)
}
