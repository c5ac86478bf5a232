use reqwest::blocking::Client;
use serde_json::Value;

use crate::logger::Logger;

/// Push relay keyed by a per-user secret (`<notify_url>/<key>.send`).
///
/// Every outcome, including a missing key, ends up as a log line; nothing here
/// is allowed to fail the run.
#[derive(Debug)]
pub(crate) struct Notifier {
    http: Client,
    base_url: String,
    key: Option<String>,
}

impl Notifier {
    pub(crate) fn new(http: Client, base_url: &str, key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
        }
    }

    pub(crate) fn send(&self, title: &str, content: &str, logger: &Logger) -> String {
        let Some(key) = self.key.as_deref() else {
            return logger.log("通知发送失败：未设置SERVERCHAN_KEY");
        };
        match self.post(key, title, content) {
            Ok(body) => {
                if body.get("code").and_then(Value::as_i64) == Some(0) {
                    logger.log(&format!("通知发送成功：{}", title))
                } else {
                    let message = body
                        .get("message")
                        .map(|value| match value {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| "null".to_string());
                    logger.log(&format!("通知发送失败：{}", message))
                }
            }
            Err(err) => logger.log(&format!("通知发送异常：{}", err)),
        }
    }

    fn post(&self, key: &str, title: &str, content: &str) -> Result<Value, String> {
        let url = format!("{}/{}.send", self.base_url, key);
        let response = self
            .http
            .post(&url)
            .form(&[("title", title), ("desp", content)])
            .send()
            .map_err(|err| format!("request failed: {}", err.without_url()))?;
        response
            .json::<Value>()
            .map_err(|err| format!("invalid JSON response: {}", err.without_url()))
    }
}
