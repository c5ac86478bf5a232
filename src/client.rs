use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::signing::RequestParams;

pub(crate) const CHECK_IN_PATH: &str = "/api/dk-user/checkin/record";
pub(crate) const TASK_QUERY_PATH: &str = "/hs/v4/channel/query/1250";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub(crate) fn build_http_client(config: &Config) -> Result<Client, String> {
    let mut builder = Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|err| format!("failed to build HTTP client: {}", err))
}

/// Authenticated session against the reading platform. Headers are fixed at
/// construction and sent with every request.
#[derive(Debug)]
pub(crate) struct DuokanClient {
    http: Client,
    base_url: String,
    headers: HeaderMap,
}

impl DuokanClient {
    pub(crate) fn new(http: Client, config: &Config, cookie: &str) -> Result<Self, String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(cookie)
                .map_err(|err| format!("DUOKAN_COOKIE is not a valid header value: {}", err))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|err| format!("user_agent is not a valid header value: {}", err))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub(crate) fn check_in(&self) -> Result<Value, String> {
        self.post_signed(CHECK_IN_PATH)
    }

    pub(crate) fn query_tasks(&self) -> Result<Value, String> {
        self.post_signed(TASK_QUERY_PATH)
    }

    fn post_signed(&self, path: &str) -> Result<Value, String> {
        let url = format!("{}{}", self.base_url, path);
        let body = RequestParams::now().to_form_body();
        let response = self
            .http
            .post(&url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .map_err(|err| format!("request to {} failed: {}", path, err))?;
        response
            .json::<Value>()
            .map_err(|err| format!("invalid JSON from {}: {}", path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(base_url: &str) -> Config {
        Config {
            base_url: base_url.to_string(),
            ..Config::default()
        }
    }

    fn client_for(base_url: &str) -> DuokanClient {
        let config = config_for(base_url);
        let http = build_http_client(&config).expect("http client");
        DuokanClient::new(http, &config, "token=abc").expect("client")
    }

    #[test]
    fn check_in_sends_session_headers_and_signed_form() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", CHECK_IN_PATH)
            .match_header("cookie", "token=abc")
            .match_header("content-type", FORM_CONTENT_TYPE)
            .match_header("user-agent", Matcher::Regex("MiuiBrowser".to_string()))
            .match_body(Matcher::Regex(r"^_t=\d+&_c=\d+$".to_string()))
            .with_status(200)
            .with_body(r#"{"result":0,"data":{"ifCheckin":true}}"#)
            .create();

        let body = client_for(&server.url()).check_in().expect("check-in response");
        assert_eq!(body["result"], 0);
        mock.assert();
    }

    #[test]
    fn query_tasks_hits_channel_endpoint() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", TASK_QUERY_PATH)
            .with_status(200)
            .with_body(r#"{"result":0,"items":[]}"#)
            .create();

        let body = client_for(&format!("{}/", server.url()))
            .query_tasks()
            .expect("task response");
        assert_eq!(body["items"], serde_json::json!([]));
        mock.assert();
    }

    #[test]
    fn non_json_body_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", CHECK_IN_PATH)
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create();

        let err = client_for(&server.url())
            .check_in()
            .expect_err("expected parse error");
        assert!(err.contains("invalid JSON"), "got: {err}");
    }

    #[test]
    fn unreachable_host_is_an_error() {
        let err = client_for("http://127.0.0.1:1")
            .check_in()
            .expect_err("expected transport error");
        assert!(err.contains("request to"), "got: {err}");
    }

    #[test]
    fn cookie_with_newline_is_rejected() {
        let config = Config::default();
        let http = build_http_client(&config).expect("http client");
        let err = DuokanClient::new(http, &config, "a\nb").expect_err("expected header error");
        assert!(err.contains("DUOKAN_COOKIE"), "got: {err}");
    }
}
