use serde_json::Value;
use std::fmt;

use crate::config::SecondsRange;

/// Message the check-in endpoint returns when today's reward was already claimed.
pub(crate) const ALREADY_CHECKED_IN_MSG: &str = "今日已签到";
pub(crate) const UNKNOWN_TASK_TITLE: &str = "未知任务";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TaskCategory {
    DownloadAd,
    AppTrial,
    FreeBookReading,
    VideoAd,
}

impl TaskCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::DownloadAd => "下载广告",
            Self::AppTrial => "体验APP",
            Self::FreeBookReading => "免费书阅读",
            Self::VideoAd => "视频广告",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TaskRule {
    pub(crate) pattern: &'static str,
    pub(crate) category: TaskCategory,
    pub(crate) simulated_secs: SecondsRange,
}

/// Evaluated in order; the first rule whose pattern occurs in the title wins.
pub(crate) const TASK_RULES: &[TaskRule] = &[
    TaskRule {
        pattern: "下载广告",
        category: TaskCategory::DownloadAd,
        simulated_secs: SecondsRange::new(5.0, 10.0),
    },
    TaskRule {
        pattern: "体验APP",
        category: TaskCategory::AppTrial,
        simulated_secs: SecondsRange::new(30.0, 60.0),
    },
    TaskRule {
        pattern: "免费书阅读",
        category: TaskCategory::FreeBookReading,
        simulated_secs: SecondsRange::new(600.0, 610.0),
    },
    TaskRule {
        pattern: "视频广告",
        category: TaskCategory::VideoAd,
        simulated_secs: SecondsRange::new(15.0, 30.0),
    },
];

pub(crate) fn classify<'a>(rules: &'a [TaskRule], title: &str) -> Option<&'a TaskRule> {
    rules.iter().find(|rule| title.contains(rule.pattern))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Task {
    pub(crate) title: String,
    pub(crate) coins: u64,
    pub(crate) ad_id: Option<String>,
}

impl Task {
    /// Reads a task leniently: missing or malformed fields fall back to defaults.
    pub(crate) fn from_value(value: &Value) -> Self {
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(UNKNOWN_TASK_TITLE)
            .to_string();
        let extend = value.pointer("/data/data/0/extend");
        let coins = extend
            .and_then(|extend| extend.get("coins"))
            .map(coins_from_value)
            .unwrap_or(0);
        let ad_id = extend
            .and_then(|extend| extend.get("ad_id").or_else(|| extend.get("adId")))
            .and_then(|value| match value {
                Value::String(id) if !id.is_empty() => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            });
        Self {
            title,
            coins,
            ad_id,
        }
    }
}

fn coins_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v > 0.0).map(|v| v as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CheckInOutcome {
    Checked { coins: u64, streak_days: u64 },
    AlreadyChecked,
    Rejected(String),
    Failed(String),
}

impl CheckInOutcome {
    pub(crate) fn from_response(body: &Value) -> Self {
        let result = body.get("result").and_then(Value::as_i64);
        let data = body.get("data");
        let checked_in = data
            .and_then(|data| data.get("ifCheckin"))
            .map(is_truthy)
            .unwrap_or(false);
        if result == Some(0) && checked_in {
            let coins = data
                .and_then(|data| data.pointer("/coinList/0"))
                .map(coins_from_value)
                .unwrap_or(0);
            let streak_days = data
                .and_then(|data| data.get("continuityDay"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            return Self::Checked { coins, streak_days };
        }
        let msg = body.get("msg").and_then(Value::as_str);
        if msg == Some(ALREADY_CHECKED_IN_MSG) {
            return Self::AlreadyChecked;
        }
        Self::Rejected(msg.unwrap_or("签到失败").to_string())
    }

    pub(crate) fn is_success(&self) -> bool {
        matches!(self, Self::Checked { .. } | Self::AlreadyChecked)
    }

    pub(crate) fn reward(&self) -> u64 {
        match self {
            Self::Checked { coins, .. } => *coins,
            _ => 0,
        }
    }
}

/// `Err` carries the server message when the query was not accepted.
pub(crate) fn parse_task_list(body: &Value) -> Result<Vec<Task>, String> {
    if body.get("result").and_then(Value::as_i64) != Some(0) {
        let msg = body
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("未知错误");
        return Err(msg.to_string());
    }
    let tasks = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Task::from_value).collect())
        .unwrap_or_default();
    Ok(tasks)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}
