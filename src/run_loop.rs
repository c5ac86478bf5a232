use rand::Rng;
use reqwest::blocking::Client;
use std::process::ExitCode;

use crate::client::{build_http_client, DuokanClient};
use crate::config::{Config, SecondsRange};
use crate::credentials::Credentials;
use crate::logger::{sanitize_log_value, Logger};
use crate::notifier::Notifier;
use crate::pacing::{Pacer, Sleeper};
use crate::task_types::{classify, parse_task_list, CheckInOutcome, Task, TaskRule, TASK_RULES};

pub(crate) const RUN_START_BANNER: &str = "----------多看阅读自动任务开始----------";
pub(crate) const SUMMARY_MARKER: &str = "----------今日汇总----------";
pub(crate) const RUN_END_MARKER: &str = "----------任务结束----------";

pub(crate) const TITLE_SUCCESS: &str = "✅ 多看任务成功";
pub(crate) const TITLE_FAILURE: &str = "❌ 多看任务失败";
pub(crate) const TITLE_MISSING_COOKIE: &str = "多看任务失败";
pub(crate) const BODY_MISSING_COOKIE: &str = "未获取到Cookie，任务终止";

#[derive(Debug)]
pub(crate) struct Quit {
    pub(crate) code: i32,
    #[allow(dead_code)]
    pub(crate) reason: String,
}

impl Quit {
    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code as u8)
    }
}

pub(crate) fn quit(logger: &Logger, reason: &str, code: i32) -> Quit {
    let sanitized = if reason.trim().is_empty() {
        "unknown".to_string()
    } else {
        sanitize_log_value(reason)
    };
    logger.log(&format!("quit reason={}", sanitized));
    Quit {
        code,
        reason: reason.to_string(),
    }
}

/// Everything one run accumulates: status lines for the summary and the coin tally.
#[derive(Debug)]
pub(crate) struct RunLog {
    lines: Vec<String>,
    coin_total: u64,
    executed: usize,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLog {
    pub(crate) fn new() -> Self {
        Self {
            lines: vec![RUN_START_BANNER.to_string()],
            coin_total: 0,
            executed: 0,
        }
    }

    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(crate) fn add_coins(&mut self, coins: u64) {
        self.coin_total = self.coin_total.saturating_add(coins);
    }

    #[cfg(test)]
    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn coin_total(&self) -> u64 {
        self.coin_total
    }

    pub(crate) fn executed(&self) -> usize {
        self.executed
    }

    pub(crate) fn summary(&self) -> String {
        let mut summary = self.lines.join("\n");
        summary.push('\n');
        summary.push_str(SUMMARY_MARKER);
        summary.push_str(&format!("\n📊 累计获得: {} 书豆", self.coin_total));
        summary.push('\n');
        summary.push_str(RUN_END_MARKER);
        summary
    }
}

pub(crate) fn check_in(client: &DuokanClient, run: &mut RunLog, logger: &Logger) -> CheckInOutcome {
    logger.log("开始执行签到...");
    let outcome = match client.check_in() {
        Ok(body) => CheckInOutcome::from_response(&body),
        Err(err) => CheckInOutcome::Failed(err),
    };
    run.add_coins(outcome.reward());
    match &outcome {
        CheckInOutcome::Checked { coins, streak_days } => run.push(format!(
            "✅ 签到成功！获得 {} 书豆，连续签到 {} 天",
            coins, streak_days
        )),
        CheckInOutcome::AlreadyChecked => run.push("✅ 今日已签到，无需重复签到"),
        CheckInOutcome::Rejected(msg) => run.push(format!("❌ 签到失败: {}", msg)),
        CheckInOutcome::Failed(err) => run.push(format!("❌ 签到异常: {}", err)),
    }
    outcome
}

/// Never fails: every error path is recorded and yields an empty list.
pub(crate) fn get_tasks(client: &DuokanClient, run: &mut RunLog, logger: &Logger) -> Vec<Task> {
    logger.log("获取任务列表...");
    let body = match client.query_tasks() {
        Ok(body) => body,
        Err(err) => {
            run.push(format!("❌ 获取任务列表异常: {}", err));
            return Vec::new();
        }
    };
    match parse_task_list(&body) {
        Ok(tasks) => {
            run.push(format!("✅ 获取任务列表成功，共 {} 个任务", tasks.len()));
            tasks
        }
        Err(msg) => {
            run.push(format!("❌ 获取任务列表失败: {}", msg));
            Vec::new()
        }
    }
}

/// Simulates the tasks locally. No completion API is called: a recognised task
/// with a reward "takes" a random duration for its category and its coins are
/// credited to the run afterwards.
pub(crate) fn complete_tasks<S: Sleeper, R: Rng>(
    tasks: &[Task],
    rules: &[TaskRule],
    pacing: SecondsRange,
    pacer: &mut Pacer<S, R>,
    run: &mut RunLog,
    logger: &Logger,
) {
    if tasks.is_empty() {
        run.push("⚠️ 无任务可执行");
        return;
    }
    logger.log(&format!("开始执行 {} 个任务...", tasks.len()));

    for (index, task) in tasks.iter().enumerate() {
        if pacer.interrupted() {
            run.push(format!(
                "⚠️ 任务被中断，剩余 {} 个任务未执行",
                tasks.len() - index
            ));
            break;
        }
        run.push(format!("正在执行: {}", task.title));
        match classify(rules, &task.title) {
            None => run.push(format!("⚠️ 暂不支持: {}", task.title)),
            Some(_) if task.coins == 0 => {
                run.push(format!("⏭️ 无书豆奖励，跳过: {}", task.title))
            }
            Some(rule) => simulate_task(task, rule, pacer, run, logger),
        }
        // Uniform gap between tasks regardless of outcome.
        if pacer.pause(pacing).is_none() {
            let remaining = tasks.len() - index - 1;
            if remaining > 0 {
                run.push(format!("⚠️ 任务被中断，剩余 {} 个任务未执行", remaining));
            }
            break;
        }
    }

    run.push(format!(
        "✅ 完成 {} 个任务，累计获得 {} 书豆",
        run.executed(),
        run.coin_total()
    ));
}

fn simulate_task<S: Sleeper, R: Rng>(
    task: &Task,
    rule: &TaskRule,
    pacer: &mut Pacer<S, R>,
    run: &mut RunLog,
    logger: &Logger,
) {
    let ad = task
        .ad_id
        .as_deref()
        .map(|id| format!(" ad_id={}", id))
        .unwrap_or_default();
    logger.log(&format!(
        "模拟{}任务: {}{}",
        rule.category, task.title, ad
    ));
    let Some(elapsed) = pacer.pause(rule.simulated_secs) else {
        run.push(format!("⚠️ {} 模拟被中断，未计入书豆", task.title));
        return;
    };
    run.add_coins(task.coins);
    run.executed += 1;
    run.push(format!(
        "✅ {}任务完成（模拟）！获得 {} 书豆（耗时{}秒）",
        rule.category,
        task.coins,
        elapsed.as_secs()
    ));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunStatus {
    MissingCookie,
    SetupFailed,
    Completed { checked_in: bool },
}

#[derive(Debug)]
pub(crate) struct RunReport {
    pub(crate) status: RunStatus,
    #[allow(dead_code)]
    pub(crate) summary: Option<String>,
    pub(crate) coin_total: u64,
    #[allow(dead_code)]
    pub(crate) notification: String,
}

/// Runs the whole daily routine and always attempts exactly one notification.
pub(crate) fn run_daily<S: Sleeper, R: Rng>(
    config: &Config,
    credentials: &Credentials,
    logger: &Logger,
    pacer: &mut Pacer<S, R>,
) -> RunReport {
    run_daily_with(build_http_client(config), config, credentials, logger, pacer)
}

pub(crate) fn run_daily_with<S: Sleeper, R: Rng>(
    http: Result<Client, String>,
    config: &Config,
    credentials: &Credentials,
    logger: &Logger,
    pacer: &mut Pacer<S, R>,
) -> RunReport {
    let http = match http {
        Ok(http) => http,
        Err(err) => return setup_failed(config, credentials, logger, &err),
    };
    let notifier = Notifier::new(http.clone(), &config.notify_url, credentials.notify_key.clone());

    let proceed = credentials.report(logger);
    let cookie = match credentials.cookie.as_deref() {
        Some(cookie) if proceed => cookie,
        _ => return missing_cookie(&notifier, logger, BODY_MISSING_COOKIE),
    };
    let client = match DuokanClient::new(http, config, cookie) {
        Ok(client) => client,
        Err(err) => {
            logger.log(&format!("❌ {}", err));
            return missing_cookie(&notifier, logger, &err);
        }
    };

    let mut run = RunLog::new();
    let outcome = check_in(&client, &mut run, logger);
    let tasks = get_tasks(&client, &mut run, logger);
    complete_tasks(&tasks, TASK_RULES, config.pacing_secs, pacer, &mut run, logger);

    let summary = run.summary();
    println!("{}", summary);

    let checked_in = outcome.is_success();
    let title = if checked_in {
        TITLE_SUCCESS
    } else {
        TITLE_FAILURE
    };
    let notification = notifier.send(title, &summary, logger);

    RunReport {
        status: RunStatus::Completed { checked_in },
        coin_total: run.coin_total(),
        summary: Some(summary),
        notification,
    }
}

/// The configured client could not be built; notify through a plain client instead.
fn setup_failed(
    config: &Config,
    credentials: &Credentials,
    logger: &Logger,
    err: &str,
) -> RunReport {
    logger.log(&format!("❌ {}", err));
    let notification = match Client::builder().build() {
        Ok(fallback) => Notifier::new(fallback, &config.notify_url, credentials.notify_key.clone())
            .send(TITLE_MISSING_COOKIE, err, logger),
        Err(fallback_err) => logger.log(&format!("通知发送异常：{}", fallback_err)),
    };
    RunReport {
        status: RunStatus::SetupFailed,
        summary: None,
        coin_total: 0,
        notification,
    }
}

fn missing_cookie(notifier: &Notifier, logger: &Logger, body: &str) -> RunReport {
    let notification = notifier.send(TITLE_MISSING_COOKIE, body, logger);
    RunReport {
        status: RunStatus::MissingCookie,
        summary: None,
        coin_total: 0,
        notification,
    }
}
