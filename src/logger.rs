use chrono::{Local, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub(crate) struct Logger {
    path: Option<PathBuf>,
    quiet: bool,
    disabled: AtomicBool,
}

impl Logger {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            quiet: false,
            disabled: AtomicBool::new(false),
        }
    }

    /// Logger that only writes to the log file, used by tests to keep stdout clean.
    #[cfg(test)]
    pub(crate) fn quiet(path: Option<PathBuf>) -> Self {
        Self {
            path,
            quiet: true,
            disabled: AtomicBool::new(false),
        }
    }

    /// Echoes `message` to stdout with a local timestamp, appends it to the log file
    /// when one is configured, and hands the message back so callers can reuse it.
    pub(crate) fn log(&self, message: &str) -> String {
        if !self.quiet {
            let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
            println!("[{}] {}", ts, message);
        }
        self.append_to_file(message);
        message.to_string()
    }

    fn append_to_file(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if self.disabled.load(Ordering::Relaxed) {
            return;
        }
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let line = format!("{} {}\n", ts, sanitize_log_value(message));
        let mut file = match fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(err) => {
                self.disable_with_warning(path, &err);
                return;
            }
        };
        if let Err(err) = file.write_all(line.as_bytes()) {
            self.disable_with_warning(path, &err);
        }
    }

    fn disable_with_warning(&self, path: &Path, err: &std::io::Error) {
        // Keep the run going, but surface logging failures once and stop retrying.
        if self
            .disabled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(
                stderr,
                "Warning: file logging disabled log_path={} io_error={}",
                path.display(),
                err
            );
        }
    }
}

pub(crate) fn sanitize_log_value(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
