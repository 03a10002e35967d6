//! Env-resolved runtime settings, defaults first.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::channel::PathPair;
use crate::feeds::Feed;

/// What happens to a partially filled ledger when the budget screen is
/// re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Discard the partial ledger and start over (default).
    Reset,
    /// Keep the accepted total and categories and continue filling.
    Resume,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the worker subdirectories live under.
    pub worker_root: PathBuf,
    /// Poll interval for single-quote responses (stock, crypto).
    pub quote_poll: Duration,
    /// Poll interval for summary and budget responses.
    pub summary_poll: Duration,
    /// Where the session JSONL log lands.
    pub session_log_dir: PathBuf,
    pub reset_policy: ResetPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            worker_root: resolve_worker_root(),
            quote_poll: resolve_interval_ms("FINTERM_TUI_QUOTE_POLL_MS", 500),
            summary_poll: resolve_interval_ms("FINTERM_TUI_SUMMARY_POLL_MS", 1000),
            session_log_dir: resolve_session_log_dir(),
            reset_policy: resolve_reset_policy(),
        }
    }

    /// Request/response file pair for a feed. The file names are the worker
    /// contract and are not configurable; only the root moves.
    pub fn path_pair(&self, feed: Feed) -> PathPair {
        let (dir, input, output) = match feed {
            Feed::Budget => ("microservice-a", "input.json", "output.json"),
            Feed::Summary => ("microservice-b", "input_summary.json", "output_summary.json"),
            Feed::Stock => ("microservice-c", "input_stock.json", "output_stock.json"),
            Feed::Crypto => ("microservice-d", "input_crypto.json", "output_crypto.json"),
        };
        let base = self.worker_root.join(dir);
        PathPair::new(base.join(input), base.join(output))
    }

    pub fn poll_interval(&self, feed: Feed) -> Duration {
        match feed {
            Feed::Stock | Feed::Crypto => self.quote_poll,
            Feed::Summary | Feed::Budget => self.summary_poll,
        }
    }
}

fn resolve_worker_root() -> PathBuf {
    if let Ok(value) = std::env::var("FINTERM_TUI_WORKER_ROOT") {
        if !value.trim().is_empty() {
            return PathBuf::from(value.trim());
        }
    }
    PathBuf::from("workers")
}

fn resolve_interval_ms(key: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn resolve_session_log_dir() -> PathBuf {
    if let Ok(value) = std::env::var("FINTERM_TUI_SESSION_LOG_DIR") {
        if !value.trim().is_empty() {
            return PathBuf::from(value.trim());
        }
    }
    Path::new(".cache").join("finterm").join("session-logs")
}

fn resolve_reset_policy() -> ResetPolicy {
    let resume = std::env::var("FINTERM_TUI_BUDGET_RESUME")
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if resume {
        ResetPolicy::Resume
    } else {
        ResetPolicy::Reset
    }
}

pub fn resolve_run_id() -> String {
    if let Ok(value) = std::env::var("FINTERM_TUI_RUN_ID") {
        if !value.trim().is_empty() {
            return value.trim().to_string();
        }
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis())
        .unwrap_or(0);
    format!("run-{now}-{}", std::process::id())
}
