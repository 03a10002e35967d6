//! Screen controller: parses commands, drives the file protocol, applies
//! watcher events to the model. Owns the ledger and the request slots; the
//! binary's loop owns nothing but the terminal.

use std::fs;
use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use crate::channel;
use crate::config::{Config, ResetPolicy};
use crate::decode::display_value;
use crate::error::{FeedError, LedgerError};
use crate::feeds::{self, Feed, FeedEvent, FeedPayload};
use crate::ledger::{self, AllocationLedger};
use crate::model::{AppModel, BudgetPrompt, Screen};
use crate::watcher::{self, RequestSlot};

pub struct Session {
    pub model: AppModel,
    config: Config,
    ledger: AllocationLedger,
    events_tx: Sender<FeedEvent>,
    events_rx: Receiver<FeedEvent>,
    stock_slot: RequestSlot,
    summary_slot: RequestSlot,
    crypto_slot: RequestSlot,
    budget_slot: RequestSlot,
    session_log: Option<fs::File>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let session_log = open_session_log(&config);
        Self {
            model: AppModel::new(),
            config,
            ledger: AllocationLedger::new(),
            events_tx,
            events_rx,
            stock_slot: RequestSlot::new(),
            summary_slot: RequestSlot::new(),
            crypto_slot: RequestSlot::new(),
            budget_slot: RequestSlot::new(),
            session_log,
        }
    }

    /// Applies everything the watcher threads delivered since last frame.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    /// Handles one submitted input line. Returns `true` when the user
    /// confirmed quitting.
    pub fn submit_line(&mut self) -> bool {
        let line = self.model.take_input();
        if line.is_empty() {
            return false;
        }
        if self.model.quit_pending {
            if line == "y" || line == "Y" {
                return true;
            }
            self.model.quit_pending = false;
            self.model.set_status("");
            return false;
        }
        match self.model.screen {
            Screen::Main => self.handle_main(&line),
            Screen::Summary => self.handle_nav_only(&line),
            Screen::Budget => self.handle_budget(&line),
            Screen::SearchStocks => self.handle_stocks(&line),
            Screen::SearchCrypto => self.handle_crypto(&line),
        }
        false
    }

    fn handle_main(&mut self, line: &str) {
        match line {
            "summary" => self.enter_summary(),
            "budget" => self.enter_budget(),
            "search-stocks" => {
                self.model.screen = Screen::SearchStocks;
                self.model.set_status("Enter stock ticker");
            }
            "search-crypto" => {
                self.model.screen = Screen::SearchCrypto;
                self.model.set_status("");
            }
            "quit" => self.prompt_quit(),
            _ => {}
        }
    }

    fn handle_nav_only(&mut self, line: &str) {
        match line {
            "main" => self.go_main(),
            "quit" => self.prompt_quit(),
            _ => {}
        }
    }

    fn handle_stocks(&mut self, line: &str) {
        let lower = line.to_lowercase();
        if lower.starts_with("search $") {
            let ticker = line[7..].trim_start_matches('$').trim().to_string();
            if ticker.is_empty() {
                self.model.set_status("Enter stock ticker");
                return;
            }
            self.model.stock = None;
            self.model.show_more = false;
            self.model.set_status("Waiting for stock data...");
            self.start_request(Feed::Stock, feeds::ticker_request(&ticker));
        } else if lower == "show-more" {
            self.model.show_more = true;
            if self.model.stock.is_some() {
                self.model.set_status("");
            } else {
                // Nothing held yet: watch whatever output the worker last
                // wrote.
                self.model.set_status("Waiting for stock data...");
                self.spawn_watch(Feed::Stock);
            }
        } else {
            self.handle_nav_only(line);
        }
    }

    fn handle_crypto(&mut self, line: &str) {
        if let Some(coin) = line.strip_prefix("search ") {
            let coin = coin.trim().to_string();
            if coin.is_empty() {
                return;
            }
            self.model.crypto.clear();
            self.model.set_status("Waiting for cryptocurrency data...");
            self.start_request(Feed::Crypto, feeds::coin_request(&coin));
        } else {
            self.handle_nav_only(line);
        }
    }

    fn enter_summary(&mut self) {
        self.model.screen = Screen::Summary;
        self.model.summary.clear();
        self.model.set_status("Waiting for data...");
        self.start_request(Feed::Summary, feeds::summary_request());
    }

    fn enter_budget(&mut self) {
        self.model.screen = Screen::Budget;
        self.model.budget_result.clear();
        match self.config.reset_policy {
            ResetPolicy::Reset => {
                self.ledger.reset();
                self.model.category_rows.clear();
                self.model.budget_prompt = BudgetPrompt::Total;
            }
            ResetPolicy::Resume => {
                self.model.category_rows = self.ledger.categories().to_vec();
                self.model.budget_prompt = if self.ledger.total().is_none() {
                    BudgetPrompt::Total
                } else {
                    BudgetPrompt::Category
                };
            }
        }
        // A computed output from an earlier visit must not be mistaken for
        // this session's result.
        channel::clear_response(&self.config.path_pair(Feed::Budget));
        self.model
            .set_status(format!("{}% remaining to allocate.", self.ledger.remaining()));
    }

    fn handle_budget(&mut self, line: &str) {
        match line {
            "main" => {
                self.go_main();
                return;
            }
            "quit" => {
                self.prompt_quit();
                return;
            }
            _ => {}
        }
        match self.model.budget_prompt.clone() {
            BudgetPrompt::Total => match parse_amount(line).and_then(|n| {
                self.ledger.set_total(n)?;
                Ok(())
            }) {
                Ok(()) => {
                    self.model.budget_prompt = BudgetPrompt::Category;
                    self.model.set_status("Success! 100% remaining to allocate.");
                }
                Err(err) => self.model.set_status(budget_message(&err)),
            },
            BudgetPrompt::Category => {
                if self.ledger.contains(line) {
                    self.model.set_status("Category already exists.");
                } else {
                    self.model.budget_prompt = BudgetPrompt::Percentage {
                        category: line.to_string(),
                    };
                    self.model.set_status("");
                }
            }
            BudgetPrompt::Percentage { category } => {
                let outcome = parse_amount(line)
                    .map_err(|_| LedgerError::OutOfRange {
                        pct: 0,
                        remaining: self.ledger.remaining(),
                    })
                    .and_then(|pct| self.ledger.add_category(&category, pct));
                match outcome {
                    Ok(remaining) => {
                        self.model.category_rows = self.ledger.categories().to_vec();
                        self.model.budget_prompt = BudgetPrompt::Category;
                        self.model
                            .set_status(format!("Success! Remaining: {remaining}%."));
                        if let Some(record) = self.ledger.take_completion() {
                            self.finish_budget(record);
                        }
                    }
                    Err(err) => self.model.set_status(budget_message(&err)),
                }
            }
        }
    }

    fn finish_budget(&mut self, record: ledger::BudgetRecord) {
        let pair = self.config.path_pair(Feed::Budget);
        match ledger::write_budget_input(&pair, &record) {
            Ok(()) => {
                self.model
                    .set_status("Budget saved. Waiting for worker output...");
                self.log_event("budget_written", json!({"total": record.total}));
                self.spawn_watch(Feed::Budget);
            }
            Err(err) => {
                self.model.set_status("Failed to write file.");
                self.model.push_log(format!("budget write failed: {err}"));
            }
        }
    }

    fn go_main(&mut self) {
        self.model.screen = Screen::Main;
        self.model.quit_pending = false;
        self.model.set_status("");
    }

    fn prompt_quit(&mut self) {
        self.model.quit_pending = true;
        self.model
            .set_status("Are you sure you want to quit? (y/n)");
    }

    /// Writes the request file and, only if that succeeded, spawns the
    /// watcher for the paired response.
    fn start_request(&mut self, feed: Feed, payload: Value) {
        let pair = self.config.path_pair(feed);
        if let Err(err) = channel::submit(&pair, &payload) {
            self.model.set_status("Failed to write input.");
            self.model
                .push_log(format!("{} request failed: {err}", feed.label()));
            return;
        }
        self.log_event("request", json!({"feed": feed.label()}));
        self.spawn_watch(feed);
    }

    fn spawn_watch(&mut self, feed: Feed) {
        let pair = self.config.path_pair(feed);
        let ticket = self.slot(feed).begin();
        watcher::spawn_watch(
            pair.response,
            self.config.poll_interval(feed),
            feed,
            ticket,
            decoder_for(feed),
            self.events_tx.clone(),
        );
    }

    fn slot(&self, feed: Feed) -> &RequestSlot {
        match feed {
            Feed::Stock => &self.stock_slot,
            Feed::Summary => &self.summary_slot,
            Feed::Crypto => &self.crypto_slot,
            Feed::Budget => &self.budget_slot,
        }
    }

    fn apply_event(&mut self, event: FeedEvent) {
        if event.generation != self.slot(event.feed).current() {
            self.model
                .push_log(format!("dropped stale {} response", event.feed.label()));
            return;
        }
        match event.result {
            Ok(payload) => {
                self.apply_payload(payload);
                self.log_event("response", json!({"feed": event.feed.label()}));
            }
            Err(err) => {
                let message = match err {
                    FeedError::Io(_) => format!("Failed to read {} data.", event.feed.label()),
                    FeedError::Decode(_) => format!("Invalid {} data.", event.feed.label()),
                };
                self.model.set_status(message);
                self.model
                    .push_log(format!("{} watcher failed: {err}", event.feed.label()));
                self.log_event(
                    "response_error",
                    json!({"feed": event.feed.label(), "error": err.to_string()}),
                );
            }
        }
    }

    fn apply_payload(&mut self, payload: FeedPayload) {
        match payload {
            FeedPayload::Stock(quote) => {
                self.model.stock = Some(quote);
                self.model.set_status("");
            }
            FeedPayload::Summary(entries) => {
                self.model.summary = entries;
                self.model.set_status("");
            }
            FeedPayload::Crypto(pairs) => {
                self.model.crypto = pairs
                    .into_iter()
                    .map(|(coin, price)| (coin, display_value(&price)))
                    .collect();
                self.model.set_status("");
            }
            FeedPayload::Budget(pairs) => {
                self.model.budget_result = budget_rows(pairs);
                self.model.set_status("Budget calculated.");
            }
        }
    }

    fn log_event(&mut self, event: &str, detail: Value) {
        if let Some(file) = self.session_log.as_mut() {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let line = json!({"ts": ts, "event": event, "detail": detail});
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

/// Category rows sorted lexicographically with the total pinned last, so the
/// computed-budget table renders the same way every time.
fn budget_rows(pairs: Vec<(String, Value)>) -> Vec<(String, String)> {
    let mut total = None;
    let mut rows: Vec<(String, String)> = Vec::new();
    for (key, value) in pairs {
        if key == "total" {
            total = Some(display_value(&value));
        } else {
            rows.push((key, display_value(&value)));
        }
    }
    rows.sort_by(|left, right| left.0.cmp(&right.0));
    if let Some(total) = total {
        rows.push(("Total".to_string(), total));
    }
    rows
}

fn parse_amount(line: &str) -> Result<i64, LedgerError> {
    line.trim()
        .parse::<i64>()
        .map_err(|_| LedgerError::InvalidInput("Please enter a positive number.".to_string()))
}

fn budget_message(err: &LedgerError) -> String {
    match err {
        LedgerError::DuplicateCategory(_) => "Category already exists.".to_string(),
        LedgerError::OutOfRange { remaining, .. } => {
            format!("Enter value between 1 and {remaining}")
        }
        LedgerError::InvalidInput(message) => message.clone(),
    }
}

fn decoder_for(
    feed: Feed,
) -> fn(&[u8]) -> Result<FeedPayload, crate::error::FeedError> {
    match feed {
        Feed::Stock => feeds::decode_stock,
        Feed::Summary => feeds::decode_summary,
        Feed::Crypto => feeds::decode_crypto,
        Feed::Budget => feeds::decode_budget,
    }
}

fn open_session_log(config: &Config) -> Option<fs::File> {
    fs::create_dir_all(&config.session_log_dir).ok()?;
    let run_id = crate::config::resolve_run_id();
    let path = config.session_log_dir.join(format!("{run_id}.session.jsonl"));
    fs::OpenOptions::new().create(true).append(true).open(path).ok()
}
