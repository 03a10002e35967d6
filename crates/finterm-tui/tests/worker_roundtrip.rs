//! End-to-end exercises over a temp worker root: the session writes a
//! request file, the test plays the worker and writes the response, and the
//! foreground drain applies the decoded result.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use finterm_tui::config::{Config, ResetPolicy};
use finterm_tui::session::Session;

fn test_config(root: &Path) -> Config {
    Config {
        worker_root: root.to_path_buf(),
        quote_poll: Duration::from_millis(10),
        summary_poll: Duration::from_millis(10),
        session_log_dir: root.join("session-logs"),
        reset_policy: ResetPolicy::Reset,
    }
}

fn submit(session: &mut Session, line: &str) {
    session.model.input = line.to_string();
    session.submit_line();
}

/// Workers write whole files before the watcher can observe them; mirror
/// that with a temp-file + rename, like the front end's own writes.
fn worker_write(path: &Path, body: &[u8]) {
    let tmp = path.with_extension("json.part");
    fs::write(&tmp, body).unwrap();
    fs::rename(&tmp, path).unwrap();
}

fn drain_until(session: &mut Session, mut done: impl FnMut(&Session) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(session) {
        assert!(Instant::now() < deadline, "timed out waiting for watcher delivery");
        session.drain_events();
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn stock_search_round_trips_through_worker_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "search-stocks");
    submit(&mut session, "search $AAPL");

    let request = fs::read_to_string(dir.path().join("microservice-c/input_stock.json")).unwrap();
    assert_eq!(request, "{\n  \"ticker\": \"AAPL\"\n}");

    worker_write(
        &dir.path().join("microservice-c/output_stock.json"),
        br#"{"Date": "2026-08-28", "Open": 231.5, "High": 234.1,
            "Low": 230.0, "Close": 233.25, "Ticker": "AAPL"}"#,
    );

    drain_until(&mut session, |s| s.model.stock.is_some());
    let quote = session.model.stock.as_ref().unwrap();
    assert_eq!(quote.ticker, "AAPL");
    assert_eq!(quote.close, 233.25);
    assert_eq!(session.model.status, "");
}

#[test]
fn summary_round_trips_and_renders_every_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "summary");
    let request = fs::read_to_string(dir.path().join("microservice-b/input_summary.json")).unwrap();
    assert_eq!(request, "{\n  \"summary\": 1\n}");

    worker_write(
        &dir.path().join("microservice-b/output_summary.json"),
        br#"[
            {"Date": "2026-08-28", "Open": 41000.0, "High": 41200.0, "Low": 40900.0,
             "Close": 41100.0, "Volume": 350000000, "Name": "Dow Jones", "Ticker": "DJI"},
            {"Date": "2026-08-28", "Open": 5600.0, "High": 5650.0, "Low": 5590.0,
             "Close": 5640.0, "Volume": 250000000, "Name": "S&P 500", "Ticker": "GSPC"},
            {"Date": "2026-08-28", "Open": 17500.0, "High": 17650.0, "Low": 17450.0,
             "Close": 17600.0, "Volume": 450000000, "Name": "NASDAQ", "Ticker": "IXIC"}
        ]"#,
    );

    drain_until(&mut session, |s| !s.model.summary.is_empty());
    assert_eq!(session.model.summary.len(), 3);
    assert_eq!(session.model.summary[2].name, "NASDAQ");
}

#[test]
fn crypto_rows_arrive_in_worker_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "search-crypto");
    submit(&mut session, "search bitcoin");

    worker_write(
        &dir.path().join("microservice-d/output_crypto.json"),
        br#"{"btc": 64000.5, "eth": 3100.25, "doge": 0.1}"#,
    );

    drain_until(&mut session, |s| !s.model.crypto.is_empty());
    let coins: Vec<&str> = session.model.crypto.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(coins, ["btc", "eth", "doge"]);
    assert_eq!(session.model.crypto[0].1, "64000.5");
}

#[test]
fn completed_budget_round_trips_and_sorts_the_computed_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "budget");
    for entry in ["1000", "rent", "40", "food", "30", "save", "30"] {
        submit(&mut session, entry);
    }

    // The worker reads the percentage shares and answers with amounts.
    let input = fs::read_to_string(dir.path().join("microservice-a/input.json")).unwrap();
    assert_eq!(
        input,
        "{\n  \"total\": 1000,\n  \"rent\": 40,\n  \"food\": 30,\n  \"save\": 30\n}"
    );
    worker_write(
        &dir.path().join("microservice-a/output.json"),
        br#"{"total": 1000, "save": 300, "rent": 400, "food": 300}"#,
    );

    drain_until(&mut session, |s| !s.model.budget_result.is_empty());
    let keys: Vec<&str> = session
        .model
        .budget_result
        .iter()
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(keys, ["food", "rent", "save", "Total"]);
    assert_eq!(session.model.status, "Budget calculated.");
}

#[test]
fn malformed_response_surfaces_without_delivering_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "search-crypto");
    submit(&mut session, "search bitcoin");

    worker_write(
        &dir.path().join("microservice-d/output_crypto.json"),
        b"not json",
    );

    drain_until(&mut session, |s| s.model.status.starts_with("Invalid"));
    assert!(session.model.crypto.is_empty());
    assert_eq!(session.model.status, "Invalid crypto data.");
}

#[test]
fn new_search_supersedes_the_previous_watcher() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(test_config(dir.path()));

    submit(&mut session, "search-crypto");
    submit(&mut session, "search bitcoin");
    // Second request before the first response ever lands.
    submit(&mut session, "search ethereum");

    worker_write(
        &dir.path().join("microservice-d/output_crypto.json"),
        br#"{"ethereum": 3100.25}"#,
    );

    drain_until(&mut session, |s| !s.model.crypto.is_empty());
    assert_eq!(session.model.crypto.len(), 1);
    assert_eq!(session.model.crypto[0].0, "ethereum");
}
