//! Request side of the worker file protocol.
//!
//! A request is one small JSON file at a well-known path. Submitting always
//! deletes the paired response file first so a watcher started afterwards
//! cannot pick up a response left over from an earlier submission. Writes go
//! through a temp file and an atomic rename; pollers must never observe a
//! partially written file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::FeedError;

/// The request/response file pair for one logical worker conversation.
#[derive(Debug, Clone)]
pub struct PathPair {
    pub request: PathBuf,
    pub response: PathBuf,
}

impl PathPair {
    pub fn new(request: PathBuf, response: PathBuf) -> Self {
        Self { request, response }
    }
}

/// Writes `payload` to the request path after clearing any stale response.
///
/// On failure nothing has been promised to the worker and no watcher should
/// be started.
pub fn submit<T: Serialize>(pair: &PathPair, payload: &T) -> Result<(), FeedError> {
    clear_response(pair);
    write_json_atomic(&pair.request, payload)
}

/// Removes the response file if present. Absence is not an error.
pub fn clear_response(pair: &PathPair) {
    let _ = fs::remove_file(&pair.response);
}

/// Pretty-printed (2-space indent, the grammar the workers parse) atomic
/// JSON write: temp sibling, then rename over the target.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), FeedError> {
    let body = serde_json::to_vec_pretty(value)
        .map_err(|err| FeedError::Decode(err.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_sibling(path);
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_writes_pretty_request() {
        let dir = tempfile::tempdir().unwrap();
        let pair = PathPair::new(dir.path().join("input.json"), dir.path().join("output.json"));

        submit(&pair, &json!({"ticker": "AAPL"})).unwrap();

        let body = fs::read_to_string(&pair.request).unwrap();
        assert_eq!(body, "{\n  \"ticker\": \"AAPL\"\n}");
        assert!(!dir.path().join("input.json.tmp").exists());
    }

    #[test]
    fn submit_clears_stale_response_first() {
        let dir = tempfile::tempdir().unwrap();
        let pair = PathPair::new(dir.path().join("input.json"), dir.path().join("output.json"));
        fs::write(&pair.response, b"{\"old\": true}").unwrap();

        submit(&pair, &json!({"coin": "bitcoin"})).unwrap();

        assert!(!pair.response.exists());
        assert!(pair.request.exists());
    }

    #[test]
    fn submit_creates_missing_worker_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("microservice-c");
        let pair = PathPair::new(base.join("input_stock.json"), base.join("output_stock.json"));

        submit(&pair, &json!({"ticker": "GME"})).unwrap();
        assert!(pair.request.exists());
    }
}
