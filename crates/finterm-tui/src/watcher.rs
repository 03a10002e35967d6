//! Response side of the worker file protocol.
//!
//! One background thread per outstanding request polls for the response
//! file, decodes it once present, and delivers exactly one event over the
//! channel the foreground loop drains. Watcher threads own nothing shared:
//! no model access, no terminal access.
//!
//! Each path pair carries a generation counter. Submitting a new request
//! bumps it, so a watcher left over from a superseded request notices its
//! ticket is stale and exits without delivering. This is what keeps a late
//! response from overwriting a newer one.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::FeedError;
use crate::feeds::{Feed, FeedEvent, FeedPayload};

/// Generation counter for one request/response path pair.
#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Arc<AtomicU64>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request generation, retiring any watcher still running
    /// for this slot.
    pub fn begin(&self) -> WatchTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        WatchTicket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// A watcher's claim on a slot: valid until the next `begin` call.
#[derive(Debug)]
pub struct WatchTicket {
    pub generation: u64,
    current: Arc<AtomicU64>,
}

impl WatchTicket {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// Spawns the poll-until-present loop for one response file.
///
/// Delivery happens at most once: a decoded payload on success, a
/// `FeedError` if the file could not be read or decoded. A malformed file is
/// treated as permanent; the watcher stops rather than retrying the decode.
pub fn spawn_watch<F>(
    path: PathBuf,
    interval: Duration,
    feed: Feed,
    ticket: WatchTicket,
    decode: F,
    events: Sender<FeedEvent>,
) -> thread::JoinHandle<()>
where
    F: FnOnce(&[u8]) -> Result<FeedPayload, FeedError> + Send + 'static,
{
    thread::spawn(move || {
        loop {
            if !ticket.is_current() {
                return;
            }
            if path.exists() {
                break;
            }
            thread::sleep(interval);
        }
        let result = fs::read(&path)
            .map_err(FeedError::from)
            .and_then(|bytes| decode(&bytes));
        if !ticket.is_current() {
            return;
        }
        // The foreground loop may be gone during shutdown.
        let _ = events.send(FeedEvent {
            feed,
            generation: ticket.generation,
            result,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use crate::feeds::decode_crypto;

    const FAST: Duration = Duration::from_millis(10);

    #[test]
    fn does_not_fire_until_file_exists_then_fires_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_crypto.json");
        let slot = RequestSlot::new();
        let (tx, rx) = mpsc::channel();

        let handle = spawn_watch(
            path.clone(),
            FAST,
            Feed::Crypto,
            slot.begin(),
            decode_crypto,
            tx,
        );

        assert!(rx.recv_timeout(Duration::from_millis(80)).is_err());

        fs::write(&path, br#"{"btc": 1, "eth": 2}"#).unwrap();
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.feed, Feed::Crypto);
        match event.result.unwrap() {
            FeedPayload::Crypto(pairs) => assert_eq!(pairs.len(), 2),
            other => panic!("unexpected payload: {other:?}"),
        }

        handle.join().unwrap();
        // Thread finished; the sender is dropped and no second event exists.
        assert!(rx.recv_timeout(Duration::from_millis(40)).is_err());
    }

    #[test]
    fn malformed_file_reports_decode_error_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_crypto.json");
        fs::write(&path, b"not json at all").unwrap();
        let slot = RequestSlot::new();
        let (tx, rx) = mpsc::channel();

        let handle = spawn_watch(path, FAST, Feed::Crypto, slot.begin(), decode_crypto, tx);

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event.result, Err(FeedError::Decode(_))));
        handle.join().unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(40)).is_err());
    }

    #[test]
    fn superseded_watcher_never_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_crypto.json");
        let slot = RequestSlot::new();
        let (tx, rx) = mpsc::channel();

        let stale = spawn_watch(
            path.clone(),
            FAST,
            Feed::Crypto,
            slot.begin(),
            decode_crypto,
            tx.clone(),
        );
        // A second request retires the first watcher's ticket.
        let fresh_ticket = slot.begin();
        fs::write(&path, br#"{"btc": 1}"#).unwrap();
        stale.join().unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(40)).is_err());

        let fresh = spawn_watch(path, FAST, Feed::Crypto, fresh_ticket, decode_crypto, tx);
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.generation, slot.current());
        fresh.join().unwrap();
    }
}
