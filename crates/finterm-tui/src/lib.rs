//! Terminal front end for file-coordinated market-data and budget workers.
//!
//! The binary never talks to a worker directly: it writes a request file,
//! then polls for the paired response file and decodes it once present.
//! Watcher threads deliver results over an mpsc channel that only the
//! foreground loop drains, so all model mutation stays single-writer.

pub mod channel;
pub mod config;
pub mod decode;
pub mod error;
pub mod feeds;
pub mod ledger;
pub mod model;
pub mod session;
pub mod ui;
pub mod watcher;
