//! Feed definitions: one per worker, with their wire shapes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::decode::decode_ordered_object;
use crate::error::FeedError;

/// The four worker-backed feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Stock,
    Summary,
    Crypto,
    Budget,
}

impl Feed {
    pub fn label(self) -> &'static str {
        match self {
            Feed::Stock => "stock",
            Feed::Summary => "summary",
            Feed::Crypto => "crypto",
            Feed::Budget => "budget",
        }
    }
}

/// One day of quote data for a single ticker. Field names are the worker
/// file contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockQuote {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub ticker: String,
}

/// One tracked index in the market summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexEntry {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub name: String,
    pub ticker: String,
}

/// A decoded response, tagged by shape.
#[derive(Debug)]
pub enum FeedPayload {
    Stock(StockQuote),
    Summary(Vec<IndexEntry>),
    /// Source-ordered (coin, price) pairs.
    Crypto(Vec<(String, Value)>),
    /// Source-ordered (category, amount) pairs from the budget worker.
    Budget(Vec<(String, Value)>),
}

/// What a watcher thread hands back to the foreground loop.
#[derive(Debug)]
pub struct FeedEvent {
    pub feed: Feed,
    pub generation: u64,
    pub result: Result<FeedPayload, FeedError>,
}

pub fn ticker_request(ticker: &str) -> Value {
    json!({ "ticker": ticker })
}

pub fn coin_request(coin: &str) -> Value {
    json!({ "coin": coin })
}

pub fn summary_request() -> Value {
    json!({ "summary": 1 })
}

pub fn decode_stock(bytes: &[u8]) -> Result<FeedPayload, FeedError> {
    serde_json::from_slice::<StockQuote>(bytes)
        .map(FeedPayload::Stock)
        .map_err(|err| FeedError::Decode(err.to_string()))
}

pub fn decode_summary(bytes: &[u8]) -> Result<FeedPayload, FeedError> {
    serde_json::from_slice::<Vec<IndexEntry>>(bytes)
        .map(FeedPayload::Summary)
        .map_err(|err| FeedError::Decode(err.to_string()))
}

pub fn decode_crypto(bytes: &[u8]) -> Result<FeedPayload, FeedError> {
    decode_ordered_object(bytes).map(FeedPayload::Crypto)
}

pub fn decode_budget(bytes: &[u8]) -> Result<FeedPayload, FeedError> {
    decode_ordered_object(bytes).map(FeedPayload::Budget)
}
