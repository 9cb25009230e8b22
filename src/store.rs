// src/store.rs
//! Persistence collaborator: existence check + upsert by natural key.
//!
//! The pipeline never talks SQL; it hands a flat record keyed by the
//! platform post id to whatever store the embedder wires in. The in-memory
//! implementation backs tests and dry runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::ai::SentimentAnalysis;
use crate::classify::Category;
use crate::politics::PoliticalAnalysis;

/// Flat record for one analyzed post. Classification and analysis fields are
/// plain columns; `raw` carries the original payload verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPost {
    pub tweet_id: String,
    pub trend_original: String,
    pub trend_clean: String,
    pub category: Category,
    pub author: String,
    pub text: String,
    pub link: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub verified: bool,
    pub location: String,
    pub sentiment: Option<SentimentAnalysis>,
    pub political: Option<PoliticalAnalysis>,
    pub raw: serde_json::Value,
}

/// What the store did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn exists(&self, tweet_id: &str) -> Result<bool>;
    async fn upsert(&self, record: StoredPost) -> Result<UpsertOutcome>;
}

/// In-memory store keyed by tweet id. Upserts merge the way the hosted
/// database does: fresh engagement/analysis overwrite, first-seen capture
/// metadata stays.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredPost>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("memory store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, tweet_id: &str) -> Option<StoredPost> {
        self.records
            .lock()
            .expect("memory store poisoned")
            .get(tweet_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryStore {
    async fn exists(&self, tweet_id: &str) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .expect("memory store poisoned")
            .contains_key(tweet_id))
    }

    async fn upsert(&self, record: StoredPost) -> Result<UpsertOutcome> {
        let mut records = self.records.lock().expect("memory store poisoned");
        match records.get_mut(&record.tweet_id) {
            Some(existing) => {
                let captured_at = existing.captured_at;
                *existing = record;
                existing.captured_at = captured_at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                records.insert(record.tweet_id.clone(), record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}
