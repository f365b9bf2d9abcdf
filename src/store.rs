//! In-memory association from batch ids to answer records, with a TTL.
//!
//! One generation call produces one batch; a later check-answer call looks
//! its question up here so the model is never re-invoked. Batches are
//! write-once: `put` stores a finished mapping under a fresh id and nothing
//! ever mutates it afterwards. Expired batches, unknown batch ids, and
//! unknown question ids are all indistinguishable misses.
//!
//! Time is passed in explicitly by the `*_at` variants so expiry is testable
//! without sleeping; the public `put`/`get` wrappers use `Instant::now()`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::StoredAnswer;

/// Default batch lifetime. Generous enough for a quiz session, short enough
/// to bound memory on a single process.
pub const DEFAULT_BATCH_TTL: Duration = Duration::from_secs(30 * 60);

struct Batch {
  created_at: Instant,
  items: HashMap<String, StoredAnswer>,
}

#[derive(Clone)]
pub struct QuestionStore {
  ttl: Duration,
  batches: Arc<RwLock<HashMap<String, Batch>>>,
}

impl QuestionStore {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, batches: Arc::new(RwLock::new(HashMap::new())) }
  }

  /// Store a finished batch under a fresh id and return the id.
  #[instrument(level = "debug", skip(self, items), fields(items = items.len()))]
  pub async fn put(&self, items: HashMap<String, StoredAnswer>) -> String {
    self.put_at(items, Instant::now()).await
  }

  /// Look up one question's answer record. `None` covers unknown batch,
  /// expired batch, and unknown question id alike.
  #[instrument(level = "debug", skip(self))]
  pub async fn get(&self, batch_id: &str, question_id: &str) -> Option<StoredAnswer> {
    self.get_at(batch_id, question_id, Instant::now()).await
  }

  pub async fn put_at(&self, items: HashMap<String, StoredAnswer>, now: Instant) -> String {
    let batch_id = Uuid::new_v4().to_string();
    let mut batches = self.batches.write().await;
    // Opportunistic purge keeps the map bounded without a sweeper task.
    let before = batches.len();
    batches.retain(|_, b| now.duration_since(b.created_at) < self.ttl);
    let purged = before - batches.len();
    if purged > 0 {
      debug!(target: "quiz", purged, "purged expired batches");
    }
    batches.insert(batch_id.clone(), Batch { created_at: now, items });
    batch_id
  }

  pub async fn get_at(&self, batch_id: &str, question_id: &str, now: Instant) -> Option<StoredAnswer> {
    let batches = self.batches.read().await;
    let batch = batches.get(batch_id)?;
    if now.duration_since(batch.created_at) >= self.ttl {
      return None;
    }
    batch.items.get(question_id).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AnswerKey, QuestionKind};
  use std::collections::BTreeMap;

  fn item(answer: &str) -> StoredAnswer {
    StoredAnswer {
      kind: QuestionKind::Mcq,
      options: BTreeMap::from([("A".to_string(), "x".to_string())]),
      answer: AnswerKey::Letter(answer.to_string()),
      explanation: String::new(),
    }
  }

  fn batch_of(ids: &[&str]) -> HashMap<String, StoredAnswer> {
    ids.iter().map(|id| (id.to_string(), item("A"))).collect()
  }

  #[tokio::test]
  async fn put_allocates_distinct_batch_ids() {
    let store = QuestionStore::new(DEFAULT_BATCH_TTL);
    let a = store.put(batch_of(&["q1"])).await;
    let b = store.put(batch_of(&["q1"])).await;
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn get_finds_stored_items_and_misses_everything_else() {
    let store = QuestionStore::new(DEFAULT_BATCH_TTL);
    let batch = store.put(batch_of(&["q1", "q2"])).await;

    assert!(store.get(&batch, "q1").await.is_some());
    assert!(store.get(&batch, "q3").await.is_none());
    assert!(store.get("no-such-batch", "q1").await.is_none());
  }

  #[tokio::test]
  async fn batches_are_isolated() {
    let store = QuestionStore::new(DEFAULT_BATCH_TTL);
    let first = store.put(batch_of(&["only-in-first"])).await;
    let second = store.put(batch_of(&["only-in-second"])).await;

    assert!(store.get(&first, "only-in-second").await.is_none());
    assert!(store.get(&second, "only-in-first").await.is_none());
  }

  #[tokio::test]
  async fn expired_batch_reads_like_an_unknown_one() {
    let ttl = Duration::from_secs(60);
    let store = QuestionStore::new(ttl);
    let t0 = Instant::now();
    let batch = store.put_at(batch_of(&["q1"]), t0).await;

    assert!(store.get_at(&batch, "q1", t0 + Duration::from_secs(59)).await.is_some());
    assert!(store.get_at(&batch, "q1", t0 + ttl).await.is_none());
  }

  #[tokio::test]
  async fn expired_batches_are_purged_on_put() {
    let ttl = Duration::from_secs(60);
    let store = QuestionStore::new(ttl);
    let t0 = Instant::now();
    let old = store.put_at(batch_of(&["q1"]), t0).await;

    let _new = store.put_at(batch_of(&["q1"]), t0 + ttl * 2).await;
    assert!(store.get_at(&old, "q1", t0 + ttl * 2).await.is_none());
    assert_eq!(store.batches.read().await.len(), 1);
  }
}
