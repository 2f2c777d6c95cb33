//! Row metadata for stored message data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything about a stored row except the payload itself.
///
/// `size` always equals the byte length of the stored data; `created` is set
/// on first insert and never changes, `updated` moves on every store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataRecord {
    pub message_id: String,
    pub size: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}
