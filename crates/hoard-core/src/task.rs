//! One-off reward tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task users complete once for a flat point reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// Points credited on completion.
    pub points: i64,
    /// Inactive tasks are hidden from users but keep their completions.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: &str, points: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            points,
            is_active: true,
            created_at: now,
        }
    }
}
