//! The record shape used for all generated benchmark data.

use serde::{Deserialize, Serialize};

/// A benchmark record.
///
/// `id == 0` means the record has not been stored yet; backends assign a
/// fresh identifier on insert and write it back into the item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub text: String,
    pub float64: f64,
    pub int32: i32,
    pub int64: i64,
}

impl Entity {
    /// Build the `index`-th generated record.
    pub fn numbered(index: usize) -> Self {
        Self {
            id: 0,
            text: format!("Entity no. {}", index),
            float64: index as f64,
            int32: index as i32,
            int64: index as i64,
        }
    }

    /// Whether a backend has already assigned an identifier.
    pub fn has_id(&self) -> bool {
        self.id != 0
    }
}

/// Reset every identifier so the next insert assigns fresh ones.
pub fn clear_ids(items: &mut [Entity]) {
    for item in items {
        item.id = 0;
    }
}
