// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::types::ids::ItemId;
use crate::types::image_hash::ImageHash;
use crate::types::timestamp::Timestamp;

/// The ease factor of an item that has never been reviewed.
pub const INITIAL_EASE: f64 = 2.5;

/// The floor below which the ease factor never drops.
pub const MIN_EASE: f64 = 1.3;

/// The memory model of an item. Only the scheduler produces new values.
#[derive(Clone, PartialEq, Debug)]
pub struct Memory {
    /// Days until the next scheduled review. Zero means unscheduled, either
    /// because the item is new or because it was just forgotten.
    pub interval: u32,
    /// Governs how fast the interval grows. Never below [`MIN_EASE`].
    pub ease_factor: f64,
    /// Consecutive successful recalls since the last failure.
    pub repetitions: u32,
    /// When the item becomes due.
    pub next_review: Timestamp,
    /// When the item was last answered.
    pub last_reviewed: Option<Timestamp>,
    /// Lifetime number of successful recalls.
    pub correct_count: u32,
    /// Lifetime number of reviews.
    pub total_count: u32,
}

impl Memory {
    /// The memory of a freshly created item, due immediately.
    pub fn new(now: Timestamp) -> Self {
        Self {
            interval: 0,
            ease_factor: INITIAL_EASE,
            repetitions: 0,
            next_review: now,
            last_reviewed: None,
            correct_count: 0,
            total_count: 0,
        }
    }
}

/// A face and the name that goes with it.
#[derive(Clone, PartialEq, Debug)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub image: ImageHash,
    pub notes: Option<String>,
    pub memory: Memory,
}

impl Item {
    pub fn new(name: &str, image: ImageHash, notes: Option<&str>, now: Timestamp) -> Self {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        Self {
            id: ItemId::generate(),
            name: name.trim().to_string(),
            image,
            notes: notes.map(str::to_string),
            memory: Memory::new(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_memory() {
        let now = Timestamp::from_millis(1_000);
        let memory = Memory::new(now);
        assert_eq!(memory.interval, 0);
        assert_eq!(memory.ease_factor, 2.5);
        assert_eq!(memory.repetitions, 0);
        assert_eq!(memory.next_review, now);
        assert_eq!(memory.last_reviewed, None);
        assert_eq!(memory.correct_count, 0);
        assert_eq!(memory.total_count, 0);
    }

    #[test]
    fn test_new_item_trims() {
        let now = Timestamp::from_millis(0);
        let image = ImageHash::hash_bytes(b"jpeg");
        let item = Item::new("  Ada Lovelace ", image, Some("   "), now);
        assert_eq!(item.name, "Ada Lovelace");
        assert_eq!(item.notes, None);
        let item = Item::new("Ada", image, Some(" math "), now);
        assert_eq!(item.notes.as_deref(), Some("math"));
    }
}
