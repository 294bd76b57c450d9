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

//! The SM-2 review scheduler.
//!
//! Everything here is a pure function of its inputs. The current time is
//! always passed in.

use crate::types::item::Item;
use crate::types::item::MIN_EASE;
use crate::types::item::Memory;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// Items whose interval reaches this many days count as mastered.
pub const MASTERY_INTERVAL: u32 = 7;

/// Interval after the first successful recall.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second consecutive successful recall.
const SECOND_INTERVAL: u32 = 6;

/// Intervals stop growing at about a hundred thousand years, well inside
/// the range of a timestamp.
pub const MAX_INTERVAL: u32 = 36_500_000;

/// Compute an item's memory after a review of the given quality.
pub fn update(memory: &Memory, quality: Quality, now: Timestamp) -> Memory {
    let (interval, repetitions) = if quality.is_pass() {
        let interval = match memory.repetitions {
            0 => FIRST_INTERVAL,
            1 => SECOND_INTERVAL,
            _ => {
                let grown = (f64::from(memory.interval) * memory.ease_factor).round();
                grown.min(f64::from(MAX_INTERVAL)) as u32
            }
        };
        (interval, memory.repetitions + 1)
    } else {
        (0, 0)
    };
    // The ease adjustment depends on the quality alone, so failures shrink it
    // through the same formula.
    let q = f64::from(5 - quality.value());
    let ease_factor = (memory.ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE);
    Memory {
        interval,
        ease_factor,
        repetitions,
        next_review: now.plus_days(interval),
        last_reviewed: Some(now),
        correct_count: memory.correct_count + u32::from(quality.is_pass()),
        total_count: memory.total_count + 1,
    }
}

pub fn is_due(item: &Item, now: Timestamp) -> bool {
    item.memory.next_review <= now
}

pub fn is_mastered(item: &Item) -> bool {
    item.memory.interval >= MASTERY_INTERVAL
}

pub fn due_count(items: &[Item], now: Timestamp) -> usize {
    items.iter().filter(|item| is_due(item, now)).count()
}

pub fn mastered_count(items: &[Item]) -> usize {
    items.iter().filter(|item| is_mastered(item)).count()
}

/// Percentage of mastered items, rounded. Zero for an empty collection.
pub fn mastery_percent(items: &[Item]) -> u32 {
    if items.is_empty() {
        return 0;
    }
    (100.0 * mastered_count(items) as f64 / items.len() as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::image_hash::ImageHash;
    use crate::types::timestamp::DAY_MS;

    fn now() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000)
    }

    fn item_with_interval(interval: u32) -> Item {
        let mut item = Item::new("Grace", ImageHash::hash_bytes(b"grace"), None, now());
        item.memory.interval = interval;
        item
    }

    #[test]
    fn test_three_successes() {
        let mut memory = Memory::new(now());
        let mut intervals = Vec::new();
        for _ in 0..3 {
            memory = update(&memory, Quality::RECALLED, now());
            intervals.push(memory.interval);
        }
        assert_eq!(intervals, vec![1, 6, 15]);
        assert_eq!(memory.repetitions, 3);
        assert_eq!(memory.ease_factor, 2.5);
    }

    #[test]
    fn test_failure_resets() {
        let mut memory = Memory::new(now());
        for _ in 0..4 {
            memory = update(&memory, Quality::RECALLED, now());
        }
        assert!(memory.interval > 0);
        let memory = update(&memory, Quality::FORGOT, now());
        assert_eq!(memory.interval, 0);
        assert_eq!(memory.repetitions, 0);
        assert_eq!(memory.next_review, now());
    }

    #[test]
    fn test_long_streak_stays_scheduled() {
        let mut item = Item::new("Ada", ImageHash::hash_bytes(b"ada"), None, now());
        for _ in 0..30 {
            item.memory = update(&item.memory, Quality::RECALLED, now());
            assert!(!is_due(&item, now()));
            let expected = now().as_millis() + i64::from(item.memory.interval) * DAY_MS;
            assert_eq!(item.memory.next_review.as_millis(), expected);
        }
        assert_eq!(item.memory.interval, MAX_INTERVAL);
        assert_eq!(item.memory.repetitions, 30);
    }

    #[test]
    fn test_failure_shrinks_ease() {
        let memory = update(&Memory::new(now()), Quality::FORGOT, now());
        assert!((memory.ease_factor - 1.96).abs() < 1e-9);
    }

    #[test]
    fn test_ease_floor() {
        let mut memory = Memory::new(now());
        for _ in 0..20 {
            memory = update(&memory, Quality::FORGOT, now());
            assert!(memory.ease_factor >= MIN_EASE);
        }
        assert_eq!(memory.ease_factor, MIN_EASE);
        let memory = update(&memory, Quality::MIN, now());
        assert_eq!(memory.ease_factor, MIN_EASE);
    }

    #[test]
    fn test_perfect_recall_grows_ease() {
        let memory = update(&Memory::new(now()), Quality::MAX, now());
        assert!((memory.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_counters() {
        let qualities = [4, 1, 4, 4, 1, 0, 5, 3];
        let mut memory = Memory::new(now());
        for q in qualities {
            memory = update(&memory, Quality::new(q), now());
        }
        assert_eq!(memory.total_count, 8);
        assert_eq!(memory.correct_count, 5);
    }

    #[test]
    fn test_timestamps() {
        let memory = Memory::new(now());
        let memory = update(&memory, Quality::RECALLED, now());
        let memory = update(&memory, Quality::RECALLED, now());
        assert_eq!(memory.last_reviewed, Some(now()));
        assert_eq!(
            memory.next_review.as_millis(),
            now().as_millis() + 6 * DAY_MS
        );
    }

    #[test]
    fn test_does_not_mutate_input() {
        let memory = Memory::new(now());
        let copy = memory.clone();
        let _ = update(&memory, Quality::RECALLED, now());
        assert_eq!(memory, copy);
    }

    #[test]
    fn test_is_due() {
        let item = Item::new("Alan", ImageHash::hash_bytes(b"alan"), None, now());
        assert!(is_due(&item, now()));
        let mut later = item.clone();
        later.memory.next_review = now().plus_days(1);
        assert!(!is_due(&later, now()));
    }

    #[test]
    fn test_mastery() {
        assert_eq!(mastery_percent(&[]), 0);
        let all = vec![item_with_interval(7), item_with_interval(30)];
        assert_eq!(mastery_percent(&all), 100);
        let some = vec![
            item_with_interval(7),
            item_with_interval(6),
            item_with_interval(0),
        ];
        assert_eq!(mastered_count(&some), 1);
        assert_eq!(mastery_percent(&some), 33);
    }
}
