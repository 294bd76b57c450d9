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

use serde::Serialize;

use crate::error::Fallible;
use crate::library::Library;
use crate::sm2::due_count;
use crate::sm2::mastered_count;
use crate::sm2::mastery_percent;
use crate::types::collection::Collection;
use crate::types::ids::CollectionId;
use crate::types::timestamp::Timestamp;

pub fn print_stats(library: &Library, collection: Option<&str>, now: Timestamp) -> Fallible<()> {
    let collections = match collection {
        Some(reference) => vec![library.resolve_collection(reference)?],
        None => library.db.list_collections()?,
    };
    let stats: Vec<Stats> = collections.iter().map(|c| get_stats(c, now)).collect();
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{}", stats_json);
    Ok(())
}

#[derive(Serialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    id: CollectionId,
    name: String,
    item_count: usize,
    due_count: usize,
    mastered_count: usize,
    mastery_percent: u32,
    /// Lifetime percentage of correct answers, `None` before the first one.
    accuracy_percent: Option<u32>,
    review_count: u64,
    last_studied: Option<Timestamp>,
}

fn get_stats(collection: &Collection, now: Timestamp) -> Stats {
    let items = &collection.items;
    let correct: u64 = items
        .iter()
        .map(|item| u64::from(item.memory.correct_count))
        .sum();
    let total: u64 = items
        .iter()
        .map(|item| u64::from(item.memory.total_count))
        .sum();
    let accuracy_percent = if total == 0 {
        None
    } else {
        Some((100.0 * correct as f64 / total as f64).round() as u32)
    };
    Stats {
        id: collection.id.clone(),
        name: collection.name.clone(),
        item_count: items.len(),
        due_count: due_count(items, now),
        mastered_count: mastered_count(items),
        mastery_percent: mastery_percent(items),
        accuracy_percent,
        review_count: total,
        last_studied: collection.last_studied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm2;
    use crate::types::image_hash::ImageHash;
    use crate::types::item::Item;
    use crate::types::quality::Quality;

    #[test]
    fn test_empty_collection() {
        let collection = Collection::new("Team", None, Timestamp::from_millis(0));
        let stats = get_stats(&collection, Timestamp::from_millis(0));
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.mastery_percent, 0);
        assert_eq!(stats.accuracy_percent, None);
        assert_eq!(stats.review_count, 0);
    }

    #[test]
    fn test_stats() -> Fallible<()> {
        let start = Timestamp::from_millis(0);
        let mut collection = Collection::new("Team", None, start);
        let mut ada = Item::new("Ada", ImageHash::hash_bytes(b"a"), None, start);
        let max = Item::new("Max", ImageHash::hash_bytes(b"m"), None, start);
        let history = [
            Quality::RECALLED,
            Quality::RECALLED,
            Quality::RECALLED,
            Quality::FORGOT,
        ];
        for quality in history {
            ada.memory = sm2::update(&ada.memory, quality, start);
        }
        collection.items = vec![ada, max];
        let stats = get_stats(&collection, start.plus_days(1));
        assert_eq!(stats.item_count, 2);
        assert_eq!(stats.due_count, 2);
        assert_eq!(stats.mastered_count, 0);
        assert_eq!(stats.accuracy_percent, Some(75));
        assert_eq!(stats.review_count, 4);

        let json = serde_json::to_value(&stats)?;
        assert_eq!(json["itemCount"], 2);
        assert_eq!(json["accuracyPercent"], 75);
        assert!(json["lastStudied"].is_null());
        Ok(())
    }
}
