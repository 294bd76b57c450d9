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

//! Choosing and ordering the items of a session.
//!
//! Randomness comes from the caller, so tests can seed it.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::ErrorReport;
use crate::sm2::is_due;
use crate::types::ids::ItemId;
use crate::types::item::Item;
use crate::types::mode::StudyMode;
use crate::types::timestamp::Timestamp;

pub const DEFAULT_MAX_ITEMS: usize = 20;

pub const DEFAULT_CHOICE_COUNT: usize = 4;

pub const MIN_CHOICE_COUNT: usize = 2;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct QueueOptions {
    /// Upper bound on the length of a flash or choice session.
    pub max_items: usize,
    /// Options per question in choice modes, the correct one included.
    pub choice_count: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            choice_count: DEFAULT_CHOICE_COUNT,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum QueueError {
    /// There is nothing to study.
    EmptyCollection,
    /// A choice mode needs more items than the collection has.
    InsufficientItems {
        required: usize,
        available: usize,
    },
    /// A choice question needs the correct option and at least one other.
    TooFewChoices(usize),
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::EmptyCollection => write!(f, "the collection is empty."),
            QueueError::InsufficientItems {
                required,
                available,
            } => write!(
                f,
                "insufficient items: this mode needs at least {required} items, but the collection has {available}."
            ),
            QueueError::TooFewChoices(count) => write!(
                f,
                "a choice question needs at least {MIN_CHOICE_COUNT} options, not {count}."
            ),
        }
    }
}

impl Error for QueueError {}

impl From<QueueError> for ErrorReport {
    fn from(value: QueueError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// The items of a session, in presentation order.
#[derive(Clone, PartialEq, Debug)]
pub struct SessionPlan {
    pub queue: Vec<ItemId>,
    /// For choice modes, the shuffled options offered for each queue entry.
    /// Empty for the other modes.
    pub choices: Vec<Vec<ItemId>>,
}

/// Select and order the items to present in a session.
///
/// Speed sessions get every item, shuffled. The other modes get the due
/// items, or every item when nothing is due, shuffled and truncated to
/// `options.max_items`.
pub fn build_queue<'a, R: Rng + ?Sized>(
    items: &'a [Item],
    mode: StudyMode,
    now: Timestamp,
    options: QueueOptions,
    rng: &mut R,
) -> Result<Vec<&'a Item>, QueueError> {
    if items.is_empty() {
        return Err(QueueError::EmptyCollection);
    }
    if mode.has_choices() {
        check_choice_count(items, options.choice_count)?;
    }
    let mut queue: Vec<&Item> = if mode == StudyMode::Speed {
        items.iter().collect()
    } else {
        let due: Vec<&Item> = items.iter().filter(|item| is_due(item, now)).collect();
        if due.is_empty() {
            items.iter().collect()
        } else {
            due
        }
    };
    queue.shuffle(rng);
    if mode != StudyMode::Speed {
        queue.truncate(options.max_items);
    }
    Ok(queue)
}

/// Pick `count - 1` distractors for `correct` from `items` and shuffle them
/// together with it.
pub fn choices_for<'a, R: Rng + ?Sized>(
    correct: &'a Item,
    items: &'a [Item],
    count: usize,
    rng: &mut R,
) -> Result<Vec<&'a Item>, QueueError> {
    check_choice_count(items, count)?;
    let mut others: Vec<&Item> = items.iter().filter(|item| item.id != correct.id).collect();
    others.shuffle(rng);
    others.truncate(count.saturating_sub(1));
    if others.len() + 1 < count {
        // Duplicate ids in the collection left too few distinct distractors.
        return Err(QueueError::InsufficientItems {
            required: count,
            available: others.len() + 1,
        });
    }
    let mut choices = others;
    choices.push(correct);
    choices.shuffle(rng);
    Ok(choices)
}

/// Build the queue and, for choice modes, the options of every question.
pub fn build_plan<R: Rng + ?Sized>(
    items: &[Item],
    mode: StudyMode,
    now: Timestamp,
    options: QueueOptions,
    rng: &mut R,
) -> Result<SessionPlan, QueueError> {
    let queue = build_queue(items, mode, now, options, rng)?;
    let mut choices = Vec::new();
    if mode.has_choices() {
        for item in &queue {
            let offered = choices_for(item, items, options.choice_count, rng)?;
            choices.push(offered.into_iter().map(|o| o.id.clone()).collect());
        }
    }
    Ok(SessionPlan {
        queue: queue.into_iter().map(|item| item.id.clone()).collect(),
        choices,
    })
}

fn check_choice_count(items: &[Item], count: usize) -> Result<(), QueueError> {
    if count < MIN_CHOICE_COUNT {
        return Err(QueueError::TooFewChoices(count));
    }
    if items.is_empty() {
        return Err(QueueError::EmptyCollection);
    }
    if items.len() < count {
        return Err(QueueError::InsufficientItems {
            required: count,
            available: items.len(),
        });
    }
    Ok(())
}
