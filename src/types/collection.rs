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

use crate::types::ids::CollectionId;
use crate::types::item::Item;
use crate::types::timestamp::Timestamp;

/// The icon of a collection created without one.
pub const DEFAULT_ICON: &str = "📚";

/// A named group of items, e.g. "New team" or "Book club".
#[derive(Clone, PartialEq, Debug)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub icon: String,
    pub created_at: Timestamp,
    pub last_studied: Option<Timestamp>,
    /// In insertion order.
    pub items: Vec<Item>,
}

impl Collection {
    pub fn new(name: &str, icon: Option<&str>, now: Timestamp) -> Self {
        Self {
            id: CollectionId::generate(),
            name: name.trim().to_string(),
            icon: icon.unwrap_or(DEFAULT_ICON).to_string(),
            created_at: now,
            last_studied: None,
            items: Vec::new(),
        }
    }
}
