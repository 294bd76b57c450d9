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

//! JSON backups. The layout is the one the browser version of the app
//! exports: an array of decks, each with its people and their photos inlined
//! as `data:` URLs.

use std::collections::HashMap;
use std::fs::read_to_string;
use std::fs::write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::library::Library;
use crate::media::Photo;
use crate::types::collection::Collection;
use crate::types::ids::CollectionId;
use crate::types::ids::ItemId;
use crate::types::image_hash::ImageHash;
use crate::types::item::Item;
use crate::types::item::MIN_EASE;
use crate::types::item::Memory;
use crate::types::timestamp::Timestamp;

pub fn export_library(library: &Library, output: Option<PathBuf>) -> Fallible<()> {
    let backup: Vec<DeckBackup> = get_backup(&library.db)?;
    let json: String = serde_json::to_string_pretty(&backup)?;
    match output {
        Some(path) => {
            write(&path, json)?;
            log::info!("Wrote {} collections to {}", backup.len(), path.display());
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

pub fn restore_library(library: &Library, file: &Path) -> Fallible<()> {
    if !file.is_file() {
        return fail("backup file does not exist.");
    }
    let content = read_to_string(file)?;
    let count = restore_from_json(&library.db, &content)?;
    log::info!("Restored {count} collections.");
    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
struct DeckBackup {
    id: String,
    name: String,
    emoji: String,
    created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_studied: Option<Timestamp>,
    people: Vec<PersonBackup>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
struct PersonBackup {
    id: String,
    name: String,
    photo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    interval: u32,
    ease_factor: f64,
    repetitions: u32,
    next_review: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_reviewed: Option<Timestamp>,
    correct_count: u32,
    total_count: u32,
}

fn get_backup(db: &Database) -> Fallible<Vec<DeckBackup>> {
    let mut photos: HashMap<ImageHash, String> = HashMap::new();
    let mut decks = Vec::new();
    for collection in db.list_collections()? {
        let mut people = Vec::new();
        for item in collection.items {
            let photo = match photos.get(&item.image) {
                Some(url) => url.clone(),
                None => {
                    let photo = db.get_image(item.image)?.ok_or_else(|| {
                        ErrorReport::new(format!("photo of {} is missing.", item.name))
                    })?;
                    let url = photo.to_data_url();
                    photos.insert(item.image, url.clone());
                    url
                }
            };
            let memory = item.memory;
            people.push(PersonBackup {
                id: item.id.to_string(),
                name: item.name,
                photo,
                notes: item.notes,
                interval: memory.interval,
                ease_factor: memory.ease_factor,
                repetitions: memory.repetitions,
                next_review: memory.next_review,
                last_reviewed: memory.last_reviewed,
                correct_count: memory.correct_count,
                total_count: memory.total_count,
            });
        }
        decks.push(DeckBackup {
            id: collection.id.to_string(),
            name: collection.name,
            emoji: collection.icon,
            created_at: collection.created_at,
            last_studied: collection.last_studied,
            people,
        });
    }
    Ok(decks)
}

/// Replace everything in the database with the backup. Nothing is changed
/// unless every entry is valid. Returns the number of collections restored.
fn restore_from_json(db: &Database, content: &str) -> Fallible<usize> {
    let value: Value = serde_json::from_str(content)?;
    if !value.is_array() {
        return fail("backup must hold a JSON array.");
    }
    let decks: Vec<DeckBackup> = serde_json::from_value(value)?;
    let mut photos: HashMap<ImageHash, Photo> = HashMap::new();
    let mut collections = Vec::new();
    for deck in decks {
        collections.push(deck_to_collection(deck, &mut photos)?);
    }
    let photos: Vec<Photo> = photos.into_values().collect();
    db.replace_all(&collections, &photos)?;
    Ok(collections.len())
}

fn deck_to_collection(
    deck: DeckBackup,
    photos: &mut HashMap<ImageHash, Photo>,
) -> Fallible<Collection> {
    let mut items = Vec::new();
    for person in deck.people {
        if person.name.trim().is_empty() {
            return fail(format!("a person in '{}' has no name.", deck.name));
        }
        if person.correct_count > person.total_count {
            return fail(format!(
                "{} has more correct answers than answers.",
                person.name
            ));
        }
        if !person.ease_factor.is_finite() || person.ease_factor < MIN_EASE {
            return fail(format!(
                "{} has an invalid ease factor: {}",
                person.name, person.ease_factor
            ));
        }
        let photo = Photo::from_data_url(&person.photo)
            .map_err(|e| ErrorReport::new(format!("photo of {}: {}", person.name, e.message())))?;
        let image = photo.hash;
        photos.entry(image).or_insert(photo);
        let notes = person.notes.filter(|notes| !notes.trim().is_empty());
        items.push(Item {
            id: ItemId::parse(&person.id)?,
            name: person.name,
            image,
            notes,
            memory: Memory {
                interval: person.interval,
                ease_factor: person.ease_factor,
                repetitions: person.repetitions,
                next_review: person.next_review,
                last_reviewed: person.last_reviewed,
                correct_count: person.correct_count,
                total_count: person.total_count,
            },
        });
    }
    Ok(Collection {
        id: CollectionId::parse(&deck.id)?,
        name: deck.name,
        icon: deck.emoji,
        created_at: deck.created_at,
        last_studied: deck.last_studied,
        items,
    })
}
