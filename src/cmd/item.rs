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

use std::path::Path;
use std::time::Instant;

use walkdir::WalkDir;

use crate::db::ItemUpdate;
use crate::error::Fallible;
use crate::error::fail;
use crate::library::Library;
use crate::library::resolve_item;
use crate::media::is_photo;
use crate::media::load_photo;
use crate::media::name_from_file;
use crate::types::item::Item;
use crate::types::timestamp::Timestamp;

pub fn add_item(
    library: &Library,
    collection: &str,
    name: &str,
    photo: &Path,
    notes: Option<&str>,
    now: Timestamp,
) -> Fallible<Item> {
    if name.trim().is_empty() {
        return fail("name is empty.");
    }
    let collection = library.resolve_collection(collection)?;
    let photo = load_photo(photo)?;
    library.db.put_image(&photo)?;
    let item = Item::new(name, photo.hash, notes, now);
    library.db.insert_item(&collection.id, &item)?;
    Ok(item)
}

/// Add one item per photo under `photos`, in file name order. Returns how
/// many were added.
pub fn import_photos(
    library: &Library,
    collection: &str,
    photos: &Path,
    now: Timestamp,
) -> Fallible<usize> {
    if !photos.is_dir() {
        return fail("photo directory does not exist.");
    }
    let collection = library.resolve_collection(collection)?;
    let start = Instant::now();
    let mut added = 0;
    for entry in WalkDir::new(photos).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_photo(path) {
            continue;
        }
        let name = match name_from_file(path) {
            Some(name) => name,
            None => {
                log::info!("Skipping {}: no name in the file name.", path.display());
                continue;
            }
        };
        let photo = load_photo(path)?;
        library.db.put_image(&photo)?;
        let item = Item::new(&name, photo.hash, None, now);
        library.db.insert_item(&collection.id, &item)?;
        added += 1;
    }
    let duration = start.elapsed().as_millis();
    log::debug!("Imported {added} photos in {duration}ms.");
    Ok(added)
}

pub fn remove_item(library: &Library, collection: &str, item: &str) -> Fallible<()> {
    let collection = library.resolve_collection(collection)?;
    let item = resolve_item(&collection, item)?;
    library.db.delete_item(&item.id)
}

/// Rename an item. `notes` of `Some("")` clears the notes; `None` keeps them.
pub fn rename_item(
    library: &Library,
    collection: &str,
    item: &str,
    name: &str,
    notes: Option<&str>,
) -> Fallible<()> {
    let name = name.trim();
    if name.is_empty() {
        return fail("name is empty.");
    }
    let collection = library.resolve_collection(collection)?;
    let item = resolve_item(&collection, item)?;
    let notes = notes.map(|notes| {
        let notes = notes.trim();
        if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        }
    });
    let update = ItemUpdate {
        name: Some(name.to_string()),
        notes,
    };
    library.db.update_item(&item.id, &update)
}
