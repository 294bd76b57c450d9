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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::Fallible;
use crate::error::fail;
use crate::media::Photo;
use crate::types::collection::Collection;
use crate::types::ids::CollectionId;
use crate::types::ids::ItemId;
use crate::types::image_hash::ImageHash;
use crate::types::item::Item;
use crate::types::item::Memory;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// A partial update of a collection. `None` fields are left alone.
#[derive(Default, Debug)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub last_studied: Option<Timestamp>,
}

/// A partial update of an item's descriptive fields. `notes: Some(None)`
/// clears the notes.
#[derive(Default, Debug)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
}

impl Database {
    pub fn new(database_path: &Path) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {}", database_path.display());
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Insert a new collection, along with any items it already holds. The
    /// items' images must already be stored.
    pub fn insert_collection(&self, collection: &Collection) -> Fallible<()> {
        log::debug!("Adding collection: {}", collection.id);
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        insert_collection(&tx, collection)?;
        tx.commit()?;
        Ok(())
    }

    /// All collections with their items, oldest first.
    pub fn list_collections(&self) -> Fallible<Vec<Collection>> {
        let conn = self.acquire();
        let mut stmt = conn.prepare(
            "select collection_id, name, icon, created_at, last_studied from collections order by created_at, rowid;",
        )?;
        let mut rows = stmt.query([])?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            collections.push(collection_from_row(row)?);
        }
        for collection in collections.iter_mut() {
            collection.items = load_items(&conn, &collection.id)?;
        }
        Ok(collections)
    }

    pub fn get_collection(&self, id: &CollectionId) -> Fallible<Option<Collection>> {
        let conn = self.acquire();
        let sql = "select collection_id, name, icon, created_at, last_studied from collections where collection_id = ?;";
        let collection = conn.query_row(sql, [id], collection_from_row).optional()?;
        match collection {
            Some(mut collection) => {
                collection.items = load_items(&conn, &collection.id)?;
                Ok(Some(collection))
            }
            None => Ok(None),
        }
    }

    /// The ids of the collections with exactly this name.
    pub fn find_collections_by_name(&self, name: &str) -> Fallible<Vec<CollectionId>> {
        let conn = self.acquire();
        let mut stmt = conn
            .prepare("select collection_id from collections where name = ? order by created_at;")?;
        let mut rows = stmt.query([name])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    pub fn update_collection(&self, id: &CollectionId, update: &CollectionUpdate) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        ensure_collection_exists(&tx, id)?;
        if let Some(name) = &update.name {
            tx.execute(
                "update collections set name = ? where collection_id = ?;",
                (name, id),
            )?;
        }
        if let Some(icon) = &update.icon {
            tx.execute(
                "update collections set icon = ? where collection_id = ?;",
                (icon, id),
            )?;
        }
        if let Some(last_studied) = update.last_studied {
            tx.execute(
                "update collections set last_studied = ? where collection_id = ?;",
                (last_studied, id),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a collection and its items, then drop the photos nothing uses
    /// anymore.
    pub fn delete_collection(&self, id: &CollectionId) -> Fallible<()> {
        log::debug!("Deleting collection: {id}");
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        ensure_collection_exists(&tx, id)?;
        tx.execute("delete from collections where collection_id = ?;", [id])?;
        prune_images(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Append an item to a collection. Its image must already be stored.
    pub fn insert_item(&self, collection_id: &CollectionId, item: &Item) -> Fallible<()> {
        log::debug!("Adding item {} to collection {}", item.id, collection_id);
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        ensure_collection_exists(&tx, collection_id)?;
        let position: i64 = tx.query_row(
            "select coalesce(max(position) + 1, 0) from items where collection_id = ?;",
            [collection_id],
            |row| row.get(0),
        )?;
        insert_item(&tx, collection_id, position, item)?;
        tx.commit()?;
        Ok(())
    }

    pub fn update_item(&self, id: &ItemId, update: &ItemUpdate) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        ensure_item_exists(&tx, id)?;
        if let Some(name) = &update.name {
            tx.execute("update items set name = ? where item_id = ?;", (name, id))?;
        }
        if let Some(notes) = &update.notes {
            tx.execute("update items set notes = ? where item_id = ?;", (notes, id))?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Persist the scheduler's output for an item.
    pub fn update_memory(&self, id: &ItemId, memory: &Memory) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "update items set interval = ?, ease_factor = ?, repetitions = ?, next_review = ?, last_reviewed = ?, correct_count = ?, total_count = ? where item_id = ?;";
        let changed = conn.execute(
            sql,
            (
                memory.interval,
                memory.ease_factor,
                memory.repetitions,
                memory.next_review,
                memory.last_reviewed,
                memory.correct_count,
                memory.total_count,
                id,
            ),
        )?;
        if changed == 0 {
            return fail(format!("no item with id {id}."));
        }
        Ok(())
    }

    pub fn delete_item(&self, id: &ItemId) -> Fallible<()> {
        log::debug!("Deleting item: {id}");
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        ensure_item_exists(&tx, id)?;
        tx.execute("delete from items where item_id = ?;", [id])?;
        prune_images(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Store a photo. Storing the same bytes twice is a no-op.
    pub fn put_image(&self, photo: &Photo) -> Fallible<()> {
        let conn = self.acquire();
        insert_image(&conn, photo)?;
        Ok(())
    }

    pub fn get_image(&self, hash: ImageHash) -> Fallible<Option<Photo>> {
        let conn = self.acquire();
        let sql = "select mime_type, data from images where image_hash = ?;";
        let photo = conn
            .query_row(sql, [hash], |row| {
                let mime_type: String = row.get(0)?;
                let data: Vec<u8> = row.get(1)?;
                Ok(Photo {
                    hash,
                    mime_type,
                    data,
                })
            })
            .optional()?;
        Ok(photo)
    }

    /// Delete the photos no item refers to. Returns how many were deleted.
    pub fn prune_images(&self) -> Fallible<usize> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let count = prune_images(&tx)?;
        tx.commit()?;
        Ok(count)
    }

    /// Replace the entire contents of the database. Either everything is
    /// replaced or nothing is.
    pub fn replace_all(&self, collections: &[Collection], photos: &[Photo]) -> Fallible<()> {
        log::debug!(
            "Replacing all data with {} collections and {} photos.",
            collections.len(),
            photos.len()
        );
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        tx.execute("delete from items;", [])?;
        tx.execute("delete from collections;", [])?;
        tx.execute("delete from images;", [])?;
        for photo in photos {
            insert_image(&tx, photo)?;
        }
        for collection in collections {
            insert_collection(&tx, collection)?;
        }
        prune_images(&tx)?;
        tx.commit()?;
        Ok(())
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

fn insert_collection(tx: &Transaction, collection: &Collection) -> Fallible<()> {
    let sql = "insert into collections (collection_id, name, icon, created_at, last_studied) values (?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            &collection.id,
            &collection.name,
            &collection.icon,
            collection.created_at,
            collection.last_studied,
        ),
    )?;
    for (position, item) in collection.items.iter().enumerate() {
        insert_item(tx, &collection.id, position as i64, item)?;
    }
    Ok(())
}

fn insert_item(
    tx: &Transaction,
    collection_id: &CollectionId,
    position: i64,
    item: &Item,
) -> Fallible<()> {
    let sql = "insert into items (item_id, collection_id, position, name, image_hash, notes, interval, ease_factor, repetitions, next_review, last_reviewed, correct_count, total_count) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
    let memory = &item.memory;
    tx.execute(
        sql,
        rusqlite::params![
            &item.id,
            collection_id,
            position,
            &item.name,
            item.image,
            &item.notes,
            memory.interval,
            memory.ease_factor,
            memory.repetitions,
            memory.next_review,
            memory.last_reviewed,
            memory.correct_count,
            memory.total_count,
        ],
    )?;
    Ok(())
}

fn insert_image(conn: &Connection, photo: &Photo) -> Fallible<()> {
    let sql = "insert into images (image_hash, mime_type, data) values (?, ?, ?) on conflict (image_hash) do nothing;";
    conn.execute(sql, (photo.hash, &photo.mime_type, &photo.data))?;
    Ok(())
}

fn prune_images(tx: &Transaction) -> Fallible<usize> {
    let sql = "delete from images where image_hash not in (select image_hash from items);";
    let count = tx.execute(sql, [])?;
    if count > 0 {
        log::debug!("Pruned {count} unused photos.");
    }
    Ok(count)
}

fn load_items(conn: &Connection, collection_id: &CollectionId) -> Fallible<Vec<Item>> {
    let sql = "select item_id, name, image_hash, notes, interval, ease_factor, repetitions, next_review, last_reviewed, correct_count, total_count from items where collection_id = ? order by position;";
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([collection_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            image: row.get(2)?,
            notes: row.get(3)?,
            memory: Memory {
                interval: row.get(4)?,
                ease_factor: row.get(5)?,
                repetitions: row.get(6)?,
                next_review: row.get(7)?,
                last_reviewed: row.get(8)?,
                correct_count: row.get(9)?,
                total_count: row.get(10)?,
            },
        });
    }
    Ok(items)
}

fn collection_from_row(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        created_at: row.get(3)?,
        last_studied: row.get(4)?,
        items: Vec::new(),
    })
}

fn ensure_collection_exists(tx: &Transaction, id: &CollectionId) -> Fallible<()> {
    let sql = "select count(*) from collections where collection_id = ?;";
    let count: i64 = tx.query_row(sql, [id], |row| row.get(0))?;
    if count == 0 {
        return fail(format!("no collection with id {id}."));
    }
    Ok(())
}

fn ensure_item_exists(tx: &Transaction, id: &ItemId) -> Fallible<()> {
    let sql = "select count(*) from items where item_id = ?;";
    let count: i64 = tx.query_row(sql, [id], |row| row.get(0))?;
    if count == 0 {
        return fail(format!("no item with id {id}."));
    }
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["collections"], |row| row.get(0))?;
    Ok(count > 0)
}
