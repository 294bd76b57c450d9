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

use std::env::current_dir;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::collection::Collection;
use crate::types::ids::CollectionId;
use crate::types::item::Item;

pub const DATABASE_FILE_NAME: &str = "namedrill.db";

/// An opened data directory: the database and the config file next to it.
pub struct Library {
    pub directory: PathBuf,
    pub db: Database,
    pub config: Config,
}

impl Library {
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db = {
            let start = Instant::now();
            let db = Database::new(&directory.join(DATABASE_FILE_NAME))?;
            let duration = start.elapsed().as_millis();
            log::debug!("Database opened in {duration}ms.");
            db
        };

        Ok(Self {
            directory,
            db,
            config,
        })
    }

    /// Find a collection by id, or else by exact name. A name shared by
    /// several collections is an error.
    pub fn resolve_collection(&self, reference: &str) -> Fallible<Collection> {
        if let Ok(id) = CollectionId::parse(reference) {
            if let Some(collection) = self.db.get_collection(&id)? {
                return Ok(collection);
            }
        }
        let ids = self.db.find_collections_by_name(reference)?;
        match ids.as_slice() {
            [] => fail(format!("no collection named '{reference}'.")),
            [id] => match self.db.get_collection(id)? {
                Some(collection) => Ok(collection),
                None => fail(format!("no collection named '{reference}'.")),
            },
            _ => fail(format!(
                "{} collections are named '{reference}', use an id instead.",
                ids.len()
            )),
        }
    }
}

/// Find an item in a collection by id, or else by exact name.
pub fn resolve_item<'a>(collection: &'a Collection, reference: &str) -> Fallible<&'a Item> {
    if let Some(item) = collection
        .items
        .iter()
        .find(|item| item.id.as_str() == reference)
    {
        return Ok(item);
    }
    let matches: Vec<&Item> = collection
        .items
        .iter()
        .filter(|item| item.name == reference)
        .collect();
    match matches.as_slice() {
        [] => fail(format!(
            "no item named '{reference}' in '{}'.",
            collection.name
        )),
        [item] => Ok(item),
        _ => fail(format!(
            "{} items in '{}' are named '{reference}', use an id instead.",
            matches.len(),
            collection.name
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_directory;
    use crate::types::image_hash::ImageHash;
    use crate::types::timestamp::Timestamp;

    fn open_tmp() -> Fallible<Library> {
        let dir = create_tmp_directory()?;
        Library::open(Some(dir.display().to_string()))
    }

    #[test]
    fn test_open_non_existent_directory() {
        let result = Library::open(Some("./derpherp".to_string()));
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert_eq!(err.to_string(), "error: directory does not exist.");
    }

    #[test]
    fn test_open_creates_database() -> Fallible<()> {
        let library = open_tmp()?;
        assert!(library.directory.join(DATABASE_FILE_NAME).exists());
        assert!(library.db.list_collections()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_resolve_collection() -> Fallible<()> {
        let library = open_tmp()?;
        let team = Collection::new("Team", None, Timestamp::from_millis(0));
        library.db.insert_collection(&team)?;
        assert_eq!(library.resolve_collection("Team")?.id, team.id);
        assert_eq!(library.resolve_collection(team.id.as_str())?.id, team.id);
        assert!(library.resolve_collection("Club").is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_ambiguous_collection() -> Fallible<()> {
        let library = open_tmp()?;
        let a = Collection::new("Team", None, Timestamp::from_millis(0));
        let b = Collection::new("Team", None, Timestamp::from_millis(1));
        library.db.insert_collection(&a)?;
        library.db.insert_collection(&b)?;
        assert!(library.resolve_collection("Team").is_err());
        assert_eq!(library.resolve_collection(b.id.as_str())?.id, b.id);
        Ok(())
    }

    #[test]
    fn test_resolve_item() -> Fallible<()> {
        let now = Timestamp::from_millis(0);
        let mut team = Collection::new("Team", None, now);
        let ada = Item::new("Ada", ImageHash::hash_bytes(b"a"), None, now);
        let twin1 = Item::new("Max", ImageHash::hash_bytes(b"b"), None, now);
        let twin2 = Item::new("Max", ImageHash::hash_bytes(b"c"), None, now);
        team.items = vec![ada.clone(), twin1, twin2.clone()];
        assert_eq!(resolve_item(&team, "Ada")?.id, ada.id);
        assert_eq!(resolve_item(&team, twin2.id.as_str())?.id, twin2.id);
        assert!(resolve_item(&team, "Max").is_err());
        assert!(resolve_item(&team, "ada").is_err());
        Ok(())
    }
}
