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

use crate::error::Fallible;
use crate::error::fail;
use crate::library::Library;
use crate::sm2::due_count;
use crate::sm2::mastery_percent;
use crate::types::collection::Collection;
use crate::types::timestamp::Timestamp;

pub fn new_collection(
    library: &Library,
    name: &str,
    icon: Option<&str>,
    now: Timestamp,
) -> Fallible<Collection> {
    if name.trim().is_empty() {
        return fail("collection name is empty.");
    }
    let icon = icon.map(str::trim).filter(|icon| !icon.is_empty());
    let collection = Collection::new(name, icon, now);
    library.db.insert_collection(&collection)?;
    Ok(collection)
}

/// One summary line per collection.
pub fn list_collections(library: &Library, now: Timestamp) -> Fallible<Vec<String>> {
    let collections = library.db.list_collections()?;
    let lines = collections
        .iter()
        .map(|collection| {
            format!(
                "{} {} [{}] {} people, {} due, {}% mastered",
                collection.icon,
                collection.name,
                collection.id,
                collection.items.len(),
                due_count(&collection.items, now),
                mastery_percent(&collection.items)
            )
        })
        .collect();
    Ok(lines)
}

pub fn delete_collection(library: &Library, reference: &str) -> Fallible<()> {
    let collection = library.resolve_collection(reference)?;
    library.db.delete_collection(&collection.id)?;
    log::info!(
        "Deleted '{}' and its {} people.",
        collection.name,
        collection.items.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_directory;

    fn open_tmp() -> Fallible<Library> {
        let dir = create_tmp_directory()?;
        Library::open(Some(dir.display().to_string()))
    }

    #[test]
    fn test_new_collection() -> Fallible<()> {
        let library = open_tmp()?;
        let now = Timestamp::from_millis(1_000);
        let collection = new_collection(&library, " Team ", Some("🦀"), now)?;
        assert_eq!(collection.name, "Team");
        assert_eq!(collection.icon, "🦀");
        let stored = library.db.get_collection(&collection.id)?.unwrap();
        assert_eq!(stored, collection);
        Ok(())
    }

    #[test]
    fn test_new_collection_defaults() -> Fallible<()> {
        let library = open_tmp()?;
        let collection = new_collection(&library, "Team", Some("  "), Timestamp::now())?;
        assert_eq!(collection.icon, "📚");
        assert!(new_collection(&library, "   ", None, Timestamp::now()).is_err());
        Ok(())
    }

    #[test]
    fn test_list_collections() -> Fallible<()> {
        let library = open_tmp()?;
        let now = Timestamp::from_millis(1_000);
        let collection = new_collection(&library, "Team", None, now)?;
        let lines = list_collections(&library, now)?;
        assert_eq!(
            lines,
            vec![format!(
                "📚 Team [{}] 0 people, 0 due, 0% mastered",
                collection.id
            )]
        );
        Ok(())
    }

    #[test]
    fn test_delete_collection() -> Fallible<()> {
        let library = open_tmp()?;
        new_collection(&library, "Team", None, Timestamp::now())?;
        delete_collection(&library, "Team")?;
        assert!(library.db.list_collections()?.is_empty());
        assert!(delete_collection(&library, "Team").is_err());
        Ok(())
    }
}
