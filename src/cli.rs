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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::backup::export_library;
use crate::cmd::backup::restore_library;
use crate::cmd::collection::delete_collection;
use crate::cmd::collection::list_collections;
use crate::cmd::collection::new_collection;
use crate::cmd::drill::server::ServerConfig;
use crate::cmd::drill::server::start_server;
use crate::cmd::item::add_item;
use crate::cmd::item::import_photos;
use crate::cmd::item::remove_item;
use crate::cmd::item::rename_item;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;
use crate::library::Library;
use crate::types::mode::StudyMode;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Create a new collection.
    New {
        /// Name of the collection.
        name: String,
        /// An emoji to show next to the name.
        #[arg(long)]
        icon: Option<String>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the collections.
    List {
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Add a person to a collection.
    Add {
        /// Collection id or name.
        collection: String,
        /// The person's name.
        name: String,
        /// Path to their photo.
        photo: PathBuf,
        /// Free-form notes, in Markdown.
        #[arg(long)]
        notes: Option<String>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Add one person per photo in a directory, named after the file.
    ImportPhotos {
        /// Collection id or name.
        collection: String,
        /// Directory to search for photos, recursively.
        photos: PathBuf,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Remove a person from a collection.
    Remove {
        /// Collection id or name.
        collection: String,
        /// Item id or name.
        item: String,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Change a person's name, and optionally their notes.
    Rename {
        /// Collection id or name.
        collection: String,
        /// Item id or name.
        item: String,
        /// The new name.
        name: String,
        /// New notes. An empty string clears them.
        #[arg(long)]
        notes: Option<String>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Delete a collection and everyone in it.
    Delete {
        /// Collection id or name.
        collection: String,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print statistics as JSON.
    Stats {
        /// Only this collection.
        collection: Option<String>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Export every collection as a JSON backup.
    Export {
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Replace everything with the contents of a JSON backup.
    Restore {
        /// Path to the backup file.
        file: PathBuf,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Drill a collection in the browser.
    Drill {
        /// Collection id or name.
        collection: String,
        /// How to drill.
        #[arg(long, value_enum, default_value_t = StudyMode::Flash)]
        mode: StudyMode,
        /// The port to use for the web server. Overrides the config file.
        #[arg(long)]
        port: Option<u16>,
        /// Whether to open the browser automatically. Overrides the config file.
        #[arg(long)]
        open_browser: Option<bool>,
        /// Path to the data directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::New {
            name,
            icon,
            directory,
        } => {
            let library = Library::open(directory)?;
            let collection = new_collection(&library, &name, icon.as_deref(), Timestamp::now())?;
            println!("{}", collection.id);
            Ok(())
        }
        Command::List { directory } => {
            let library = Library::open(directory)?;
            for line in list_collections(&library, Timestamp::now())? {
                println!("{line}");
            }
            Ok(())
        }
        Command::Add {
            collection,
            name,
            photo,
            notes,
            directory,
        } => {
            let library = Library::open(directory)?;
            let item = add_item(
                &library,
                &collection,
                &name,
                &photo,
                notes.as_deref(),
                Timestamp::now(),
            )?;
            println!("{}", item.id);
            Ok(())
        }
        Command::ImportPhotos {
            collection,
            photos,
            directory,
        } => {
            let library = Library::open(directory)?;
            let added = import_photos(&library, &collection, &photos, Timestamp::now())?;
            println!("Imported {added} photos.");
            Ok(())
        }
        Command::Remove {
            collection,
            item,
            directory,
        } => {
            let library = Library::open(directory)?;
            remove_item(&library, &collection, &item)
        }
        Command::Rename {
            collection,
            item,
            name,
            notes,
            directory,
        } => {
            let library = Library::open(directory)?;
            rename_item(&library, &collection, &item, &name, notes.as_deref())
        }
        Command::Delete {
            collection,
            directory,
        } => {
            let library = Library::open(directory)?;
            delete_collection(&library, &collection)
        }
        Command::Stats {
            collection,
            directory,
        } => {
            let library = Library::open(directory)?;
            print_stats(&library, collection.as_deref(), Timestamp::now())
        }
        Command::Export { output, directory } => {
            let library = Library::open(directory)?;
            export_library(&library, output)
        }
        Command::Restore { file, directory } => {
            let library = Library::open(directory)?;
            restore_library(&library, &file)
        }
        Command::Drill {
            collection,
            mode,
            port,
            open_browser,
            directory,
        } => {
            let library = Library::open(directory)?;
            let config = ServerConfig {
                collection,
                mode,
                port: port.unwrap_or(library.config.server.port),
                open_browser: open_browser.unwrap_or(library.config.server.open_browser),
                session_started_at: Timestamp::now(),
            };
            start_server(library, config).await
        }
    }
}
