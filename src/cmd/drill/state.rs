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

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::db::Database;
use crate::queue::QueueOptions;
use crate::session::Pacing;
use crate::session::Session;
use crate::types::ids::CollectionId;

#[derive(Clone)]
pub struct ServerState {
    pub collection_id: CollectionId,
    pub collection_name: String,
    pub queue_options: QueueOptions,
    pub pacing: Pacing,
    pub db: Database,
    pub mutable: Arc<Mutex<MutableState>>,
    pub shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

pub struct MutableState {
    pub session: Session,
    /// Bumped whenever the session is replaced, so timers armed for an
    /// earlier session can tell they are stale.
    pub generation: u64,
    /// The last speed-mode guess, shown next to the feedback.
    pub last_guess: Option<String>,
    /// Collection mastery once the completed session has been recorded.
    pub mastery: Option<u32>,
}
