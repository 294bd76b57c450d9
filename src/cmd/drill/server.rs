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
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::interval;
use tokio::time::sleep;

use crate::cmd::drill::get::get_handler;
use crate::cmd::drill::image::image_handler;
use crate::cmd::drill::post::post_handler;
use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::ServerState;
use crate::db::CollectionUpdate;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::library::Library;
use crate::queue::QueueOptions;
use crate::queue::build_plan;
use crate::session::Pacing;
use crate::session::Session;
use crate::session::Timer;
use crate::sm2::mastery_percent;
use crate::types::item::Item;
use crate::types::mode::StudyMode;
use crate::types::timestamp::Timestamp;

pub struct ServerConfig {
    /// Collection id or name.
    pub collection: String,
    pub mode: StudyMode,
    pub port: u16,
    pub open_browser: bool,
    pub session_started_at: Timestamp,
}

pub async fn start_server(library: Library, config: ServerConfig) -> Fallible<()> {
    let collection = library.resolve_collection(&config.collection)?;
    let queue_options = library.config.queue_options();
    let pacing = library.config.pacing();
    let session = build_session(
        collection.items,
        config.mode,
        queue_options,
        pacing,
        config.session_started_at,
    )?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = ServerState {
        collection_id: collection.id,
        collection_name: collection.name,
        queue_options,
        pacing,
        db: library.db,
        mutable: Arc::new(Mutex::new(MutableState {
            session,
            generation: 0,
            last_guess: None,
            mastery: None,
        })),
        shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
    };
    if config.mode == StudyMode::Speed {
        spawn_countdown(state.clone(), 0);
    }

    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/image/{hash}", get(image_handler));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{}", config.port);

    // Start a separate task to open the browser.
    if config.open_browser {
        let bind = bind.clone();
        let url = format!("http://{bind}/");
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&bind).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    // Start the server.
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;
    log::debug!("Server stopped.");
    Ok(())
}

fn build_session(
    items: Vec<Item>,
    mode: StudyMode,
    queue_options: QueueOptions,
    pacing: Pacing,
    now: Timestamp,
) -> Fallible<Session> {
    let plan = {
        let mut rng = rand::rng();
        build_plan(&items, mode, now, queue_options, &mut rng)?
    };
    log::debug!("Starting {mode} session with {} items.", plan.queue.len());
    Session::new(items, plan, mode, pacing, now)
}

/// A fresh session over the collection as it is stored now.
pub fn new_session(state: &ServerState, mode: StudyMode, now: Timestamp) -> Fallible<Session> {
    let collection = state
        .db
        .get_collection(&state.collection_id)?
        .ok_or_else(|| ErrorReport::new("the collection no longer exists."))?;
    build_session(collection.items, mode, state.queue_options, state.pacing, now)
}

/// Fire `timer` once its delay has passed, unless the session it was armed
/// for has been replaced.
pub fn arm_timer(state: ServerState, generation: u64, timer: Timer) {
    tokio::spawn(async move {
        sleep(Duration::from_millis(timer.delay_ms)).await;
        let mut mutable = state.mutable.lock().unwrap();
        if mutable.generation != generation {
            return;
        }
        if mutable.session.fire(timer.token, Timestamp::now()) {
            if let Err(e) = finish_if_complete(&state, &mut mutable) {
                log::error!("error: {e}");
            }
        }
    });
}

/// Run the speed countdown at one tick per second until the session ends.
pub fn spawn_countdown(state: ServerState, generation: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut mutable = state.mutable.lock().unwrap();
            if mutable.generation != generation {
                break;
            }
            if !mutable.session.tick(Timestamp::now()) {
                if let Err(e) = finish_if_complete(&state, &mut mutable) {
                    log::error!("error: {e}");
                }
                break;
            }
        }
    });
}

/// Once the session is complete, record when the collection was studied and
/// compute its mastery for the results page. Does nothing the second time.
pub fn finish_if_complete(state: &ServerState, mutable: &mut MutableState) -> Fallible<()> {
    if mutable.mastery.is_some() {
        return Ok(());
    }
    let outcome = match mutable.session.outcome() {
        Some(outcome) => outcome.clone(),
        None => return Ok(()),
    };
    let update = CollectionUpdate {
        last_studied: Some(Timestamp::now()),
        ..Default::default()
    };
    state.db.update_collection(&state.collection_id, &update)?;
    let collection = state
        .db
        .get_collection(&state.collection_id)?
        .ok_or_else(|| ErrorReport::new("the collection no longer exists."))?;
    let mastery = mastery_percent(&collection.items);
    log::info!(
        "Session completed: {}/{} correct in {}s, mastery {}%.",
        outcome.correct,
        outcome.total,
        outcome.elapsed_secs(),
        mastery
    );
    mutable.mastery = Some(mastery);
    Ok(())
}

async fn script() -> (StatusCode, [(HeaderName, &'static str); 1], &'static [u8]) {
    let bytes = include_bytes!("script.js");
    (StatusCode::OK, [(CONTENT_TYPE, "text/javascript")], bytes)
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
