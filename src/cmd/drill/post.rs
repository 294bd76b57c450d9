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

use axum::Form;
use axum::extract::State;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::html;
use serde::Deserialize;

use crate::cmd::drill::server::arm_timer;
use crate::cmd::drill::server::finish_if_complete;
use crate::cmd::drill::server::new_session;
use crate::cmd::drill::server::spawn_countdown;
use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::PageTimers;
use crate::cmd::drill::template::page_template;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::session::Answer;
use crate::types::ids::ItemId;
use crate::types::mode::StudyMode;
use crate::types::timestamp::Timestamp;

#[derive(Debug, Deserialize)]
enum Action {
    Reveal,
    Again,
    GotIt,
    Choose,
    Guess,
    Advance,
    Quit,
    StudyAgain,
    Shutdown,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    choice: Option<String>,
    guess: Option<String>,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Response {
    if let Action::Shutdown = form.action {
        shutdown(&state);
        let body = html! {
            div.finished {
                h1 { "Goodbye" }
                p { "You can close this tab." }
            }
        };
        let page = page_template(PageTimers::default(), body);
        return Html(page.into_string()).into_response();
    }
    match action_handler(&state, form) {
        Ok(_) => {}
        Err(e) => {
            log::error!("error: {e}");
        }
    }
    Redirect::to("/").into_response()
}

fn action_handler(state: &ServerState, form: FormData) -> Fallible<()> {
    let mut mutable = state.mutable.lock().unwrap();
    let now = Timestamp::now();
    match form.action {
        Action::Reveal => {
            mutable.session.reveal()?;
        }
        Action::Again | Action::GotIt => {
            let correct = matches!(form.action, Action::GotIt);
            let answer = mutable.session.grade(correct, now)?;
            persist(state, &mutable, &answer)?;
        }
        Action::Choose => {
            let choice = form
                .choice
                .ok_or_else(|| ErrorReport::new("no option was chosen."))?;
            let choice = ItemId::parse(&choice)?;
            let answer = mutable.session.choose(&choice, now)?;
            persist(state, &mutable, &answer)?;
        }
        Action::Guess => {
            let guess = form.guess.unwrap_or_default();
            let answer = mutable.session.guess(&guess, now)?;
            mutable.last_guess = Some(guess);
            persist(state, &mutable, &answer)?;
        }
        Action::Advance => {
            // Without JavaScript the page cannot wait for the timer.
            if let Some(token) = mutable.session.pending() {
                mutable.session.fire(token, now);
            }
        }
        Action::Quit => {
            mutable.session.quit();
        }
        Action::StudyAgain => {
            if mutable.session.is_active() {
                return Ok(());
            }
            let mode = mutable.session.mode();
            let session = new_session(state, mode, now)?;
            mutable.session = session;
            mutable.generation += 1;
            mutable.last_guess = None;
            mutable.mastery = None;
            if mode == StudyMode::Speed {
                spawn_countdown(state.clone(), mutable.generation);
            }
        }
        Action::Shutdown => {}
    }
    finish_if_complete(state, &mut mutable)?;
    Ok(())
}

/// Arm the feedback timer, if any, and save the item's new memory. The timer
/// goes first so the session moves on even when the save fails.
fn persist(state: &ServerState, mutable: &MutableState, answer: &Answer) -> Fallible<()> {
    if let Some(timer) = answer.timer {
        arm_timer(state.clone(), mutable.generation, timer);
    }
    state.db.update_memory(&answer.item_id, &answer.memory)?;
    Ok(())
}

fn shutdown(state: &ServerState) {
    log::debug!("Shutting down");
    {
        let mut mutable = state.mutable.lock().unwrap();
        mutable.session.quit();
    }
    if let Some(tx) = state.shutdown_tx.lock().unwrap().take() {
        let _ = tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    use super::*;
    use crate::db::Database;
    use crate::helper::create_tmp_directory;
    use crate::queue::QueueOptions;
    use crate::queue::build_plan;
    use crate::session::Pacing;
    use crate::session::Session;
    use crate::types::ids::CollectionId;
    use crate::types::image_hash::ImageHash;
    use crate::types::item::Item;

    #[test]
    fn test_action_names() -> Fallible<()> {
        let action: Action = serde_json::from_str("\"GotIt\"")?;
        assert!(matches!(action, Action::GotIt));
        let action: Action = serde_json::from_str("\"StudyAgain\"")?;
        assert!(matches!(action, Action::StudyAgain));
        assert!(serde_json::from_str::<Action>("\"Undo\"").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_feedback_advances_when_save_fails() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let db = Database::new(&dir.join("db.sqlite3"))?;
        let now = Timestamp::now();
        // The items are never stored, so saving an answer fails.
        let items: Vec<Item> = ["Ada", "Grace", "Alan", "Edsger"]
            .iter()
            .map(|name| Item::new(name, ImageHash::hash_bytes(name.as_bytes()), None, now))
            .collect();
        let options = QueueOptions::default();
        let mut rng = StdRng::seed_from_u64(0);
        let plan = build_plan(&items, StudyMode::Choice, now, options, &mut rng)?;
        let pacing = Pacing {
            choice_correct_ms: 10,
            choice_wrong_ms: 10,
            ..Default::default()
        };
        let session = Session::new(items, plan, StudyMode::Choice, pacing, now)?;
        let correct = session.current_item().map(|item| item.id.to_string());
        let (shutdown_tx, _shutdown_rx) = oneshot::channel();
        let state = ServerState {
            collection_id: CollectionId::generate(),
            collection_name: "Friends".to_string(),
            queue_options: options,
            pacing,
            db,
            mutable: Arc::new(Mutex::new(MutableState {
                session,
                generation: 0,
                last_guess: None,
                mastery: None,
            })),
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
        };

        let form = FormData {
            action: Action::Choose,
            choice: correct,
            guess: None,
        };
        assert!(action_handler(&state, form).is_err());
        sleep(Duration::from_millis(200)).await;
        let mutable = state.mutable.lock().unwrap();
        assert_eq!(mutable.session.current_index(), Some(1));
        Ok(())
    }
}
