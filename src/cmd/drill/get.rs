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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::PageTimers;
use crate::cmd::drill::template::page_template;
use crate::markdown::notes_to_html_inline;
use crate::session::Phase;
use crate::session::Session;
use crate::types::item::Item;
use crate::types::mode::StudyMode;
use crate::types::outcome::SessionOutcome;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let mutable = state.mutable.lock().unwrap();
    let (timers, body) = render(&state, &mutable);
    let html = page_template(timers, body);
    (StatusCode::OK, Html(html.into_string()))
}

fn render(state: &ServerState, mutable: &MutableState) -> (PageTimers, Markup) {
    let session = &mutable.session;
    match session.phase() {
        Phase::Complete(outcome) => (
            PageTimers::default(),
            render_results(state, outcome, mutable.mastery),
        ),
        Phase::Quit => (PageTimers::default(), render_quit(state)),
        Phase::Presenting { revealed, .. } => {
            let timers = PageTimers {
                reload_ms: None,
                countdown_secs: countdown(session),
            };
            let content = match session.current_item() {
                Some(item) => render_question(session, item, *revealed),
                None => html! {},
            };
            (timers, render_card(state, session, content))
        }
        Phase::Feedback {
            selected, correct, ..
        } => {
            let timers = PageTimers {
                reload_ms: Some(feedback_delay(session, *correct)),
                countdown_secs: countdown(session),
            };
            let content = match session.current_item() {
                Some(item) => render_feedback(
                    session,
                    item,
                    selected.as_ref().map(|id| id.as_str()),
                    *correct,
                    mutable.last_guess.as_deref(),
                ),
                None => html! {},
            };
            (timers, render_card(state, session, content))
        }
    }
}

fn countdown(session: &Session) -> Option<u32> {
    if session.mode() == StudyMode::Speed {
        Some(session.remaining_secs())
    } else {
        None
    }
}

fn feedback_delay(session: &Session, correct: bool) -> u64 {
    let pacing = session.pacing();
    match (session.mode(), correct) {
        (StudyMode::Speed, true) => pacing.speed_correct_ms,
        (StudyMode::Speed, false) => pacing.speed_wrong_ms,
        (_, true) => pacing.choice_correct_ms,
        (_, false) => pacing.choice_wrong_ms,
    }
}

fn render_card(state: &ServerState, session: &Session, content: Markup) -> Markup {
    let progress = if session.mode() == StudyMode::Speed {
        let (correct, total) = session.score();
        html! {
            span.timer { (session.remaining_secs()) "s" }
            span.score { (correct) " / " (total) }
        }
    } else {
        let index = session.current_index().unwrap_or(0);
        html! {
            (index + 1) " / " (session.queue_len())
        }
    };
    html! {
        div.root {
            div.card {
                div.header {
                    form action="/" method="post" {
                        button #quit .quit type="submit" name="action" value="Quit" title="Quit" {
                            "✕"
                        }
                    }
                    h1 {
                        (state.collection_name)
                    }
                    div.mode {
                        (session.mode().label())
                    }
                    div.progress {
                        (progress)
                    }
                }
                (content)
            }
        }
    }
}

fn photo(item: &Item) -> Markup {
    html! {
        img.photo src=(format!("/image/{}", item.image)) alt="Who is this?";
    }
}

fn notes(item: &Item) -> Markup {
    html! {
        @if let Some(notes) = &item.notes {
            div.notes .rich-text {
                (PreEscaped(notes_to_html_inline(notes)))
            }
        }
    }
}

fn render_question(session: &Session, item: &Item, revealed: bool) -> Markup {
    match session.mode() {
        StudyMode::Flash => {
            if revealed {
                html! {
                    div.content {
                        (photo(item))
                        div.name { (item.name) }
                        (notes(item))
                    }
                    div.controls {
                        form action="/" method="post" {
                            button #again type="submit" name="action" value="Again" { "Again" }
                            button #got-it type="submit" name="action" value="GotIt" { "Got It" }
                        }
                    }
                }
            } else {
                html! {
                    div.content {
                        (photo(item))
                        div.prompt { "Who is this?" }
                    }
                    div.controls {
                        form action="/" method="post" {
                            button #reveal type="submit" name="action" value="Reveal" { "Show Name" }
                        }
                    }
                }
            }
        }
        StudyMode::Choice | StudyMode::Reverse => {
            render_choices(session, item, None, false)
        }
        StudyMode::Speed => html! {
            div.content {
                (photo(item))
            }
            div.controls {
                form action="/" method="post" {
                    input type="hidden" name="action" value="Guess";
                    input #guess type="text" name="guess" placeholder="Type the name..."
                        autocomplete="off" autofocus;
                }
            }
        },
    }
}

fn render_feedback(
    session: &Session,
    item: &Item,
    selected: Option<&str>,
    correct: bool,
    last_guess: Option<&str>,
) -> Markup {
    let next = html! {
        noscript {
            form action="/" method="post" {
                button #advance type="submit" name="action" value="Advance" { "Next" }
            }
        }
    };
    match session.mode() {
        StudyMode::Speed => {
            let verdict = if correct { "correct" } else { "wrong" };
            html! {
                div.content {
                    div class=(format!("photo-frame {verdict}")) {
                        (photo(item))
                    }
                    @if !correct {
                        div.name .wrong { (item.name) }
                        @if let Some(guess) = last_guess {
                            div.guess { "You typed: " (guess) }
                        }
                    }
                }
                div.controls { (next) }
            }
        }
        _ => html! {
            (render_choices(session, item, selected, true))
            div.controls { (next) }
        },
    }
}

/// The options of a choice question. Once answered, the right option and
/// the wrong pick are marked and the buttons disabled.
fn render_choices(
    session: &Session,
    item: &Item,
    selected: Option<&str>,
    answered: bool,
) -> Markup {
    let choices = session.current_choices().unwrap_or_default();
    let reverse = session.mode() == StudyMode::Reverse;
    let class_of = |choice: &Item| -> &'static str {
        if !answered {
            "choice"
        } else if choice.id == item.id {
            "choice correct"
        } else if Some(choice.id.as_str()) == selected {
            "choice wrong"
        } else {
            "choice"
        }
    };
    html! {
        div.content {
            @if reverse {
                div.name { (item.name) }
                div.prompt { "Which face?" }
            } @else {
                (photo(item))
                div.prompt { "Who is this?" }
            }
        }
        form.choices .faces[reverse] action="/" method="post" {
            input type="hidden" name="action" value="Choose";
            @for choice in choices.iter().copied() {
                button class=(class_of(choice)) type="submit" name="choice" value=(choice.id.as_str()) disabled[answered] {
                    @if reverse {
                        img src=(format!("/image/{}", choice.image)) alt="option";
                    } @else {
                        (choice.name)
                    }
                }
            }
        }
    }
}

fn render_results(state: &ServerState, outcome: &SessionOutcome, mastery: Option<u32>) -> Markup {
    let emoji = match outcome.accuracy() {
        90.. => "🏆",
        70..=89 => "👏",
        50..=69 => "💪",
        _ => "📚",
    };
    html! {
        div.finished {
            div.emoji { (emoji) }
            h1 { "Session Completed" }
            p.verdict { (outcome.verdict()) }
            div.summary {
                div.stat {
                    div.value { (outcome.accuracy()) "%" }
                    div.label { "Accuracy" }
                }
                div.stat {
                    div.value { (outcome.correct) "/" (outcome.total) }
                    div.label { "Correct" }
                }
                div.stat {
                    div.value { (outcome.elapsed_secs()) "s" }
                    div.label { "Time" }
                }
            }
            @if let Some(mastery) = mastery {
                div.mastery {
                    span { (state.collection_name) " mastery" }
                    span.value { (mastery) "%" }
                    progress max="100" value=(mastery) {}
                }
            }
            (end_controls())
        }
    }
}

fn render_quit(state: &ServerState) -> Markup {
    html! {
        div.finished {
            h1 { "Session Ended" }
            p { "Answers given so far in " (state.collection_name) " were saved." }
            (end_controls())
        }
    }
}

fn end_controls() -> Markup {
    html! {
        div.controls {
            form action="/" method="post" {
                button #study-again type="submit" name="action" value="StudyAgain" { "Study Again" }
                button #shutdown type="submit" name="action" value="Shutdown" { "Done" }
            }
        }
    }
}
