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

//! The state machine of a drill session.
//!
//! A session moves through `Presenting(i) -> Feedback(i) -> Presenting(i+1)`
//! until it is complete or quit. The machine never reads the clock and never
//! sleeps: every transition takes the current time, and timed transitions are
//! handed back to the caller as a [`Timer`] to arm. When the timer goes off
//! the caller calls [`Session::fire`] with its token. Only the most recently
//! armed token is honoured, and quitting or completing a session forgets it,
//! so a late timer can never move a session that has already ended.

use std::collections::HashMap;

use crate::error::Fallible;
use crate::error::fail;
use crate::matching::is_correct_guess;
use crate::queue::SessionPlan;
use crate::sm2;
use crate::types::ids::ItemId;
use crate::types::item::Item;
use crate::types::item::Memory;
use crate::types::mode::StudyMode;
use crate::types::outcome::SessionOutcome;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// How long feedback stays on screen, and how long a speed round lasts.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pacing {
    pub choice_correct_ms: u64,
    pub choice_wrong_ms: u64,
    pub speed_correct_ms: u64,
    pub speed_wrong_ms: u64,
    pub speed_duration_secs: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            choice_correct_ms: 500,
            choice_wrong_ms: 1500,
            speed_correct_ms: 300,
            speed_wrong_ms: 800,
            speed_duration_secs: 60,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimerToken(u64);

/// A delayed transition the caller must schedule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timer {
    pub token: TimerToken,
    pub delay_ms: u64,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Phase {
    /// Waiting for an answer to the item at `index`. Only flash sessions
    /// use `revealed`.
    Presenting {
        index: usize,
        revealed: bool,
    },
    /// Showing whether the answer to the item at `index` was right.
    Feedback {
        index: usize,
        selected: Option<ItemId>,
        correct: bool,
    },
    Complete(SessionOutcome),
    Quit,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Attempt {
    pub item_id: ItemId,
    pub correct: bool,
    pub time_ms: u64,
}

/// What an answer produced.
#[derive(Clone, PartialEq, Debug)]
pub struct Answer {
    pub item_id: ItemId,
    pub correct: bool,
    /// The item's new memory, for the caller to persist.
    pub memory: Memory,
    /// The delayed advance to arm, if the mode pauses on feedback.
    pub timer: Option<Timer>,
}

pub struct Session {
    mode: StudyMode,
    plan: SessionPlan,
    pacing: Pacing,
    /// The session's own copy of the collection, updated after each answer.
    items: HashMap<ItemId, Item>,
    phase: Phase,
    attempts: Vec<Attempt>,
    started_at: Timestamp,
    presented_at: Timestamp,
    remaining_secs: u32,
    last_token: u64,
    pending: Option<TimerToken>,
}

impl Session {
    pub fn new(
        items: Vec<Item>,
        plan: SessionPlan,
        mode: StudyMode,
        pacing: Pacing,
        now: Timestamp,
    ) -> Fallible<Self> {
        if plan.queue.is_empty() {
            return fail("cannot start a session with an empty queue.");
        }
        let items: HashMap<ItemId, Item> = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let mut referenced = plan.queue.iter().chain(plan.choices.iter().flatten());
        if let Some(missing) = referenced.find(|id| !items.contains_key(*id)) {
            return fail(format!("session plan refers to unknown item {missing}."));
        }
        if mode.has_choices() && plan.choices.len() != plan.queue.len() {
            return fail("session plan is missing choices.");
        }
        Ok(Self {
            mode,
            plan,
            pacing,
            items,
            phase: Phase::Presenting {
                index: 0,
                revealed: false,
            },
            attempts: Vec::new(),
            started_at: now,
            presented_at: now,
            remaining_secs: pacing.speed_duration_secs,
            last_token: 0,
            pending: None,
        })
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn queue_len(&self) -> usize {
        self.plan.queue.len()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// The token of the armed timer, if feedback is waiting to advance.
    pub fn pending(&self) -> Option<TimerToken> {
        self.pending
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            Phase::Presenting { .. } | Phase::Feedback { .. }
        )
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        match &self.phase {
            Phase::Complete(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn score(&self) -> (usize, usize) {
        let correct = self.attempts.iter().filter(|a| a.correct).count();
        (correct, self.attempts.len())
    }

    /// The current position in the queue. Speed sessions count past the end
    /// of the queue as it cycles.
    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            Phase::Presenting { index, .. } | Phase::Feedback { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn current_item(&self) -> Option<&Item> {
        let index = self.current_index()?;
        let id = &self.plan.queue[index % self.plan.queue.len()];
        self.items.get(id)
    }

    /// The options offered for the current item, in display order. `None`
    /// outside choice modes.
    pub fn current_choices(&self) -> Option<Vec<&Item>> {
        if !self.mode.has_choices() {
            return None;
        }
        let index = self.current_index()?;
        let choices = self.plan.choices.get(index)?;
        let offered = choices.iter().filter_map(|id| self.items.get(id));
        Some(offered.collect())
    }

    /// Show the name of the current flash item.
    pub fn reveal(&mut self) -> Fallible<()> {
        self.expect_mode(&[StudyMode::Flash])?;
        match &mut self.phase {
            Phase::Presenting { revealed, .. } => {
                if *revealed {
                    return fail("Revealing an item that is already revealed.");
                }
                *revealed = true;
                Ok(())
            }
            _ => fail("No item to reveal."),
        }
    }

    /// Self-grade the current flash item. Advances immediately.
    pub fn grade(&mut self, correct: bool, now: Timestamp) -> Fallible<Answer> {
        self.expect_mode(&[StudyMode::Flash])?;
        let index = match self.phase {
            Phase::Presenting {
                index,
                revealed: true,
            } => index,
            Phase::Presenting {
                revealed: false, ..
            } => return fail("Answering an item that is not revealed."),
            _ => return fail("Not waiting for an answer."),
        };
        let item_id = self.plan.queue[index].clone();
        let memory = self.record(&item_id, correct, now)?;
        self.phase = Phase::Feedback {
            index,
            selected: None,
            correct,
        };
        self.advance(now);
        Ok(Answer {
            item_id,
            correct,
            memory,
            timer: None,
        })
    }

    /// Pick one of the offered options in a choice session.
    pub fn choose(&mut self, selected: &ItemId, now: Timestamp) -> Fallible<Answer> {
        self.expect_mode(&[StudyMode::Choice, StudyMode::Reverse])?;
        let index = self.presenting_index()?;
        if !self.plan.choices[index].contains(selected) {
            return fail(format!("{selected} is not one of the options."));
        }
        let item_id = self.plan.queue[index].clone();
        let correct = *selected == item_id;
        let memory = self.record(&item_id, correct, now)?;
        self.phase = Phase::Feedback {
            index,
            selected: Some(selected.clone()),
            correct,
        };
        let delay_ms = if correct {
            self.pacing.choice_correct_ms
        } else {
            self.pacing.choice_wrong_ms
        };
        let timer = self.arm(delay_ms);
        Ok(Answer {
            item_id,
            correct,
            memory,
            timer: Some(timer),
        })
    }

    /// Submit a typed name in a speed session.
    pub fn guess(&mut self, text: &str, now: Timestamp) -> Fallible<Answer> {
        self.expect_mode(&[StudyMode::Speed])?;
        let index = self.presenting_index()?;
        let item_id = self.plan.queue[index % self.plan.queue.len()].clone();
        let correct = match self.items.get(&item_id) {
            Some(item) => is_correct_guess(text, &item.name),
            None => false,
        };
        let memory = self.record(&item_id, correct, now)?;
        self.phase = Phase::Feedback {
            index,
            selected: None,
            correct,
        };
        let delay_ms = if correct {
            self.pacing.speed_correct_ms
        } else {
            self.pacing.speed_wrong_ms
        };
        let timer = self.arm(delay_ms);
        Ok(Answer {
            item_id,
            correct,
            memory,
            timer: Some(timer),
        })
    }

    /// Apply an armed timer. Returns whether it moved the session; stale or
    /// superseded tokens do nothing.
    pub fn fire(&mut self, token: TimerToken, now: Timestamp) -> bool {
        if !self.is_active() || self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        self.advance(now);
        true
    }

    /// One second of the speed countdown. Completes the session when it runs
    /// out, whatever the current item is doing. Returns whether the session is
    /// still running.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        if self.mode != StudyMode::Speed || !self.is_active() {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.complete(now);
            return false;
        }
        true
    }

    /// Abandon the session. Answers already given stay recorded, but there
    /// is no outcome.
    pub fn quit(&mut self) {
        if self.is_active() {
            log::debug!("Session quit");
            self.phase = Phase::Quit;
            self.pending = None;
        }
    }

    fn expect_mode(&self, modes: &[StudyMode]) -> Fallible<()> {
        if modes.contains(&self.mode) {
            Ok(())
        } else {
            fail(format!("Action not available in {} mode.", self.mode))
        }
    }

    fn presenting_index(&self) -> Fallible<usize> {
        match self.phase {
            Phase::Presenting { index, .. } => Ok(index),
            _ => fail("Not waiting for an answer."),
        }
    }

    fn record(&mut self, item_id: &ItemId, correct: bool, now: Timestamp) -> Fallible<Memory> {
        let item = match self.items.get_mut(item_id) {
            Some(item) => item,
            None => return fail(format!("unknown item {item_id}.")),
        };
        let quality = Quality::from_correct(correct);
        let memory = sm2::update(&item.memory, quality, now);
        log::debug!(
            "{} q={} I={}d EF={:.2} due={}",
            item_id.short(),
            quality.value(),
            memory.interval,
            memory.ease_factor,
            memory.next_review
        );
        item.memory = memory.clone();
        self.attempts.push(Attempt {
            item_id: item_id.clone(),
            correct,
            time_ms: now.millis_since(self.presented_at),
        });
        Ok(memory)
    }

    fn arm(&mut self, delay_ms: u64) -> Timer {
        self.last_token += 1;
        let token = TimerToken(self.last_token);
        self.pending = Some(token);
        Timer { token, delay_ms }
    }

    fn advance(&mut self, now: Timestamp) {
        let index = match self.current_index() {
            Some(index) => index,
            None => return,
        };
        if self.mode != StudyMode::Speed && index + 1 >= self.plan.queue.len() {
            self.complete(now);
            return;
        }
        self.presented_at = now;
        self.phase = Phase::Presenting {
            index: index + 1,
            revealed: false,
        };
    }

    fn complete(&mut self, now: Timestamp) {
        let (correct, total) = self.score();
        let elapsed_ms = if self.mode == StudyMode::Speed {
            u64::from(self.pacing.speed_duration_secs) * 1000
        } else {
            now.millis_since(self.started_at)
        };
        let outcome = SessionOutcome {
            total,
            correct,
            elapsed_ms,
            mode: self.mode,
        };
        log::debug!("Session completed: {correct}/{total}");
        self.pending = None;
        self.phase = Phase::Complete(outcome);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::queue::QueueOptions;
    use crate::queue::build_plan;
    use crate::types::image_hash::ImageHash;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000 + ms)
    }

    fn make_items(names: &[&str]) -> Vec<Item> {
        names
            .iter()
            .map(|name| Item::new(name, ImageHash::hash_bytes(name.as_bytes()), None, at(0)))
            .collect()
    }

    fn start(names: &[&str], mode: StudyMode) -> Session {
        let items = make_items(names);
        let mut rng = StdRng::seed_from_u64(17);
        let options = QueueOptions::default();
        let plan = build_plan(&items, mode, at(0), options, &mut rng).unwrap();
        Session::new(items, plan, mode, Pacing::default(), at(0)).unwrap()
    }

    fn current_name(session: &Session) -> String {
        session.current_item().unwrap().name.clone()
    }

    fn wrong_choice(session: &Session) -> ItemId {
        let current = session.current_item().unwrap().id.clone();
        session
            .current_choices()
            .unwrap()
            .into_iter()
            .map(|item| item.id.clone())
            .find(|id| *id != current)
            .unwrap()
    }

    #[test]
    fn test_flash_session() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan", "Grace"], StudyMode::Flash);
        assert_eq!(session.queue_len(), 3);

        // Grading before revealing is rejected.
        assert!(session.grade(true, at(10)).is_err());

        session.reveal()?;
        assert!(session.reveal().is_err());
        let answer = session.grade(true, at(1_000))?;
        assert!(answer.correct);
        assert_eq!(answer.timer, None);
        assert_eq!(answer.memory.interval, 1);
        assert_eq!(
            session.phase(),
            &Phase::Presenting {
                index: 1,
                revealed: false,
            }
        );

        session.reveal()?;
        let answer = session.grade(false, at(2_500))?;
        assert_eq!(answer.memory.interval, 0);
        assert_eq!(answer.memory.total_count, 1);

        session.reveal()?;
        session.grade(true, at(4_000))?;
        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.correct, 2);
        assert_eq!(outcome.elapsed_ms, 4_000);
        assert_eq!(outcome.mode, StudyMode::Flash);
        assert!(!session.is_active());
        assert_eq!(session.attempts()[1].time_ms, 1_500);
        Ok(())
    }

    #[test]
    fn test_choice_correct_then_wrong() -> Fallible<()> {
        let names = ["Ada", "Alan", "Grace", "Linus", "Ken"];
        let mut session = start(&names, StudyMode::Choice);
        let choices = session.current_choices().unwrap();
        assert_eq!(choices.len(), 4);

        let current = session.current_item().unwrap().id.clone();
        let answer = session.choose(&current, at(100))?;
        assert!(answer.correct);
        let timer = answer.timer.unwrap();
        assert_eq!(timer.delay_ms, 500);
        assert_eq!(session.current_index(), Some(0));
        match session.phase() {
            Phase::Feedback { correct, .. } => assert!(*correct),
            other => panic!("unexpected phase {other:?}"),
        }

        // Answering again during feedback is rejected.
        assert!(session.choose(&current, at(200)).is_err());

        assert!(session.fire(timer.token, at(600)));
        assert_eq!(session.current_index(), Some(1));

        let wrong = wrong_choice(&session);
        let answer = session.choose(&wrong, at(700))?;
        assert!(!answer.correct);
        let timer = answer.timer.unwrap();
        assert_eq!(timer.delay_ms, 1500);
        match session.phase() {
            Phase::Feedback { selected, .. } => assert_eq!(selected.as_ref(), Some(&wrong)),
            other => panic!("unexpected phase {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_choice_rejects_unoffered_option() {
        let names = ["A1", "B2", "C3", "D4", "E5", "F6", "G7"];
        let mut session = start(&names, StudyMode::Reverse);
        let offered: Vec<ItemId> = session
            .current_choices()
            .unwrap()
            .into_iter()
            .map(|i| i.id.clone())
            .collect();
        let outsider = session
            .items
            .keys()
            .find(|id| !offered.contains(id))
            .cloned()
            .unwrap();
        assert!(session.choose(&outsider, at(5)).is_err());
        assert!(session.attempts().is_empty());
    }

    #[test]
    fn test_choice_session_completes_at_end_of_queue() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan", "Grace", "Linus"], StudyMode::Choice);
        for i in 0..4 {
            let current = session.current_item().unwrap().id.clone();
            let timer = session.choose(&current, at(i * 1_000))?.timer.unwrap();
            session.fire(timer.token, at(i * 1_000 + 500));
        }
        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.total, 4);
        assert_eq!(outcome.correct, 4);
        assert_eq!(outcome.elapsed_ms, 3_500);
        Ok(())
    }

    #[test]
    fn test_stale_timer_after_quit() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan", "Grace", "Linus"], StudyMode::Choice);
        let current = session.current_item().unwrap().id.clone();
        let timer = session.choose(&current, at(0))?.timer.unwrap();
        session.quit();
        assert!(!session.fire(timer.token, at(500)));
        assert_eq!(session.phase(), &Phase::Quit);
        assert!(session.outcome().is_none());
        Ok(())
    }

    #[test]
    fn test_unknown_token_ignored() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan", "Grace", "Linus"], StudyMode::Choice);
        let current = session.current_item().unwrap().id.clone();
        let timer = session.choose(&current, at(0))?.timer.unwrap();
        assert!(!session.fire(TimerToken(999), at(500)));
        assert!(session.fire(timer.token, at(500)));
        // A token only fires once.
        assert!(!session.fire(timer.token, at(501)));
        assert_eq!(session.current_index(), Some(1));
        Ok(())
    }

    #[test]
    fn test_speed_session_cycles() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan"], StudyMode::Speed);
        assert_eq!(session.remaining_secs(), 60);
        let first = current_name(&session);
        for i in 0..5 {
            let name = current_name(&session);
            let answer = session.guess(&name, at(i * 100))?;
            assert!(answer.correct);
            let timer = answer.timer.unwrap();
            assert_eq!(timer.delay_ms, 300);
            assert!(session.fire(timer.token, at(i * 100 + 300)));
        }
        // Five answers over a queue of two: index 5 is the second entry again.
        assert_eq!(session.current_index(), Some(5));
        assert_ne!(current_name(&session), first);
        assert!(session.is_active());
        Ok(())
    }

    #[test]
    fn test_speed_repeated_item_uses_latest_memory() -> Fallible<()> {
        let mut session = start(&["Ada"], StudyMode::Speed);
        let first = session.guess("ada", at(0))?;
        session.fire(first.timer.unwrap().token, at(300));
        let second = session.guess("ada", at(400))?;
        assert_eq!(first.memory.interval, 1);
        assert_eq!(second.memory.interval, 6);
        assert_eq!(second.memory.total_count, 2);
        Ok(())
    }

    #[test]
    fn test_speed_wrong_guess() -> Fallible<()> {
        let mut session = start(&["Ada"], StudyMode::Speed);
        let answer = session.guess("a", at(0))?;
        assert!(!answer.correct);
        assert_eq!(answer.timer.unwrap().delay_ms, 800);
        Ok(())
    }

    #[test]
    fn test_speed_countdown_completes() -> Fallible<()> {
        let mut session = start(&["Ada", "Alan"], StudyMode::Speed);
        let name = current_name(&session);
        let timer = session.guess(&name, at(0))?.timer.unwrap();
        session.fire(timer.token, at(300));
        let wrong = session.guess("nobody", at(400))?.timer.unwrap();
        for sec in 1..60 {
            assert!(session.tick(at(sec * 1_000)));
        }
        // The countdown ends the session while feedback is still showing.
        assert!(!session.tick(at(60_000)));
        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.elapsed_ms, 60_000);
        // The feedback timer that was still pending is now stale.
        assert!(!session.fire(wrong.token, at(60_100)));
        assert!(!session.tick(at(61_000)));
        Ok(())
    }

    #[test]
    fn test_tick_ignored_outside_speed() {
        let mut session = start(&["Ada"], StudyMode::Flash);
        assert!(!session.tick(at(1_000)));
        assert_eq!(session.remaining_secs(), 60);
    }

    #[test]
    fn test_mode_mismatch() {
        let mut session = start(&["Ada", "Alan"], StudyMode::Flash);
        assert!(session.guess("ada", at(0)).is_err());
        let id = session.current_item().unwrap().id.clone();
        assert!(session.choose(&id, at(0)).is_err());
    }

    #[test]
    fn test_new_rejects_bad_plans() {
        let items = make_items(&["Ada"]);
        let empty = SessionPlan {
            queue: vec![],
            choices: vec![],
        };
        let pacing = Pacing::default();
        let result = Session::new(items.clone(), empty, StudyMode::Flash, pacing, at(0));
        assert!(result.is_err());
        let unknown = SessionPlan {
            queue: vec![ItemId::generate()],
            choices: vec![],
        };
        let result = Session::new(items.clone(), unknown, StudyMode::Flash, pacing, at(0));
        assert!(result.is_err());
        let missing_choices = SessionPlan {
            queue: vec![items[0].id.clone()],
            choices: vec![],
        };
        let result = Session::new(items, missing_choices, StudyMode::Choice, pacing, at(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_pacing() -> Fallible<()> {
        let items = make_items(&["Ada", "Alan", "Grace", "Linus"]);
        let mut rng = StdRng::seed_from_u64(1);
        let options = QueueOptions::default();
        let plan = build_plan(&items, StudyMode::Choice, at(0), options, &mut rng)?;
        let pacing = Pacing {
            choice_correct_ms: 10,
            ..Pacing::default()
        };
        let mut session = Session::new(items, plan, StudyMode::Choice, pacing, at(0))?;
        let current = session.current_item().unwrap().id.clone();
        assert_eq!(session.choose(&current, at(1))?.timer.unwrap().delay_ms, 10);
        Ok(())
    }
}
