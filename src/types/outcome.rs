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

use serde::Serialize;

use crate::types::mode::StudyMode;

/// The result of a finished session. Never persisted: the only trace a
/// session leaves is the collection's last-studied timestamp.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub total: usize,
    pub correct: usize,
    pub elapsed_ms: u64,
    pub mode: StudyMode,
}

impl SessionOutcome {
    /// Percentage of correct answers, rounded. Zero for an empty session.
    pub fn accuracy(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (100.0 * self.correct as f64 / self.total as f64).round() as u32
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        (self.elapsed_ms as f64 / 1000.0).round() as u64
    }

    pub fn verdict(&self) -> &'static str {
        match self.accuracy() {
            90.. => "Outstanding! You know these names.",
            70..=89 => "Great job! Keep practicing.",
            50..=69 => "Good effort! Review will help.",
            _ => "Keep at it. Practice makes perfect.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(total: usize, correct: usize) -> SessionOutcome {
        SessionOutcome {
            total,
            correct,
            elapsed_ms: 12_400,
            mode: StudyMode::Flash,
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(outcome(0, 0).accuracy(), 0);
        assert_eq!(outcome(3, 2).accuracy(), 67);
        assert_eq!(outcome(4, 4).accuracy(), 100);
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(outcome(10, 9).verdict(), "Outstanding! You know these names.");
        assert_eq!(outcome(10, 7).verdict(), "Great job! Keep practicing.");
        assert_eq!(outcome(10, 5).verdict(), "Good effort! Review will help.");
        assert_eq!(outcome(10, 4).verdict(), "Keep at it. Practice makes perfect.");
    }

    #[test]
    fn test_elapsed_secs() {
        assert_eq!(outcome(1, 1).elapsed_secs(), 12);
    }
}
