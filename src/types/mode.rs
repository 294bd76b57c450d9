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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// The ways a collection can be drilled.
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    /// See the face, recall the name, grade yourself.
    Flash,
    /// See the face, pick the name out of several.
    Choice,
    /// See the name, pick the face out of several.
    Reverse,
    /// Type as many names as you can against the clock.
    Speed,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Flash => "flash",
            StudyMode::Choice => "choice",
            StudyMode::Reverse => "reverse",
            StudyMode::Speed => "speed",
        }
    }

    /// Whether each question offers a set of options to choose from.
    pub fn has_choices(&self) -> bool {
        matches!(self, StudyMode::Choice | StudyMode::Reverse)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StudyMode::Flash => "Classic Flash",
            StudyMode::Choice => "Multiple Choice",
            StudyMode::Reverse => "Reverse",
            StudyMode::Speed => "Speed Round",
        }
    }
}

impl Display for StudyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for StudyMode {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "flash" => Ok(StudyMode::Flash),
            "choice" => Ok(StudyMode::Choice),
            "reverse" => Ok(StudyMode::Reverse),
            "speed" => Ok(StudyMode::Speed),
            _ => fail(format!("Invalid study mode: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        for mode in [
            StudyMode::Flash,
            StudyMode::Choice,
            StudyMode::Reverse,
            StudyMode::Speed,
        ] {
            assert_eq!(StudyMode::try_from(mode.as_str()).unwrap(), mode);
        }
        assert!(StudyMode::try_from("cram").is_err());
    }

    #[test]
    fn test_has_choices() {
        assert!(!StudyMode::Flash.has_choices());
        assert!(StudyMode::Choice.has_choices());
        assert!(StudyMode::Reverse.has_choices());
        assert!(!StudyMode::Speed.has_choices());
    }
}
