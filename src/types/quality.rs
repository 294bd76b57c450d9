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

/// How well an item was recalled, from 0 (total blank) to 5 (perfect).
///
/// Out-of-range inputs are clamped rather than rejected: a review must always
/// produce a memory update.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(5);

    /// A miss: the item was not recalled, or the wrong answer was chosen.
    pub const FORGOT: Quality = Quality(1);

    /// The item was recalled.
    pub const RECALLED: Quality = Quality(4);

    /// The lowest quality that counts as a successful recall.
    pub const PASSING: Quality = Quality(3);

    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, 5) as u8)
    }

    /// Collapse a right/wrong signal into one of the two canonical qualities.
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Self::RECALLED
        } else {
            Self::FORGOT
        }
    }

    pub fn is_pass(self) -> bool {
        self >= Self::PASSING
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(Quality::new(-3), Quality::MIN);
        assert_eq!(Quality::new(17), Quality::MAX);
        assert_eq!(Quality::new(2).value(), 2);
    }

    #[test]
    fn test_from_correct() {
        assert_eq!(Quality::from_correct(true).value(), 4);
        assert_eq!(Quality::from_correct(false).value(), 1);
    }

    #[test]
    fn test_is_pass() {
        assert!(!Quality::new(2).is_pass());
        assert!(Quality::new(3).is_pass());
        assert!(Quality::RECALLED.is_pass());
        assert!(!Quality::FORGOT.is_pass());
    }
}
