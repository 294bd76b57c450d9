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

/// Guesses shorter than this only count on an exact match.
const MIN_PREFIX_CHARS: usize = 2;

/// Decide whether a typed guess names the item.
///
/// Matching ignores case and surrounding whitespace. A guess is correct when
/// it equals the name, or when it is a prefix of the name at least two
/// characters long, so typing a first name is enough.
pub fn is_correct_guess(guess: &str, name: &str) -> bool {
    let guess = guess.trim().to_lowercase();
    let name = name.to_lowercase();
    if guess == name {
        return true;
    }
    guess.chars().count() >= MIN_PREFIX_CHARS && name.starts_with(&guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix() {
        assert!(is_correct_guess("jo", "john"));
        assert!(is_correct_guess("Jo", "John Smith"));
        assert!(is_correct_guess("john", "John Smith"));
    }

    #[test]
    fn test_short_prefix_rejected() {
        assert!(!is_correct_guess("j", "john"));
    }

    #[test]
    fn test_case_insensitive_exact() {
        assert!(is_correct_guess("JOHN", "john"));
        assert!(is_correct_guess("  john ", "John"));
    }

    #[test]
    fn test_single_character_name() {
        assert!(is_correct_guess("q", "Q"));
    }

    #[test]
    fn test_wrong() {
        assert!(!is_correct_guess("joan", "john"));
        assert!(!is_correct_guess("smith", "John Smith"));
        assert!(!is_correct_guess("johnny", "john"));
    }

    #[test]
    fn test_empty_guess() {
        assert!(!is_correct_guess("", "john"));
        assert!(!is_correct_guess("   ", "john"));
    }

    #[test]
    fn test_non_ascii() {
        assert!(is_correct_guess("zoë", "Zoë Kravitz"));
        assert!(!is_correct_guess("é", "Émile"));
    }
}
