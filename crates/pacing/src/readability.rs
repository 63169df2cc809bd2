//! Flesch-style readability scoring.
//!
//! The formula uses words-per-character instead of the canonical
//! words-per-sentence term:
//!
//! ```text
//! 206.835 - 1.015 * (words / chars) - 84.6 * (syllables / words)
//! ```
//!
//! Higher scores mean easier text. Empty input scores exactly `0.0`.

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimate the syllables in a single word by counting vowel groups.
///
/// A trailing `e` is treated as silent when the word has more than one group.
#[must_use]
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let mut groups = 0;
    let mut prev_was_vowel = false;

    for ch in word.chars() {
        let is_vowel = VOWELS.contains(&ch);
        if is_vowel && !prev_was_vowel {
            groups += 1;
        }
        prev_was_vowel = is_vowel;
    }

    if word.ends_with('e') && groups > 1 {
        groups -= 1;
    }

    groups
}

/// Readability score of `text`. Pure and deterministic.
#[must_use]
pub fn score(text: &str) -> f64 {
    let mut words = 0usize;
    let mut chars = 0usize;
    let mut syllables = 0usize;

    for word in text.split_whitespace() {
        words += 1;
        chars += word.chars().count();
        syllables += count_syllables(word);
    }

    if words == 0 || chars == 0 {
        return 0.0;
    }

    let words = words as f64;
    206.835 - 1.015 * (words / chars as f64) - 84.6 * (syllables as f64 / words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn syllables_count_vowel_groups() {
        assert_eq!(count_syllables("hello"), 2);
        assert_eq!(count_syllables("quick"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("rhythm"), 1);
    }

    #[test]
    fn syllables_are_case_insensitive() {
        assert_eq!(count_syllables("HELLO"), count_syllables("hello"));
    }

    #[test]
    fn silent_e_only_drops_when_more_than_one_group() {
        assert_eq!(count_syllables("cake"), 1);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("queue"), 1);
        assert_eq!(count_syllables("bridge"), 1);
    }

    #[test]
    fn word_without_vowels_has_no_syllables() {
        assert_eq!(count_syllables("brr"), 0);
        assert_eq!(count_syllables("42"), 0);
    }

    #[test]
    fn empty_and_blank_input_score_zero() {
        assert_eq!(score(""), 0.0);
        assert_eq!(score("   \t\n  "), 0.0);
    }

    #[test]
    fn short_greeting() {
        // 1 word, 2 chars, 1 syllable.
        assert_close(score("hi"), 206.835 - 1.015 * 0.5 - 84.6);
    }

    #[test]
    fn punctuation_counts_as_characters() {
        // "hi!" has 3 characters but the same single syllable.
        assert_close(score("hi!"), 206.835 - 1.015 * (1.0 / 3.0) - 84.6);
    }

    #[test]
    fn multi_word_sentence() {
        // 4 words, 16 chars, 4 syllables.
        assert_close(
            score("The quick brown fox"),
            206.835 - 1.015 * 0.25 - 84.6,
        );
    }

    #[test]
    fn dense_text_scores_low() {
        assert!(score("Extraordinary communication infrastructure") < 0.0);
    }

    #[test]
    fn score_is_deterministic() {
        let text = "Would you like to grab coffee later today?";
        assert_eq!(score(text).to_bits(), score(text).to_bits());
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("one  two\tthree\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }
}
