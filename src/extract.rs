//! Candidate-word extraction from raw lesson text.
//!
//! Text is split on the space character; each token is reduced to its
//! alphanumeric characters (Unicode-aware, so ideographic script passes
//! through verbatim) and inserted into the store with unresolved
//! placeholders when it survives the filter.

use log::debug;

use crate::models::{VocabularyEntry, VocabularyStore};

/// Tokens must be strictly shorter than this, counted in characters.
pub const MAX_TOKEN_CHARS: usize = 12;

/// Lesson headers carry the course year; tokens containing it are noise.
const EXCLUDED_YEAR: &str = "2024";

/// Merges every candidate token of `text` into `store`. Already-known
/// characters are skipped, so re-running extraction over the same document is
/// a no-op.
pub fn extract_vocab(text: &str, store: &mut VocabularyStore) {
    let before = store.len();
    for token in text.split(' ') {
        let word: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
        if accepts(&word, store) {
            store.insert(VocabularyEntry::unresolved(word));
        }
    }
    debug!("extracted {} new entries", store.len() - before);
}

fn accepts(word: &str, store: &VocabularyStore) -> bool {
    let len = word.chars().count();
    len > 0 && len < MAX_TOKEN_CHARS && !word.contains(EXCLUDED_YEAR) && !store.contains(word)
}
