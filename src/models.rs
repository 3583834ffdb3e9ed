use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

// --- Vocabulary dataset ---

/// One study item. `translation` holds ordered candidate translations, where
/// the single-element `[""]` sequence is the unresolved placeholder; an empty
/// `pronunciation` likewise means unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub character: String,
    pub translation: Vec<String>,
    pub pronunciation: String,
}

impl VocabularyEntry {
    /// Creates an entry carrying the unresolved placeholders.
    pub fn unresolved(character: impl Into<String>) -> Self {
        VocabularyEntry {
            character: character.into(),
            translation: vec![String::new()],
            pronunciation: String::new(),
        }
    }

    pub fn needs_translation(&self) -> bool {
        is_placeholder(&self.translation)
    }

    pub fn needs_pronunciation(&self) -> bool {
        self.pronunciation.is_empty()
    }
}

/// Whether a translation sequence is the unresolved placeholder.
pub fn is_placeholder(translation: &[String]) -> bool {
    matches!(translation, [only] if only.is_empty())
}

/// Insertion-ordered collection of vocabulary entries, keyed by `character`.
///
/// Persists as a bare JSON list; the membership index is rebuilt on load.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<VocabularyEntry>", into = "Vec<VocabularyEntry>")]
pub struct VocabularyStore {
    entries: Vec<VocabularyEntry>,
    index: HashSet<String>,
}

impl VocabularyStore {
    pub fn contains(&self, character: &str) -> bool {
        self.index.contains(character)
    }

    /// Inserts an entry unless its character is already present. Returns
    /// whether the entry was added.
    pub fn insert(&mut self, entry: VocabularyEntry) -> bool {
        if self.index.contains(&entry.character) {
            return false;
        }
        self.index.insert(entry.character.clone());
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VocabularyEntry> {
        self.entries.iter()
    }

    /// Mutable iteration for in-place resolution. Callers must not change
    /// `character` (it is the store key).
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, VocabularyEntry> {
        self.entries.iter_mut()
    }
}

impl From<Vec<VocabularyEntry>> for VocabularyStore {
    fn from(entries: Vec<VocabularyEntry>) -> Self {
        let mut store = VocabularyStore::default();
        for entry in entries {
            store.insert(entry);
        }
        store
    }
}

impl From<VocabularyStore> for Vec<VocabularyEntry> {
    fn from(store: VocabularyStore) -> Self {
        store.entries
    }
}

// --- Lookup ---

/// Transient result of one dictionary-site lookup. A `None` pronunciation
/// means the page carried no phonetic span and the stored field must be left
/// untouched, which is distinct from a present-but-empty value.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub translation_lines: Vec<String>,
    pub pronunciation: Option<String>,
}

// --- Part of speech ---

/// The closed set of category words used to segment raw definition text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Adjective,
    Adverb,
    Affix,
    Auxiliary,
    Idiom,
    Noun,
    Preposition,
    Pronoun,
    Surname,
    Verb,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 10] = [
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Affix,
        PartOfSpeech::Auxiliary,
        PartOfSpeech::Idiom,
        PartOfSpeech::Noun,
        PartOfSpeech::Preposition,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Surname,
        PartOfSpeech::Verb,
    ];

    /// The lowercase label as it appears in definition text.
    pub fn label(&self) -> &'static str {
        match self {
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Affix => "affix",
            PartOfSpeech::Auxiliary => "auxiliary",
            PartOfSpeech::Idiom => "idiom",
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Surname => "surname",
            PartOfSpeech::Verb => "verb",
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for PartOfSpeech {
    type Err = String; // Simple error type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjective" => Ok(PartOfSpeech::Adjective),
            "adverb" => Ok(PartOfSpeech::Adverb),
            "affix" => Ok(PartOfSpeech::Affix),
            "auxiliary" => Ok(PartOfSpeech::Auxiliary),
            "idiom" => Ok(PartOfSpeech::Idiom),
            "noun" => Ok(PartOfSpeech::Noun),
            "preposition" => Ok(PartOfSpeech::Preposition),
            "pronoun" => Ok(PartOfSpeech::Pronoun),
            "surname" => Ok(PartOfSpeech::Surname),
            "verb" => Ok(PartOfSpeech::Verb),
            _ => Err(format!("Invalid part of speech: {}", s)),
        }
    }
}

// --- Parsed definitions ---

/// One numbered sub-definition with its trailing example sentences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubDefinition {
    pub definition: String,
    pub examples: Vec<String>,
}

/// Outcome of parsing a raw definition blob. When no part-of-speech label is
/// recognized, the original text is passed through unchanged and callers must
/// branch on the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedDefinition {
    Structured(BTreeMap<PartOfSpeech, Vec<SubDefinition>>),
    Raw(String),
}

impl ParsedDefinition {
    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedDefinition::Structured(_))
    }
}

// --- Flashcards ---

/// One imported flashcard. Optional fields stay unset when the export record
/// omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub character: String,
    pub pronunciation: String,
    pub translation: Option<String>,
    pub category: Option<String>,
    pub score: Option<String>,
    pub difficulty: Option<String>,
    pub correct: Option<String>,
    pub incorrect: Option<String>,
    pub reviewed: Option<String>,
}

/// A flashcard whose raw definition text has been replaced by the parsed
/// structure (or passed through untouched when parsing degraded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCard {
    pub character: String,
    pub pronunciation: String,
    pub translation: Option<ParsedDefinition>,
    pub category: Option<String>,
    pub score: Option<String>,
    pub difficulty: Option<String>,
    pub correct: Option<String>,
    pub incorrect: Option<String>,
    pub reviewed: Option<String>,
}

// --- Flashcard export file (XML) ---

/// Root of a flashcard export file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardExport {
    #[serde(rename = "cards")]
    pub cards: CardList,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardList {
    #[serde(rename = "card", default)]
    pub cards: Vec<CardRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "catassign", default)]
    pub catassign: Option<CategoryAssign>,
    #[serde(rename = "scoreinfo", default)]
    pub scoreinfo: Option<ScoreInfo>,
    #[serde(rename = "entry")]
    pub entry: CardEntry,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryAssign {
    #[serde(rename = "@category")]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreInfo {
    #[serde(rename = "@score", default)]
    pub score: Option<String>,
    #[serde(rename = "@difficulty", default)]
    pub difficulty: Option<String>,
    #[serde(rename = "@correct", default)]
    pub correct: Option<String>,
    #[serde(rename = "@incorrect", default)]
    pub incorrect: Option<String>,
    #[serde(rename = "@reviewed", default)]
    pub reviewed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardEntry {
    /// Exports may carry one headword per script variant; the first wins.
    #[serde(rename = "headword", default)]
    pub headwords: Vec<Headword>,
    #[serde(rename = "pron", default)]
    pub pron: Option<Pron>,
    #[serde(rename = "defn", default)]
    pub defn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Headword {
    #[serde(rename = "@charlang", default)]
    pub charlang: Option<String>,
    #[serde(rename = "$text")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pron {
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    #[serde(rename = "$text")]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(&[String::new()]));
        assert!(!is_placeholder(&[]));
        assert!(!is_placeholder(&[String::new(), String::new()]));
        assert!(!is_placeholder(&["bonjour".to_string()]));

        let entry = VocabularyEntry::unresolved("你好");
        assert!(entry.needs_translation());
        assert!(entry.needs_pronunciation());
    }

    #[test]
    fn store_enforces_unique_characters() {
        let mut store = VocabularyStore::default();
        assert!(store.insert(VocabularyEntry::unresolved("你好")));
        assert!(!store.insert(VocabularyEntry::unresolved("你好")));
        assert_eq!(store.len(), 1);
        assert!(store.contains("你好"));
    }

    #[test]
    fn store_serializes_as_list() {
        let mut store = VocabularyStore::default();
        store.insert(VocabularyEntry::unresolved("爱"));
        let json = serde_json::to_string(&store).unwrap();
        assert!(json.starts_with('['));

        let restored: VocabularyStore = serde_json::from_str(&json).unwrap();
        assert!(restored.contains("爱"));
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn store_preserves_insertion_order() {
        let mut store = VocabularyStore::default();
        for word in ["工作", "吃饭", "家"] {
            store.insert(VocabularyEntry::unresolved(word));
        }
        let order: Vec<&str> = store.iter().map(|e| e.character.as_str()).collect();
        assert_eq!(order, ["工作", "吃饭", "家"]);
    }
}
