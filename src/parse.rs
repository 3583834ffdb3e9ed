//! Definition parsing and flashcard-export import.
//!
//! Raw definition blobs are segmented into part-of-speech groups of numbered
//! sub-definitions with trailing example sentences. Flashcard exports are
//! XML; they deserialize through serde like every other structured input in
//! this crate.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use log::warn;
use quick_xml::de::from_str;
use regex::Regex;

use crate::error::Result;
use crate::models::{
    CardExport, CardRecord, Flashcard, ParsedCard, ParsedDefinition, PartOfSpeech, SubDefinition,
};

static POS_RE: LazyLock<Regex> = LazyLock::new(|| {
    let labels: Vec<&str> = PartOfSpeech::ALL.iter().map(|p| p.label()).collect();
    Regex::new(&format!(r"(?i)\b({})\b", labels.join("|"))).unwrap()
});

/// A run of digits followed by whitespace demarcates a numbered sub-entry.
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\s").unwrap());

static NUMERIC_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\s").unwrap());

/// Whitespace immediately following a period separates a definition from its
/// example sentences.
static SENTENCE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s+").unwrap());

/// Segments raw definition text into part-of-speech groups.
#[derive(Debug, Default, Clone)]
pub struct DefinitionParser {
    /// When the same label occurs more than once in one blob, the default is
    /// the inherited behavior: the last occurrence overwrites earlier ones.
    /// Setting this merges all occurrences' sub-definitions instead.
    pub merge_repeated_labels: bool,
}

impl DefinitionParser {
    /// Parses one raw definition string. Input with no recognizable label
    /// degrades to `ParsedDefinition::Raw`, returned unchanged.
    pub fn parse(&self, definition: &str) -> ParsedDefinition {
        let matches: Vec<regex::Match> = POS_RE.find_iter(definition).collect();
        if matches.is_empty() {
            return ParsedDefinition::Raw(definition.to_string());
        }

        let mut bounds: Vec<usize> = matches.iter().map(|m| m.start()).collect();
        bounds.push(definition.len());

        let mut parsed: BTreeMap<PartOfSpeech, Vec<SubDefinition>> = BTreeMap::new();
        for (idx, m) in matches.iter().enumerate() {
            let Ok(label) = m.as_str().to_lowercase().parse::<PartOfSpeech>() else {
                continue;
            };
            // The partition starts at the label itself; dropping the match
            // length strips the leading label occurrence.
            let segment = &definition[bounds[idx]..bounds[idx + 1]];
            let body = segment[m.len()..].trim();
            let subs = split_sub_definitions(body);
            if self.merge_repeated_labels {
                parsed.entry(label).or_default().extend(subs);
            } else {
                parsed.insert(label, subs);
            }
        }
        ParsedDefinition::Structured(parsed)
    }
}

/// Splits a partition's remaining text at each point immediately preceding a
/// run of digits followed by whitespace. A leading unnumbered fragment forms
/// its own sub-entry.
fn split_sub_definitions(text: &str) -> Vec<SubDefinition> {
    let mut points = vec![0];
    for m in NUMBERED_RE.find_iter(text) {
        if m.start() != 0 {
            points.push(m.start());
        }
    }
    points.push(text.len());

    let mut subs = Vec::new();
    for window in points.windows(2) {
        let mut fragment = text[window[0]..window[1]].trim();
        if fragment.is_empty() {
            continue;
        }
        if let Some(caps) = NUMERIC_PREFIX_RE.captures(fragment) {
            fragment = fragment[caps[1].len()..].trim();
        }

        let pieces = split_after_periods(fragment);
        let definition = pieces[0].to_string();
        let examples: Vec<String> = pieces[1..]
            .iter()
            .map(|piece| piece.trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect();
        subs.push(SubDefinition {
            definition,
            examples,
        });
    }
    subs
}

/// Splits on whitespace that immediately follows a period, keeping the period
/// with the preceding piece and dropping the separator whitespace.
fn split_after_periods(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in SENTENCE_BREAK_RE.find_iter(text) {
        pieces.push(&text[last..m.start() + 1]);
        last = m.end();
    }
    pieces.push(&text[last..]);
    pieces
}

// --- Flashcard import ---

/// Deserializes a flashcard export document.
pub fn parse_card_export(xml: &str) -> Result<CardExport> {
    Ok(from_str(xml)?)
}

fn record_to_flashcard(record: CardRecord) -> Option<Flashcard> {
    let Some(headword) = record.entry.headwords.into_iter().next() else {
        warn!("skipping card record without a headword");
        return None;
    };
    let score = record.scoreinfo;
    Some(Flashcard {
        character: headword.text,
        pronunciation: record.entry.pron.map(|p| p.text).unwrap_or_default(),
        translation: record.entry.defn,
        category: record.catassign.map(|c| c.category),
        score: score.as_ref().and_then(|s| s.score.clone()),
        difficulty: score.as_ref().and_then(|s| s.difficulty.clone()),
        correct: score.as_ref().and_then(|s| s.correct.clone()),
        incorrect: score.as_ref().and_then(|s| s.incorrect.clone()),
        reviewed: score.as_ref().and_then(|s| s.reviewed.clone()),
    })
}

/// Holds imported flashcards and reorganizes them by category.
#[derive(Debug, Default)]
pub struct CardManager {
    cards: Vec<Flashcard>,
}

impl CardManager {
    pub fn from_export(export: CardExport) -> Self {
        CardManager {
            cards: export
                .cards
                .cards
                .into_iter()
                .filter_map(record_to_flashcard)
                .collect(),
        }
    }

    /// Reads and deserializes an export file.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Ok(Self::from_export(parse_card_export(&xml)?))
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    /// Drops every card whose category contains any of the keywords,
    /// case-insensitively. Cards without a category always survive.
    pub fn remove_by_categories(&mut self, keywords: &[String]) {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        self.cards.retain(|card| match &card.category {
            Some(category) => {
                let category = category.to_lowercase();
                !keywords.iter().any(|keyword| category.contains(keyword))
            }
            None => true,
        });
    }

    /// Runs every raw definition through the parser, producing the persisted
    /// record shape.
    pub fn into_parsed(self, parser: &DefinitionParser) -> Vec<ParsedCard> {
        self.cards
            .into_iter()
            .map(|card| ParsedCard {
                character: card.character,
                pronunciation: card.pronunciation,
                translation: card.translation.map(|raw| parser.parse(&raw)),
                category: card.category,
                score: card.score,
                difficulty: card.difficulty,
                correct: card.correct,
                incorrect: card.incorrect,
                reviewed: card.reviewed,
            })
            .collect()
    }
}
