//! Dictionary-site lookup and translation fallback.
//!
//! The primary source is an external Mandarin dictionary page queried over
//! HTTP. Fields are recovered from the response by marker-delimited substring
//! search on the serialized markup, never by tree-aware extraction: the
//! markers encode the shape of an uncontrolled external site, and the rest of
//! the crate depends only on the resolved-field contract exposed here.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use pinyin::ToPinyin;
use regex::Regex;

use crate::error::{Result, VocabError};
use crate::models::{is_placeholder, LookupResult};

const DICTIONARY_BASE_URL: &str = "https://chine.in/mandarin/dictionnaire/index.php?mot=";
const TRANSLATE_URL: &str = "https://translate.google.com/m";

/// The site rejects non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Every request blocks the whole pipeline, so it is bounded tightly.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

const CONTAINER_ID_MARKER: &str = r#"id="resultats_dico""#;
const CONTAINER_CLASS: &str = "table invert_img";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());

/// Builds the query URL. The site expects the word as HTML-entity-style
/// numeric character references embedded in the URL, not as literal text.
pub fn encoded_dictionary_url(word: &str) -> String {
    let encoded: String = word
        .chars()
        .map(|c| format!("%26%23{}%3B", c as u32))
        .collect();
    format!("{DICTIONARY_BASE_URL}{encoded}")
}

/// The text between two literal markers, exclusive of both.
fn between_markers<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let to = from + text[from..].find(end)?;
    Some(&text[from..to])
}

fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Locates the serialized markup of the result container: the element
/// carrying both the marker class and the marker id. The element body is
/// recovered by scanning open/close tags of its own name with a depth
/// counter, which is sufficient for the fixed page shape served by the site.
fn result_container(body: &str) -> Option<&str> {
    let id_pos = body.find(CONTAINER_ID_MARKER)?;
    let open = body[..id_pos].rfind('<')?;
    let open_tag_end = open + body[open..].find('>')?;
    if !body[open..open_tag_end].contains(CONTAINER_CLASS) {
        return None;
    }

    let after_bracket = &body[open + 1..open_tag_end];
    let name_len = after_bracket
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_bracket.len());
    let name = &after_bracket[..name_len];
    if name.is_empty() {
        return None;
    }

    let open_pat = format!("<{name}");
    let close_pat = format!("</{name}>");
    let mut depth = 1usize;
    let mut cursor = open_tag_end + 1;
    while depth > 0 {
        let close_at = cursor + body[cursor..].find(&close_pat)?;
        match next_opening(body, cursor, &open_pat, close_at) {
            Some(at) => {
                depth += 1;
                cursor = at + open_pat.len();
            }
            None => {
                depth -= 1;
                cursor = close_at + close_pat.len();
            }
        }
    }
    Some(&body[open..cursor])
}

/// Next opening tag of the same name strictly before `limit`. Longer names
/// sharing the prefix (`<tablespan` vs `<table`) are not a match.
fn next_opening(body: &str, from: usize, open_pat: &str, limit: usize) -> Option<usize> {
    let mut cursor = from;
    while let Some(rel) = body[cursor..].find(open_pat) {
        let at = cursor + rel;
        if at >= limit {
            return None;
        }
        match body[at + open_pat.len()..].chars().next() {
            Some(c) if c.is_ascii_alphanumeric() => cursor = at + open_pat.len(),
            _ => return Some(at),
        }
    }
    None
}

/// Extracts candidate translation lines from the container's raw markup.
///
/// The span between `Entrées pour <word>` and `Entrées commençant par` wins;
/// the generic `Traduction` block is the fallback. No span at all resolves to
/// the unresolved placeholder. A span holding list items is split on the
/// closing tags, dropping the trailing artifact the split always produces.
fn extract_translation(raw: &str, word: &str) -> Vec<String> {
    let start = format!("Entrées pour {word}");
    let span = between_markers(raw, &start, "Entrées commençant par")
        .or_else(|| between_markers(raw, "Traduction", "Editer (projet CFDICT)"));

    let Some(span) = span else {
        return vec![String::new()];
    };

    if span.contains("<li>") {
        let mut items: Vec<&str> = span.split("</li>").collect();
        items.pop();
        items.iter().map(|item| strip_tags(item)).collect()
    } else {
        vec![strip_tags(span)]
    }
}

/// Extracts the phonetic span from the container's tag-stripped text.
/// Absence means "leave the stored field unset", not an empty value.
fn extract_pronunciation(plain: &str) -> Option<String> {
    between_markers(plain, "[ ", "]").map(str::to_owned)
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(VocabError::from)
}

/// Client for the Mandarin dictionary site.
pub struct ChineInClient {
    http: reqwest::Client,
}

impl ChineInClient {
    pub fn new() -> Result<Self> {
        Ok(ChineInClient {
            http: build_http_client()?,
        })
    }

    /// Fetches the page for `word` and returns the result container's raw
    /// markup.
    async fn fetch_container(&self, word: &str) -> Result<String> {
        let url = encoded_dictionary_url(word);
        debug!("querying dictionary: {}", url);
        let body = self
            .http
            .post(&url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .form(&[("q", word), ("Submit", "1")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        result_container(&body)
            .map(str::to_owned)
            .ok_or(VocabError::NoResultContainer)
    }

    /// Resolves one word to translation lines and an optional pronunciation.
    pub async fn lookup(&self, word: &str) -> Result<LookupResult> {
        let raw = self.fetch_container(word).await?;
        let plain = strip_tags(&raw);
        Ok(LookupResult {
            translation_lines: extract_translation(&raw, word),
            pronunciation: extract_pronunciation(&plain),
        })
    }
}

/// Secondary, lower-quality source: the mobile page of a generic web
/// translation service.
pub struct GoogleTranslator {
    http: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self> {
        Ok(GoogleTranslator {
            http: build_http_client()?,
        })
    }

    async fn translate(&self, word: &str) -> Result<Vec<String>> {
        let body = self
            .http
            .get(TRANSLATE_URL)
            .query(&[("sl", "zh-CN"), ("tl", "fr"), ("q", word), ("op", "translate")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let span = between_markers(&body, r#"class="result-container">"#, "</div>")
            .ok_or(VocabError::NoTranslationResult)?;
        Ok(vec![strip_tags(span)])
    }
}

/// One source in the lookup priority list.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolves one word to candidate translation lines. The unresolved
    /// placeholder `[""]` signals "nothing found here"; transport or parse
    /// faults fail instead.
    async fn resolve(&self, word: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl TranslationProvider for ChineInClient {
    fn name(&self) -> &'static str {
        "chine.in"
    }

    async fn resolve(&self, word: &str) -> Result<Vec<String>> {
        Ok(self.lookup(word).await?.translation_lines)
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslator {
    fn name(&self) -> &'static str {
        "google-translate"
    }

    async fn resolve(&self, word: &str) -> Result<Vec<String>> {
        self.translate(word).await
    }
}

/// Tries each provider in order until one yields a non-placeholder result.
/// A provider fault aborts the chain; exhausting every provider returns the
/// placeholder.
pub async fn resolve_translation(
    providers: &[Box<dyn TranslationProvider>],
    word: &str,
) -> Result<Vec<String>> {
    let mut lines = vec![String::new()];
    for provider in providers {
        lines = provider.resolve(word).await?;
        if !is_placeholder(&lines) {
            return Ok(lines);
        }
        debug!("{} returned no result for '{}'", provider.name(), word);
    }
    Ok(lines)
}

/// Tone-marked transliteration, one syllable per character, space-joined.
/// Characters with no reading pass through verbatim.
pub fn transliterate(word: &str) -> String {
    word.chars()
        .map(|c| match c.to_pinyin() {
            Some(p) => p.with_tone().to_string(),
            None => c.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
