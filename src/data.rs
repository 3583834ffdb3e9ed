//! Filesystem collaborators: lesson-document reading, file discovery, and
//! JSON/CSV persistence.
//!
//! Lesson files are `.docx` archives; the document part is unzipped and its
//! paragraph texts are joined with single spaces.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Result, VocabError};
use crate::models::VocabularyEntry;

/// Default locations, relative to the working directory.
pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed/chinese_vocab.json";
pub const DEFAULT_CHECKPOINT_PATH: &str = "data/interim/chinese_vocab_checkpoint.json";
pub const DEFAULT_CARDS_PATH: &str = "data/processed/chinese_cards.json";

const DOCX_DOCUMENT_PART: &str = "word/document.xml";

/// Reads a lesson document and returns all paragraph texts joined by single
/// spaces.
pub fn read_docx(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut xml = String::new();
    match archive.by_name(DOCX_DOCUMENT_PART) {
        Ok(mut part) => {
            part.read_to_string(&mut xml)?;
        }
        Err(ZipError::FileNotFound) => {
            return Err(VocabError::DataFileNotFound(format!(
                "{DOCX_DOCUMENT_PART} in {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    }

    extract_paragraph_text(&xml)
}

/// Collects the text runs (`w:t`) of every paragraph (`w:p`) in a document
/// part.
fn extract_paragraph_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" if in_paragraph => in_run_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"t" => in_run_text = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"p" => paragraphs.push(String::new()),
            Event::Text(t) if in_run_text => {
                let text = t
                    .unescape()
                    .map_err(|e| VocabError::Internal(format!("malformed document text: {e}")))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join(" "))
}

/// Names of the regular files in `folder` ending with `.extension`,
/// unsorted; callers decide the processing order.
pub fn files_with_extension(folder: &Path, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{extension}");
    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(&suffix) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Loads a JSON value from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Saves a JSON value to `path`, creating parent directories as needed.
/// Non-ASCII characters are written literally, never escaped.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    info!("Progress saved to {}", path.display());
    Ok(())
}

/// Flattens the vocabulary dataset to CSV, one record per entry; candidate
/// translations share one cell, joined with "; ".
pub fn save_csv(entries: &[VocabularyEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["character", "translation", "pronunciation"])?;
    for entry in entries {
        writer.write_record([
            entry.character.as_str(),
            &entry.translation.join("; "),
            entry.pronunciation.as_str(),
        ])?;
    }
    writer.flush()?;
    info!("Dataset exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VocabularyStore;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>第一课 你好</w:t></w:r></w:p>
    <w:p><w:r><w:t>谢谢</w:t><w:t xml:space="preserve"> 再见</w:t></w:r></w:p>
  </w:body>
</w:document>
"#;

    fn write_docx(path: &Path, document_xml: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        if let Some(xml) = document_xml {
            writer
                .start_file(DOCX_DOCUMENT_PART, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        } else {
            writer
                .start_file("word/styles.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"<styles/>").unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn docx_paragraphs_join_with_single_spaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lesson.docx");
        write_docx(&path, Some(DOCUMENT_XML));

        let text = read_docx(&path).unwrap();
        assert_eq!(text, "第一课 你好 谢谢 再见");
    }

    #[test]
    fn docx_without_document_part_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        write_docx(&path, None);

        let err = read_docx(&path).unwrap_err();
        assert!(matches!(err, VocabError::DataFileNotFound(_)));
    }

    #[test]
    fn listing_filters_by_extension() {
        let dir = tempdir().unwrap();
        for name in ["b.docx", "a.docx", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.docx")).unwrap();

        let mut names = files_with_extension(dir.path(), "docx").unwrap();
        names.sort();
        assert_eq!(names, ["a.docx", "b.docx"]);
    }

    #[test]
    fn json_round_trip_preserves_non_ascii_literally() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = VocabularyStore::default();
        store.insert(VocabularyEntry::unresolved("你好"));
        save_json(&store, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("你好"));
        assert!(!raw.contains("\\u"));

        let restored: VocabularyStore = load_json(&path).unwrap();
        assert!(restored.contains("你好"));
    }

    #[test]
    fn csv_export_flattens_translations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.csv");

        let entry = VocabularyEntry {
            character: "你好".to_string(),
            translation: vec!["bonjour".to_string(), "salut".to_string()],
            pronunciation: "nǐ hǎo".to_string(),
        };
        save_csv(&[entry], &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next(), Some("character,translation,pronunciation"));
        assert_eq!(lines.next(), Some("你好,bonjour; salut,nǐ hǎo"));
    }
}
