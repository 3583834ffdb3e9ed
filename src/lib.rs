// Declare modules
pub mod data;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod models;
pub mod parse;
pub mod progress;

// Re-export key types for easier use
pub use error::{Result, VocabError};
pub use models::{
    Flashcard,
    LookupResult,
    ParsedCard,
    ParsedDefinition,
    PartOfSpeech,
    SubDefinition,
    VocabularyEntry,
    VocabularyStore,
};
pub use parse::{CardManager, DefinitionParser};

use std::path::PathBuf;

use log::{error, info, warn};

use crate::lookup::{ChineInClient, GoogleTranslator, TranslationProvider};
use crate::progress::{ProgressCallback, ProgressUpdate};

const RESOLVE_STAGE: &str = "Resolving vocabulary";

/// Options for one dataset build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Folder holding the `.docx` lesson documents.
    pub raw_dir: PathBuf,
    /// Primary persisted dataset; also the prior state loaded on start.
    pub processed_path: PathBuf,
    /// Side location for partial progress written on resolution failure.
    pub checkpoint_path: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            raw_dir: PathBuf::from(data::DEFAULT_RAW_DIR),
            processed_path: PathBuf::from(data::DEFAULT_PROCESSED_PATH),
            checkpoint_path: PathBuf::from(data::DEFAULT_CHECKPOINT_PATH),
        }
    }
}

/// Outcome of the resolution step. Failure carries the original fault so the
/// orchestrator can decide to checkpoint and re-signal, instead of relying on
/// unwinding to trigger the save.
enum ResolveOutcome {
    Complete,
    Aborted(VocabError),
}

/// Drives one `Load -> Extract -> Resolve -> Persist` run over the
/// vocabulary store.
pub struct DatasetBuilder {
    options: BuildOptions,
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl DatasetBuilder {
    /// Builder with the standard provider priority list: the dictionary site
    /// first, the generic translation service as fallback.
    pub fn new(options: BuildOptions) -> Result<Self> {
        let providers: Vec<Box<dyn TranslationProvider>> = vec![
            Box::new(ChineInClient::new()?),
            Box::new(GoogleTranslator::new()?),
        ];
        Ok(Self::with_providers(options, providers))
    }

    /// Builder with an explicit provider list.
    pub fn with_providers(
        options: BuildOptions,
        providers: Vec<Box<dyn TranslationProvider>>,
    ) -> Self {
        DatasetBuilder { options, providers }
    }

    /// Runs the full pipeline. On a resolution fault the partial store is
    /// written to the checkpoint location and the run fails with
    /// [`VocabError::CheckpointSaved`], chaining the original fault; a later
    /// run pointed at the checkpoint picks the partial state back up.
    pub async fn run(&self, mut progress: Option<ProgressCallback>) -> Result<VocabularyStore> {
        let mut store = self.load()?;
        self.extract(&mut store)?;
        info!("store holds {} entries after extraction", store.len());

        match self.resolve(&mut store, progress.as_mut()).await {
            ResolveOutcome::Complete => {
                data::save_json(&store, &self.options.processed_path)?;
                Ok(store)
            }
            ResolveOutcome::Aborted(cause) => {
                error!("resolution failed: {cause}");
                if let Err(persist_err) = data::save_json(&store, &self.options.checkpoint_path) {
                    error!("failed to write checkpoint: {persist_err}");
                }
                Err(VocabError::CheckpointSaved {
                    path: self.options.checkpoint_path.clone(),
                    source: Box::new(cause),
                })
            }
        }
    }

    /// Loads the prior persisted store, or starts empty on the first run.
    fn load(&self) -> Result<VocabularyStore> {
        if self.options.processed_path.exists() {
            info!(
                "loading existing vocabulary from {}",
                self.options.processed_path.display()
            );
            data::load_json(&self.options.processed_path)
        } else {
            info!("no prior vocabulary found, starting empty");
            Ok(VocabularyStore::default())
        }
    }

    /// Runs the extractor over every lesson document, in sorted-by-name
    /// order, merging candidates into the store.
    fn extract(&self, store: &mut VocabularyStore) -> Result<()> {
        let mut names = data::files_with_extension(&self.options.raw_dir, "docx")?;
        names.sort();
        for name in names {
            let text = data::read_docx(&self.options.raw_dir.join(&name))?;
            extract::extract_vocab(&text, store);
        }
        Ok(())
    }

    /// Resolves unresolved entries in store order, one lookup at a time.
    async fn resolve(
        &self,
        store: &mut VocabularyStore,
        mut progress: Option<&mut ProgressCallback>,
    ) -> ResolveOutcome {
        let total = store.len() as u64;
        for (idx, entry) in store.iter_mut().enumerate() {
            if let Some(callback) = progress.as_deref_mut() {
                callback(ProgressUpdate::new(
                    RESOLVE_STAGE,
                    idx as u64,
                    Some(total),
                    Some(entry.character.clone()),
                ));
            }

            if entry.needs_translation() {
                match lookup::resolve_translation(&self.providers, &entry.character).await {
                    Ok(lines) => entry.translation = lines,
                    Err(e) => return ResolveOutcome::Aborted(e),
                }
            }
            if entry.needs_pronunciation() {
                entry.pronunciation = lookup::transliterate(&entry.character);
                if entry.pronunciation.is_empty() {
                    warn!("no pronunciation produced for '{}'", entry.character);
                }
            }
        }
        ResolveOutcome::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Provider that replays a fixed script of results, one per call.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<Vec<String>>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Vec<String>>>) -> Self {
            ScriptedProvider {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn resolve(&self, _word: &str) -> Result<Vec<String>> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(VocabError::Internal("script exhausted".to_string()));
            }
            script.remove(0)
        }
    }

    fn options_in(dir: &Path) -> BuildOptions {
        BuildOptions {
            raw_dir: dir.join("raw"),
            processed_path: dir.join("processed/vocab.json"),
            checkpoint_path: dir.join("interim/vocab_checkpoint.json"),
        }
    }

    fn seed_store(path: &Path, words: &[&str]) {
        let mut store = VocabularyStore::default();
        for word in words {
            store.insert(VocabularyEntry::unresolved(*word));
        }
        data::save_json(&store, path).unwrap();
    }

    #[tokio::test]
    async fn completed_run_persists_to_the_processed_path() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        std::fs::create_dir_all(&options.raw_dir).unwrap();
        seed_store(&options.processed_path, &["你好", "谢谢"]);

        let provider = ScriptedProvider::new(vec![
            Ok(vec!["bonjour".to_string()]),
            Ok(vec!["merci".to_string()]),
        ]);
        let builder = DatasetBuilder::with_providers(options.clone(), vec![Box::new(provider)]);

        let store = builder.run(None).await.unwrap();
        assert!(!options.checkpoint_path.exists());

        let persisted: VocabularyStore = data::load_json(&options.processed_path).unwrap();
        assert_eq!(persisted.entries(), store.entries());
        assert_eq!(store.entries()[0].translation, ["bonjour"]);
        assert_eq!(store.entries()[0].pronunciation, "nǐ hǎo");
        assert_eq!(store.entries()[1].translation, ["merci"]);
    }

    #[tokio::test]
    async fn resolution_fault_checkpoints_partial_progress() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        std::fs::create_dir_all(&options.raw_dir).unwrap();
        seed_store(&options.processed_path, &["一", "二", "三", "四", "五"]);

        // Two entries resolve, the third lookup faults.
        let provider = ScriptedProvider::new(vec![
            Ok(vec!["un".to_string()]),
            Ok(vec!["deux".to_string()]),
            Err(VocabError::NoResultContainer),
        ]);
        let builder = DatasetBuilder::with_providers(options.clone(), vec![Box::new(provider)]);

        let err = builder.run(None).await.unwrap_err();
        assert!(err.to_string().contains("progress has been saved"));
        let VocabError::CheckpointSaved { path, source } = err else {
            panic!("expected CheckpointSaved");
        };
        assert_eq!(path, options.checkpoint_path);
        assert!(matches!(*source, VocabError::NoResultContainer));

        let checkpoint: VocabularyStore = data::load_json(&options.checkpoint_path).unwrap();
        assert_eq!(checkpoint.len(), 5);
        assert_eq!(checkpoint.entries()[0].translation, ["un"]);
        assert_eq!(checkpoint.entries()[1].translation, ["deux"]);
        for entry in &checkpoint.entries()[2..] {
            assert!(entry.needs_translation());
            assert!(entry.needs_pronunciation());
        }

        // The primary dataset still holds the pre-run placeholders.
        let prior: VocabularyStore = data::load_json(&options.processed_path).unwrap();
        assert!(prior.entries().iter().all(|e| e.needs_translation()));
    }

    #[tokio::test]
    async fn resolution_skips_already_resolved_entries() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        std::fs::create_dir_all(&options.raw_dir).unwrap();

        let mut store = VocabularyStore::default();
        let mut resolved = VocabularyEntry::unresolved("你好");
        resolved.translation = vec!["bonjour".to_string()];
        resolved.pronunciation = "nǐ hǎo".to_string();
        store.insert(resolved.clone());
        store.insert(VocabularyEntry::unresolved("谢谢"));
        data::save_json(&store, &options.processed_path).unwrap();

        // One scripted result: only the unresolved entry may consume it.
        let provider = ScriptedProvider::new(vec![Ok(vec!["merci".to_string()])]);
        let builder = DatasetBuilder::with_providers(options.clone(), vec![Box::new(provider)]);

        let store = builder.run(None).await.unwrap();
        assert_eq!(store.entries()[0], resolved);
        assert_eq!(store.entries()[1].translation, ["merci"]);
    }

    #[tokio::test]
    async fn progress_is_reported_once_per_entry() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        std::fs::create_dir_all(&options.raw_dir).unwrap();
        seed_store(&options.processed_path, &["一", "二"]);

        let provider = ScriptedProvider::new(vec![
            Ok(vec!["un".to_string()]),
            Ok(vec!["deux".to_string()]),
        ]);
        let builder = DatasetBuilder::with_providers(options, vec![Box::new(provider)]);

        let updates = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            sink.lock().unwrap().push((update.current_item, update.message));
        });

        builder.run(Some(callback)).await.unwrap();
        let seen = updates.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (0, Some("一".to_string())),
                (1, Some("二".to_string())),
            ]
        );
    }
}
