//! Command-line interface for the Chinese vocabulary dataset builder.
//!
//! Provides commands for building the study dataset from lesson documents,
//! importing flashcard exports, looking up single words, and exporting the
//! dataset to CSV.

use std::error::Error as _;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, error, info};
use zhvocab_rs::{
    BuildOptions, CardManager, DatasetBuilder, DefinitionParser, VocabularyStore,
    data,
    error::Result,
    lookup::{self, ChineInClient},
    models::is_placeholder,
    progress::{ProgressCallback, ProgressUpdate},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chinese vocabulary dataset builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the vocabulary dataset from the lesson documents
    Build {
        /// Folder holding the .docx lesson documents
        #[arg(long, default_value = data::DEFAULT_RAW_DIR)]
        raw_dir: PathBuf,
        /// Destination of the persisted dataset
        #[arg(long, default_value = data::DEFAULT_PROCESSED_PATH)]
        output: PathBuf,
        /// Side location for partial progress on resolution failure
        #[arg(long, default_value = data::DEFAULT_CHECKPOINT_PATH)]
        checkpoint: PathBuf,
    },
    /// Import a flashcard XML export and reorganize it by category
    ImportCards {
        /// The export file to import
        input: PathBuf,
        /// Destination of the parsed card dataset
        #[arg(long, default_value = data::DEFAULT_CARDS_PATH)]
        output: PathBuf,
        /// Category keywords to exclude (case-insensitive substring match)
        #[arg(
            long = "exclude",
            value_name = "KEYWORD",
            default_values_t = [
                "Cours1 ".to_string(),
                "Cours2 ".to_string(),
                "Cours3 ".to_string(),
                "Question Answer Voca".to_string(),
            ]
        )]
        exclude: Vec<String>,
        /// Merge groups when a part-of-speech label repeats in one definition
        #[arg(long, default_value_t = false)]
        merge_repeated_labels: bool,
    },
    /// Look up one word against the dictionary site
    Lookup {
        /// The word to look up
        word: String,
    },
    /// Export the built dataset to CSV
    ExportCsv {
        /// The persisted dataset to flatten
        #[arg(long, default_value = data::DEFAULT_PROCESSED_PATH)]
        input: PathBuf,
        /// Destination CSV file
        output: PathBuf,
    },
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn resolve_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{prefix:>12.cyan.bold} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    bar.set_prefix("Resolving");
    bar
}

/// Bridges library progress updates onto a terminal progress bar.
fn create_progress_callback(bar: ProgressBar) -> ProgressCallback {
    Box::new(move |update: ProgressUpdate| {
        if let Some(total) = update.total_items {
            bar.set_length(total);
        }
        bar.set_position(update.current_item);
        if let Some(msg) = update.message {
            bar.set_message(msg);
        }
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Build {
            raw_dir,
            output,
            checkpoint,
        } => {
            handle_build(BuildOptions {
                raw_dir,
                processed_path: output,
                checkpoint_path: checkpoint,
            })
            .await
        }
        Commands::ImportCards {
            input,
            output,
            exclude,
            merge_repeated_labels,
        } => handle_import(&input, &output, &exclude, merge_repeated_labels),
        Commands::Lookup { word } => handle_lookup(&word).await,
        Commands::ExportCsv { input, output } => handle_export(&input, &output),
    };

    if let Err(e) = outcome {
        error!("command failed: {e}");
        eprintln!("{}", format!("Error: {e}").red());
        let mut cause = e.source();
        while let Some(inner) = cause {
            eprintln!("{}", format!("Caused by: {inner}").red().dimmed());
            cause = inner.source();
        }
        std::process::exit(1);
    }
}

async fn handle_build(options: BuildOptions) -> Result<()> {
    info!(
        "building dataset from {} into {}",
        options.raw_dir.display(),
        options.processed_path.display()
    );
    let output = options.processed_path.clone();
    let builder = DatasetBuilder::new(options)?;

    let bar = resolve_progress_bar();
    let callback = create_progress_callback(bar.clone());
    let outcome = builder.run(Some(callback)).await;
    bar.finish_and_clear();

    let store = outcome?;
    println!(
        "{} {} {}",
        store.len().to_string().bold().cyan(),
        "entries persisted to".green(),
        output.display().to_string().bold(),
    );
    Ok(())
}

fn handle_import(
    input: &PathBuf,
    output: &PathBuf,
    exclude: &[String],
    merge_repeated_labels: bool,
) -> Result<()> {
    let mut manager = CardManager::load(input)?;
    let total = manager.cards().len();
    manager.remove_by_categories(exclude);
    let kept = manager.cards().len();
    info!("kept {kept} of {total} imported cards");

    let parser = DefinitionParser {
        merge_repeated_labels,
    };
    let cards = manager.into_parsed(&parser);
    data::save_json(&cards, output)?;

    println!(
        "{} of {} cards kept, written to {}",
        kept.to_string().bold().cyan(),
        total,
        output.display().to_string().bold(),
    );
    Ok(())
}

async fn handle_lookup(word: &str) -> Result<()> {
    let client = ChineInClient::new()?;
    let result = client.lookup(word).await?;

    let pronunciation = result
        .pronunciation
        .unwrap_or_else(|| lookup::transliterate(word));
    println!(
        "\n{} [ {} ]",
        word.bold().cyan(),
        pronunciation.trim().green()
    );

    if is_placeholder(&result.translation_lines) {
        println!("{}", "No translation found.".yellow());
        return Ok(());
    }
    for (idx, line) in result.translation_lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        println!("  {}: {}", (idx + 1).to_string().bold(), line);
    }
    Ok(())
}

fn handle_export(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let store: VocabularyStore = data::load_json(input)?;
    data::save_csv(store.entries(), output)?;
    println!(
        "{} {} {}",
        store.len().to_string().bold().cyan(),
        "entries exported to".green(),
        output.display().to_string().bold(),
    );
    Ok(())
}
