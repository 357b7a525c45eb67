//! Command implementations.

use crate::cli::{ExtractArgs, ListArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::hil::ConsoleReviewer;
use crate::output::Formatter;
use forge_domain::traits::EntityStore;
use forge_domain::Genre;
use forge_hil::HilManager;
use forge_llm::OllamaClient;
use forge_pipeline::{Orchestrator, PipelineConfig, RunState};
use forge_store::SqliteStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Extensions the pipeline accepts directly. Anything else needs external
/// conversion to plain text first; partially converted input never reaches
/// the chunker.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// Run the extraction pipeline over a source file.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    db_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let extension = args
        .file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CliError::InvalidInput(format!(
            "'{}' is not plain text; convert it to .txt or .md first",
            args.file.display()
        )));
    }

    let source = std::fs::read_to_string(&args.file)?;
    let genre = Genre::parse(&args.genre);

    let mut pipeline_config = PipelineConfig::default();
    pipeline_config.extractor.model_id =
        args.model.clone().unwrap_or_else(|| config.model.clone());
    if let Some(max) = args.max_chunk_chars {
        pipeline_config.chunker.max_chunk_chars = max;
    }
    if let Some(overlap) = args.overlap_chars {
        pipeline_config.chunker.overlap_chars = overlap;
    }
    if let Some(concurrency) = args.concurrency {
        pipeline_config.max_concurrent_extractions = concurrency;
    }

    let client = OllamaClient::new(&config.endpoint, &pipeline_config.extractor.model_id);
    let store = SqliteStore::open(db_path)?;

    let mut hil = if args.auto_approve {
        HilManager::non_interactive()
    } else {
        HilManager::new(Arc::new(ConsoleReviewer::new()?), true)
    };

    info!(
        file = %args.file.display(),
        genre = %genre,
        model = %pipeline_config.extractor.model_id,
        "Starting extraction run"
    );

    let mut orchestrator = Orchestrator::new(client, store, pipeline_config);
    let summary = orchestrator.run(&source, genre, None, &mut hil).await?;

    print!("{}", formatter.format_summary(&summary));

    if summary.status == RunState::Failed {
        return Err(CliError::RunFailed);
    }
    Ok(())
}

/// List stored entities (and optionally relationships).
pub fn execute_list(args: ListArgs, db_path: &Path, formatter: &Formatter) -> Result<()> {
    let store = SqliteStore::open(db_path)?;

    let entities = store.load_all_entities()?;
    println!("{}", formatter.format_entities(&entities)?);

    if args.relationships {
        let relationships = store.load_all_relationships()?;
        println!("{}", formatter.format_relationships(&relationships)?);
    }

    Ok(())
}
