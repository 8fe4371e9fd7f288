//! Single-document extraction command.

use std::path::Path;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::extract::{CancellationFlag, ExtractionEvent, ProgressReporter};
use crate::models::SourceDocument;
use crate::ocr::RecognitionEngine;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct ExtractOverrides {
    pub language: Option<String>,
    pub scale: Option<f32>,
    pub quality: Option<u8>,
    pub backend: Option<String>,
}

impl ExtractOverrides {
    fn apply(self, config: &mut Config) {
        if let Some(language) = self.language {
            config.ocr.language = language;
        }
        if let Some(scale) = self.scale {
            config.render.scale = scale;
        }
        if let Some(quality) = self.quality {
            config.render.jpeg_quality = quality;
        }
        if let Some(backend) = self.backend {
            config.ocr.backend = backend;
        }
    }
}

/// Extract one file and print or write the result record.
pub async fn cmd_extract(
    mut config: Config,
    file: &Path,
    overrides: ExtractOverrides,
    output: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    let document = SourceDocument::from_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    eprintln!(
        "{} Extracting {} ({})",
        style("→").cyan(),
        document.file_name(),
        document.media_type()
    );

    let extractor = config.build_extractor()?;
    let mut engine = RecognitionEngine::new(config.build_backend()?);
    if let Err(e) = engine.initialize() {
        tracing::debug!("Engine initialization failed: {}", e);
    }

    let (event_tx, mut event_rx) = mpsc::channel::<ExtractionEvent>(100);

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                ExtractionEvent::DocumentStarted { total_pages, .. } => {
                    let pb = ProgressBar::new(total_pages as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap()
                            .progress_chars("█▓░"),
                    );
                    pb.set_message("Running OCR...");
                    progress = Some(pb);
                }
                ExtractionEvent::PageCompleted { page_number, .. } => {
                    if let Some(ref pb) = progress {
                        pb.set_position(page_number as u64);
                    }
                }
            }
        }
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
    });

    let cancel = CancellationFlag::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!(
                    "\n{} Cancelling after the current page...",
                    style("!").yellow()
                );
                cancel.cancel();
            }
        })
    };

    let progress = ProgressReporter::new(event_tx);
    let result = extractor
        .extract(document, &mut engine, &progress, &cancel)
        .await;
    drop(progress);
    ctrl_c.abort();
    let _ = event_handler.await;

    let document = match result {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{} Extraction failed: {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Extracted {} page(s) to {}",
                style("✓").green(),
                document.pages().len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
            eprintln!(
                "{} Extracted {} page(s)",
                style("✓").green(),
                document.pages().len()
            );
        }
    }

    Ok(())
}
