//! Generate Command
//!
//! Generate documentation for one source file.
//!
//! Usage:
//!   codescribe generate <file> --doc-type README [--language js] [--stream]
//!                       [--json] [--sample] [--output docs.md]

use std::io::Write;
use std::path::PathBuf;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::ui::Output;
use crate::cli::util::{ProviderOverrides, load_config, read_text, resolve_language};
use crate::pipeline::{DocPipeline, GenerationOptions, GenerationOutcome, GenerationRequest};
use crate::types::{DocError, Result};

/// Generate command options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub file: PathBuf,
    pub doc_type: String,
    pub language: Option<String>,
    pub overrides: ProviderOverrides,
    pub stream: bool,
    pub json: bool,
    pub sample: bool,
    pub output: Option<PathBuf>,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let config = load_config(&options.overrides)?;
    let source = read_text(&options.file)?;
    let language = resolve_language(options.language.as_deref(), &options.file);

    let pipeline = DocPipeline::from_config(&config)?;
    let request = GenerationRequest::new(source, options.doc_type.clone(), language);
    let generation = GenerationOptions {
        is_sample: options.sample,
    };

    debug!(
        file = %options.file.display(),
        provider = pipeline.client().provider_name(),
        model = pipeline.client().model(),
        "Starting generation"
    );

    let rt = Runtime::new()?;
    let outcome = rt.block_on(async {
        if options.stream {
            stream_to_stdout(&pipeline, &request, &generation, !options.json).await
        } else {
            pipeline
                .generate(&request, &generation)
                .await
                .map(|result| GenerationOutcome::Completed(Box::new(result)))
        }
    })?;

    let out = Output::new();
    let Some(result) = outcome.into_result() else {
        out.warning("Generation cancelled");
        return Ok(());
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(path) = &options.output {
        std::fs::write(path, &result.documentation)?;
        out.success(&format!("Wrote {}", path.display()));
    } else if !options.stream {
        println!("{}", result.documentation);
    }

    if !options.json {
        out.score(&result.quality_score);
        out.metadata(&result.metadata.provider);
    }
    Ok(())
}

/// Stream chunks to stdout as they arrive; Ctrl-C cancels the run
async fn stream_to_stdout(
    pipeline: &DocPipeline,
    request: &GenerationRequest,
    options: &GenerationOptions,
    echo: bool,
) -> Result<GenerationOutcome> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let (tx, rx) = mpsc::channel::<String>(64);
    let printer = tokio::spawn(print_chunks(rx, std::io::stdout(), echo));

    let outcome = pipeline
        .generate_streaming(request, options, tx, &cancel)
        .await;
    watcher.abort();
    printer
        .await
        .map_err(|e| DocError::Io(std::io::Error::other(e)))?;
    outcome
}

/// Write chunks as they arrive. A failed write (closed pipe) drops the
/// receiver, which the provider client treats as cancellation.
async fn print_chunks<W: Write>(mut rx: mpsc::Receiver<String>, mut out: W, echo: bool) {
    while let Some(chunk) = rx.recv().await {
        if !echo {
            continue;
        }
        if let Err(e) = out.write_all(chunk.as_bytes()).and_then(|_| out.flush()) {
            debug!("Output closed, stopping stream: {}", e);
            return;
        }
    }
    if echo {
        let _ = writeln!(out);
    }
}
