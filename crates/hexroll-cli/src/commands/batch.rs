use crate::cli::BatchArgs;
use crate::config::PartialBatchConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use hexroll::engine::progress::ProgressReporter;
use hexroll::workflows::{self, batch::OutputDirectory};
use tracing::{info, warn};

pub fn run(args: BatchArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialBatchConfig::from_file(path)?,
        None => PartialBatchConfig::default(),
    };
    info!("Merging batch plan from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;
    workflows::batch::check_filenames(&config.entries)?;

    let output = if config.reset {
        OutputDirectory::reset(&config.output_dir)?
    } else {
        info!(
            "Keeping existing files in '{}'.",
            config.output_dir.display()
        );
        OutputDirectory::open(&config.output_dir)?
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Generating {} structure(s) into {}...",
        config.entries.len(),
        output.path().display()
    );
    let report = workflows::batch::run(&config.entries, &output, config.policy, &reporter)?;

    for outcome in report.failed() {
        if let Err(e) = &outcome.result {
            warn!("{} was not written: {}", outcome.filename, e);
            eprintln!("  ✗ {}: {}", outcome.filename, e);
        }
    }
    let written = report.succeeded().count();
    println!(
        "✓ {} structure(s) written to: {}",
        written,
        output.path().display()
    );

    if !report.is_success() {
        return Err(CliError::BatchFailed {
            failed: report.outcomes.len() - written,
            total: report.outcomes.len(),
        });
    }
    Ok(())
}
