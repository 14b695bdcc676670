use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use grf_core::extract::{ExtractEvent, ExtractMode};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use crate::UnpackCommand;

fn output_path(output: &Option<PathBuf>, input: &Path) -> PathBuf {
    if let Some(output) = output {
        // specified output directory
        output.clone()
    } else if let Some(parent) = input.parent() {
        // relative to input directory
        let dir_name = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("output".to_string());
        parent.join(dir_name)
    } else {
        // current directory
        ".".into()
    }
}

pub fn unpack(cmd: &UnpackCommand, no_mmap: bool) -> anyhow::Result<()> {
    let grf = crate::open(&cmd.input, no_mmap)?;
    let output_path = output_path(&cmd.output, &cmd.input);
    tracing::debug!(input = %cmd.input.display(), output = %output_path.display(), "unpacking");

    let filter = cmd
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("Invalid filter regex")?;

    let bar = ProgressBar::new(grf.count() as u64);
    bar.set_style(
        ProgressStyle::default_bar().template("{pos}/{len} files written {wide_bar} elapsed: {elapsed} eta: {eta}")?,
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.println(format!("Output directory: `{}`", output_path.display()));

    let mut extractor = grf
        .extractor(&output_path)
        .mode(ExtractMode::Parallel)
        .overwrite(cmd.r#override)
        .continue_on_error(cmd.ignore_error);
    if let Some(threads) = cmd.threads {
        extractor = extractor.threads(threads);
    }
    if let Some(filter) = filter {
        extractor = extractor.filter(move |entry| filter.is_match(entry.path()));
    }

    let bar1 = bar.clone();
    let report = extractor
        .on_event(move |event| match event {
            ExtractEvent::Start { total } => bar1.set_length(total as u64),
            ExtractEvent::FileDone { path, error } => {
                if let Some(error) = error {
                    bar1.println(format!("Error processing entry `{}`: {}", path.display(), error));
                }
                bar1.inc(1);
            }
            _ => {}
        })
        .run()
        .context("Unpack failed")?;

    bar.finish();

    if report.failed > 0 {
        println!("Done with {} errors", report.failed);
    } else {
        println!("Done. {} files written, {} skipped.", report.extracted, report.skipped);
    }

    Ok(())
}
