use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Weak};

use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use thumbnail_loader::{HeadlessDevice, Loader, LoaderConfig, RenderDevice, Result};

/// Load thumbnails for files and folders on a headless device
#[derive(Parser, Debug)]
#[command(name = "thumbnail-loader", version, about)]
struct Args {
    /// Overrides the configured thumbnail root
    #[arg(long = "thumbnails", value_name = "DIR")]
    thumbnail_directory: Option<PathBuf>,

    /// Files, or folders to scan recursively
    #[arg(required = true, value_name = "PATH")]
    inputs: Vec<PathBuf>,
}

/// Expand folders into the files they contain, sorted and de-duplicated
fn collect_paths(inputs: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut paths = BTreeSet::new();

    for input in inputs {
        if !input.is_dir() {
            paths.insert(input.clone());
            continue;
        }

        for entry in WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                paths.insert(entry.into_path());
            }
        }
    }

    paths
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = LoaderConfig::load_or_default()?;
    if let Some(dir) = args.thumbnail_directory {
        config.thumbnail_directory = dir;
    }

    // Owns the device for the whole run; the loader only borrows it weakly
    let device = Arc::new(HeadlessDevice::new());
    let weak: Weak<dyn RenderDevice> = Arc::downgrade(&device) as Weak<dyn RenderDevice>;
    let loader = Loader::start(weak, config)?;

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    loader.subscribe(move |result| {
        let sizes: Vec<String> = result
            .thumbnails
            .iter()
            .map(|t| format!("{}x{}", t.width(), t.height()))
            .collect();

        if result.thumbnails.is_empty() {
            warn!(path = %result.path().display(), "no thumbnails");
        } else {
            info!(
                path = %result.path().display(),
                count = result.thumbnails.len(),
                sizes = %sizes.join(", "),
                "thumbnails loaded"
            );
        }
        let _ = tx.lock().send(());
    });

    let paths = collect_paths(&args.inputs);
    let queued = loader.enqueue(&paths);
    info!(queued, "queued thumbnail requests");

    for _ in 0..queued {
        if rx.recv().is_err() {
            break;
        }
    }

    let stats = loader.stats();
    info!(
        serviced = stats.serviced,
        thumbnails = stats.thumbnails,
        failed = stats.failed_candidates,
        resident = device.texture_count(),
        "done"
    );

    loader.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_inputs_are_required() {
        let err = Args::try_parse_from(["thumbnail-loader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["thumbnail-loader", "--thumbnails", "thumbs"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_thumbnail_override_and_inputs() {
        let args =
            Args::try_parse_from(["thumbnail-loader", "--thumbnails", "thumbs", "a.png", "shots"])
                .unwrap();
        assert_eq!(args.thumbnail_directory, Some(PathBuf::from("thumbs")));
        assert_eq!(args.inputs, vec![PathBuf::from("a.png"), PathBuf::from("shots")]);

        let args = Args::try_parse_from(["thumbnail-loader", "a.png"]).unwrap();
        assert_eq!(args.thumbnail_directory, None);
    }
}
