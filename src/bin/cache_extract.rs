//! `cache_extract <file.cache> [file.cache ...]`
//!
//! For each `.cache` archive, reads the sibling `.toc` index and
//! materializes every entry under a directory named after the archive's
//! stem (component I over C).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use evoeng_extract::cache::{self, Toc};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: cache_extract <file.cache> [file.cache ...]");
        return ExitCode::FAILURE;
    }

    let mut had_error = false;
    for cache_path in &args {
        if let Err(e) = extract_one(cache_path) {
            tracing::error!(cache_path, error = %e, "extraction failed");
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn extract_one(cache_path: &str) -> evoeng_extract::Result<()> {
    let path = Path::new(cache_path);
    if path.extension().and_then(|e| e.to_str()) != Some("cache") {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "filename must end in .cache",
        )
        .into());
    }

    let toc_path = path.with_extension("toc");
    let out_dir = path.with_extension("");

    tracing::info!(cache = %path.display(), toc = %toc_path.display(), "reading TOC");
    let toc = Toc::parse(BufReader::new(File::open(&toc_path)?))?;

    let mut cache_file = File::open(path)?;
    cache::extract(&mut cache_file, &toc, &out_dir)?;

    tracing::info!(out_dir = %out_dir.display(), entries = toc.entries.len(), "extraction complete");
    Ok(())
}
