//! `packages_extract <Packages.bin> [Packages.bin ...]`
//!
//! For each catalog, writes one resolved `.json` value tree per package
//! (inheritance already applied) under a directory named after the
//! catalog's stem, plus a `_summary.json` listing every package and
//! whether its resolution succeeded (component I over D/F).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use evoeng_extract::packages::PackagesCatalog;
use serde::Serialize;

#[derive(Serialize)]
struct PackageSummary {
    full_path: String,
    header_path: String,
    name: String,
    parent_path: String,
    resolved: bool,
    error: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: packages_extract <Packages.bin> [Packages.bin ...]");
        return ExitCode::FAILURE;
    }

    let mut had_error = false;
    for bin_path in &args {
        if let Err(e) = extract_one(bin_path) {
            tracing::error!(bin_path, error = %e, "extraction failed");
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn extract_one(bin_path: &str) -> evoeng_extract::Result<()> {
    let path = Path::new(bin_path);
    tracing::info!(bin_path, "reading packages catalog");
    let catalog = PackagesCatalog::parse(BufReader::new(File::open(path)?))?;
    tracing::info!(count = catalog.len(), "parsed packages");

    let out_dir = path.with_extension("");
    fs::create_dir_all(&out_dir)?;

    let mut summary = Vec::with_capacity(catalog.len());
    for pkg in catalog.iter() {
        let full_path = pkg.full_path();
        let local_name = full_path.trim_start_matches('/').replace('/', "_");

        match catalog.get_full_content(pkg) {
            Ok(content) => {
                let json = serde_json::to_vec_pretty(&content)?;
                fs::write(out_dir.join(format!("{local_name}.json")), json)?;
                summary.push(PackageSummary {
                    full_path,
                    header_path: pkg.header_path.clone(),
                    name: pkg.name.clone(),
                    parent_path: pkg.parent_path.clone(),
                    resolved: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(full_path = %full_path, error = %e, "failed to resolve package");
                summary.push(PackageSummary {
                    full_path,
                    header_path: pkg.header_path.clone(),
                    name: pkg.name.clone(),
                    parent_path: pkg.parent_path.clone(),
                    resolved: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let summary_json = serde_json::to_vec_pretty(&summary)?;
    fs::write(out_dir.join("_summary.json"), summary_json)?;
    Ok(())
}
