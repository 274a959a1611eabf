//! `languages_extract <Languages.bin> [Languages.bin ...]`
//!
//! Dumps the language list and group/string-id tables to a sibling
//! `.json` file. Per-group text blobs are never decoded; they're carried
//! as base64 so the JSON output stays lossless for encrypted catalogs
//! (component I over G).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use evoeng_extract::languages::LanguagesCatalog;
use serde::Serialize;

#[derive(Serialize)]
struct IdStringJson {
    id: String,
    unk_b64: String,
}

#[derive(Serialize)]
struct GroupJson {
    name: String,
    unk: i32,
    blob_b64: String,
    string_ids: Vec<IdStringJson>,
}

#[derive(Serialize)]
struct CatalogJson {
    format_version: i32,
    is_encrypted: bool,
    languages: Vec<String>,
    groups: Vec<GroupJson>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: languages_extract <Languages.bin> [Languages.bin ...]");
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
    tracing::info!(bin_path, "reading languages catalog");
    let catalog = LanguagesCatalog::parse(BufReader::new(File::open(path)?))?;

    let json = CatalogJson {
        format_version: catalog.format_version,
        is_encrypted: catalog.is_encrypted,
        languages: catalog.languages,
        groups: catalog
            .groups
            .into_iter()
            .map(|g| GroupJson {
                name: g.name,
                unk: g.unk,
                blob_b64: BASE64.encode(&g.blob),
                string_ids: g
                    .string_ids
                    .into_iter()
                    .map(|s| IdStringJson {
                        id: s.id,
                        unk_b64: BASE64.encode(&s.unk),
                    })
                    .collect(),
            })
            .collect(),
    };

    let out_path = path.with_extension("json");
    std::fs::write(&out_path, serde_json::to_vec_pretty(&json)?)?;
    tracing::info!(out_path = %out_path.display(), "wrote summary");
    Ok(())
}
