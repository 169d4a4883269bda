//! # Import Bundle Validator
//!
//! A command-line utility for checking partial import bundles before they are
//! submitted to a realm.
//!
//! ## Overview
//!
//! Each bundle is parsed and previewed against an empty realm, which reports:
//! - JSON syntax and shape errors
//! - Items without a natural key (`clientId`, `alias`, `username`)
//! - Natural keys submitted more than once in the same bundle
//! - Internal ids (`id`, `internalId`) claimed by more than one item
//!
//! Conflicts with resources already stored in a live realm cannot be seen
//! offline; they are reported by the import itself.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin bundle-validator realm-export.json
//! cargo run --bin bundle-validator ./bundles/
//! ```
//!
//! ## Output Examples
//!
//! ```text
//! Validating bundle file: realm-export.json
//! ✓ Bundle is valid!
//!
//! Bundle Summary:
//!   Overwrite: false
//!   CLIENT: 2 items
//!   IDP: 1 items
//!   USER: 14 items
//! ```
//!
//! ```text
//! Validating bundle file: broken.json
//! ❌ Bundle would be rejected:
//!   - USER #3: User 'alice' appears more than once in the import (first at position 0)
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All bundles are valid
//! - `1`: One or more bundles are invalid or could not be read

use realm_import::resource::ResourceKind;
use realm_import::storage::InMemoryStorage;
use realm_import::{ImportCoordinator, PartialImport, ResolutionReport};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

const OFFLINE_REALM: &str = "bundle-validator";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <bundle-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} realm-export.json", args[0]);
        eprintln!("  {} ./bundles/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());

    let valid = if path.is_file() {
        validate_single_file(&coordinator, path).await
    } else if path.is_dir() {
        validate_directory(&coordinator, path).await
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        false
    };

    if !valid {
        process::exit(1);
    }
}

async fn validate_single_file(
    coordinator: &ImportCoordinator<InMemoryStorage>,
    file_path: &Path,
) -> bool {
    println!("Validating bundle file: {}", file_path.display());

    match load_and_preview(coordinator, file_path).await {
        Ok((bundle, report)) if !report.is_blocked() => {
            println!("✓ Bundle is valid!");
            println!();
            print_summary(&bundle);
            true
        }
        Ok((_, report)) => {
            println!("❌ Bundle would be rejected:");
            for decision in report.blocking() {
                println!(
                    "  - {} #{}: {}",
                    decision.kind,
                    decision.index,
                    decision.message()
                );
            }
            false
        }
        Err(e) => {
            println!("❌ Bundle validation failed: {}", e);
            false
        }
    }
}

async fn validate_directory(
    coordinator: &ImportCoordinator<InMemoryStorage>,
    dir_path: &Path,
) -> bool {
    println!("Validating bundles in directory: {}", dir_path.display());
    println!();

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            return false;
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut valid_count = 0;
    let mut invalid_count = 0;

    for path in &paths {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("Validating: {}", name);

        match load_and_preview(coordinator, path).await {
            Ok((bundle, report)) if !report.is_blocked() => {
                println!("  ✓ Valid - {} items", bundle.total_items());
                valid_count += 1;
            }
            Ok((_, report)) => {
                println!("  ❌ {} blocking problems", report.blocking().len());
                for decision in report.blocking() {
                    println!("     {}", decision.message());
                }
                invalid_count += 1;
            }
            Err(e) => {
                println!("  ❌ Invalid - {}", e);
                invalid_count += 1;
            }
        }
        println!();
    }

    println!("Validation Summary:");
    println!("  Valid bundles: {}", valid_count);
    println!("  Invalid bundles: {}", invalid_count);

    invalid_count == 0
}

async fn load_and_preview(
    coordinator: &ImportCoordinator<InMemoryStorage>,
    file_path: &Path,
) -> Result<(PartialImport, ResolutionReport), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let bundle = PartialImport::from_json(&content)?;
    let report = coordinator.preview(OFFLINE_REALM, &bundle).await?;
    Ok((bundle, report))
}

fn print_summary(bundle: &PartialImport) {
    println!("Bundle Summary:");
    println!("  Overwrite: {}", bundle.overwrite);
    for kind in ResourceKind::ALL {
        println!("  {}: {} items", kind, bundle.item_count(kind));
    }
}
