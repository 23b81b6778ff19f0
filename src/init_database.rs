//! Build the phonetic database.
//!
//! Usage: cargo run --release --bin init_database <phone.cin> <tsi.src> [--config build.toml]

use anyhow::{Context, Result};
use phonedb::{build, BuildConfig};
use std::path::Path;
use std::time::Instant;

fn parse_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let inputs = positional(&args);
    if inputs.len() != 2 {
        eprintln!("Usage: {} <phone.cin> <tsi.src> [--config build.toml]", args[0]);
        std::process::exit(2);
    }
    let (cin_path, tsi_path) = (Path::new(inputs[0]), Path::new(inputs[1]));

    let config = BuildConfig::load(parse_arg(&args, "--config").map(Path::new))
        .context("Failed to load config")?;

    println!("Building from {} and {}...", cin_path.display(), tsi_path.display());
    let start = Instant::now();
    let (database, written) = build(&config, cin_path, tsi_path)
        .with_context(|| format!("build from {} failed", tsi_path.display()))?;

    let stats = &database.stats;
    println!("  Words:          {}", stats.words);
    println!("  Phrases:        {}", stats.phrases);
    println!("  Internal nodes: {}", stats.internal_nodes);
    println!("  Leaves:         {}", stats.leaves);
    println!("  Unique strings: {}", stats.unique_strings);
    println!();
    for path in &written {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!("✓ {} created ({:.2} MB)", path.display(), size as f64 / 1024.0 / 1024.0);
    }
    println!("Done in {:.2?}", start.elapsed());
    Ok(())
}
