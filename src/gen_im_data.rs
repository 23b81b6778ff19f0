//! Usage: cargo run --release --bin gen_im_data <table.cin> [-w|--show-warning] [--data-dir dir] [--config build.toml]

use anyhow::{Context, Result};
use phonedb::config::{DICT_FILE, FREQ_FILE};
use phonedb::reader::read_freq_log;
use phonedb::source::read_cin_file;
use phonedb::{build_im_index, BuildConfig, DictionaryView};
use std::path::{Path, PathBuf};

const CIN_EXTENSION: &str = ".cin";

fn parse_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(cin_path) = args
        .iter()
        .skip(1)
        .find(|a| a.len() > CIN_EXTENSION.len() && a.ends_with(CIN_EXTENSION))
    else {
        eprintln!(
            "Usage: {} <cin_filename> [-w|--show-warning] [--data-dir dir] [--config build.toml]",
            args[0]
        );
        std::process::exit(2);
    };
    let cin_path = Path::new(cin_path);
    let show_warning = args.iter().any(|a| a == "-w" || a == "--show-warning");

    let config = BuildConfig::load(parse_arg(&args, "--config").map(Path::new))
        .context("Failed to load config")?;
    let data_dir = parse_arg(&args, "--data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output.dir.clone());

    let cin = read_cin_file(cin_path).with_context(|| format!("read {}", cin_path.display()))?;
    let name = match &cin.ename {
        Some(name) => name.clone(),
        None => cin_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("cannot name the input method")?,
    };
    println!("Loaded {} words of {}", cin.words.len(), name);

    let dictionary = DictionaryView::open(&data_dir.join(DICT_FILE))
        .context("Failed to open dictionary")?;
    let freq_log = read_freq_log(&data_dir.join(FREQ_FILE))
        .context("Failed to open frequency log")?;

    let index = build_im_index(&config, &cin, &name, &dictionary, &freq_log, show_warning)?;
    let path = index.write(&data_dir)?;

    println!("  Indexed: {}", index.stats.words);
    println!("  Skipped: {}", index.stats.skipped);
    println!("✓ {} created ({} records)", path.display(), index.stats.tree_records);
    Ok(())
}
