use anyhow::{Context, Result};
use phonedb::encoding::{BopomofoEncoder, KeyEncoder};
use phonedb::source::read_tsi_file;
use phonedb::{DictionaryView, TreeIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;

fn parse_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <dictionary.dat> <index_tree.dat> <tsi.src> [--samples N]",
            args[0]
        );
        std::process::exit(2);
    }
    let samples = parse_arg(&args, "--samples").unwrap_or(1000);

    let dict = DictionaryView::open(Path::new(&args[1])).context("Failed to open dictionary")?;
    let tree = TreeIndex::open(Path::new(&args[2])).context("Failed to open index tree")?;
    let phrases = read_tsi_file(Path::new(&args[3])).context("Failed to read phrase source")?;
    if phrases.is_empty() {
        anyhow::bail!("{} holds no phrases", args[3]);
    }

    println!("Loaded {} phrases, {} tree records", phrases.len(), tree.len());
    println!("Testing phone path ↔ dictionary integrity...\n");

    let mut rng = StdRng::seed_from_u64(1);
    let mut passed = 0;
    let mut failed = 0;

    for _ in 0..samples {
        let phrase = &phrases[rng.gen_range(0..phrases.len())];
        let phones: Option<Vec<u16>> = phrase.phones.iter().map(|p| BopomofoEncoder.encode(p)).collect();
        let Some(phones) = phones else {
            println!("FAIL: line {} `{}` has an invalid phone", phrase.line, phrase.text);
            failed += 1;
            continue;
        };
        let Some(node) = tree.lookup(&phones) else {
            println!("FAIL: `{}` {:?} not found in tree", phrase.text, phrase.phones);
            failed += 1;
            continue;
        };
        let mut found = false;
        for (offset, _) in tree.leaves(node) {
            if dict.phrase_at(offset)? == phrase.text {
                found = true;
                break;
            }
        }
        if found {
            passed += 1;
        } else {
            println!("FAIL: `{}` {:?} has no leaf with its text", phrase.text, phrase.phones);
            failed += 1;
        }
    }

    println!("\nResults: {passed} passed, {failed} failed");
    if failed > 0 {
        anyhow::bail!("Integrity check failed with {failed} errors");
    }
    println!("OK: {samples} random phrase lookups passed.");
    Ok(())
}
