use anyhow::{Context, Result};
use phonedb::{DictionaryView, TreeIndex};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
#[serde(untagged)]
enum DumpNode<'a> {
    Internal {
        key: u16,
        begin: usize,
        end: usize,
        children: Vec<DumpNode<'a>>,
    },
    Leaf {
        phrase: &'a str,
        freq: u32,
    },
}

fn gather<'a, D: AsRef<[u8]>, E: AsRef<[u8]>>(
    tree: &TreeIndex<D>,
    dict: &'a DictionaryView<E>,
    pos: usize,
) -> Result<DumpNode<'a>> {
    let node = tree.node(pos).with_context(|| format!("record {pos} out of range"))?;
    if let Some((offset, freq)) = node.phrase() {
        return Ok(DumpNode::Leaf { phrase: dict.phrase_at(offset)?, freq });
    }
    let range = tree.children(pos)?;
    let children = range
        .clone()
        .map(|i| gather(tree, dict, i))
        .collect::<Result<Vec<_>>>()?;
    Ok(DumpNode::Internal { key: node.key, begin: range.start, end: range.end, children })
}

fn print(out: &mut impl Write, node: &DumpNode, indent: usize) -> std::io::Result<()> {
    for _ in 0..indent {
        out.write_all(b"    ")?;
    }
    match node {
        DumpNode::Internal { key, begin, end, children } => {
            writeln!(out, "key={key} begin={begin} end={end}")?;
            for child in children {
                print(out, child, indent + 1)?;
            }
        }
        DumpNode::Leaf { phrase, freq } => writeln!(out, "phrase={phrase} freq={freq}")?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let json = args.iter().any(|a| a == "--json");
    let files: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
    if files.len() != 2 {
        eprintln!("Usage: {} <dictionary.dat> <index_tree.dat> [--json]", args[0]);
        eprintln!("This program dumps the entire index structure to stdout.");
        std::process::exit(2);
    }

    let dict = DictionaryView::open(Path::new(files[0]))
        .with_context(|| format!("open {}", files[0]))?;
    let tree = TreeIndex::open(Path::new(files[1]))
        .with_context(|| format!("open {}", files[1]))?;

    let root = gather(&tree, &dict, 0)?;
    let mut out = BufWriter::new(std::io::stdout().lock());
    if json {
        serde_json::to_writer_pretty(&mut out, &root)?;
        writeln!(out)?;
    } else {
        print(&mut out, &root, 0)?;
    }
    out.flush()?;
    Ok(())
}
