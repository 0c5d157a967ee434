//! A small interactive REPL over an in-process [`NamespaceManager`].
//!
//! Nothing here touches disk: the REPL exists to let a user poke at the
//! vector store's behavior directly, the same way the embedded API would
//! be driven from a host application.

use colored::Colorize;
use comfy_table::Table;
use gigavector_core::{DistanceMetric, IndexType, NamespaceConfig, NamespaceManager};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub fn run() -> anyhow::Result<()> {
    let manager = NamespaceManager::new();
    let mut rl = DefaultEditor::new()?;

    println!("{}", "GigaVector REPL. Type 'help' for commands, 'exit' to quit.".bold());

    loop {
        match rl.readline("gigavector> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if matches!(line, "exit" | "quit") {
                    break;
                }
                if let Err(e) = dispatch(&manager, line) {
                    println!("{} {e}", "error:".red().bold());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                println!("{} {e}", "readline error:".red().bold());
                break;
            }
        }
    }
    Ok(())
}

fn dispatch(manager: &NamespaceManager, line: &str) -> anyhow::Result<()> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let rest: Vec<&str> = parts.collect();

    match cmd {
        "help" => print_help(),
        "list" => list(manager),
        "create" => create(manager, &rest)?,
        "info" => info(manager, &rest)?,
        "delete" => delete(manager, &rest)?,
        "insert" => insert(manager, &rest)?,
        "search" => search(manager, &rest)?,
        "vacuum" => vacuum(manager, &rest)?,
        other => anyhow::bail!("unknown command '{other}', type 'help' for the command list"),
    }
    Ok(())
}

fn print_help() {
    println!("  create <name> <dimension> [flat|kdtree|hnsw]  create a namespace");
    println!("  list                                          list namespace names");
    println!("  info <name>                                   show a namespace's bookkeeping");
    println!("  delete <name>                                 delete a namespace");
    println!("  insert <name> <v0> <v1> ...                   insert a vector");
    println!("  search <name> <k> <v0> <v1> ...                k-NN search, euclidean metric");
    println!("  vacuum <name>                                 run one compaction pass");
    println!("  exit                                          leave the REPL");
}

fn list(manager: &NamespaceManager) {
    let names = manager.list();
    if names.is_empty() {
        println!("  (no namespaces)");
        return;
    }
    for name in names {
        println!("  {}", name.green());
    }
}

fn parse_index_type(s: &str) -> anyhow::Result<IndexType> {
    match s.to_lowercase().as_str() {
        "flat" => Ok(IndexType::Flat),
        "kdtree" | "kd-tree" => Ok(IndexType::KdTree),
        "hnsw" => Ok(IndexType::Hnsw),
        other => anyhow::bail!("unknown index type '{other}', expected flat, kdtree, or hnsw"),
    }
}

fn create(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name, dim, rest @ ..] = args else {
        anyhow::bail!("usage: create <name> <dimension> [flat|kdtree|hnsw]");
    };
    let index_type = match rest {
        [t] => parse_index_type(t)?,
        [] => IndexType::Hnsw,
        _ => anyhow::bail!("usage: create <name> <dimension> [flat|kdtree|hnsw]"),
    };
    let config = NamespaceConfig {
        name: Some((*name).to_string()),
        dimension: dim.parse()?,
        index_type,
        ..NamespaceConfig::default()
    };
    manager.create(config)?;
    println!("{} namespace '{name}' created", "ok:".green());
    Ok(())
}

fn info(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name] = args else {
        anyhow::bail!("usage: info <name>");
    };
    let info = manager
        .get_info(name)
        .ok_or_else(|| anyhow::anyhow!("namespace '{name}' not found"))?;

    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["name", &info.name]);
    table.add_row(vec!["dimension", &info.dimension.to_string()]);
    table.add_row(vec!["index_type", &format!("{:?}", info.index_type)]);
    table.add_row(vec!["vector_count", &info.vector_count.to_string()]);
    table.add_row(vec!["max_vectors", &info.max_vectors.to_string()]);
    table.add_row(vec!["max_memory_bytes", &info.max_memory_bytes.to_string()]);
    println!("{table}");
    Ok(())
}

fn delete(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name] = args else {
        anyhow::bail!("usage: delete <name>");
    };
    manager.delete(name);
    println!("{} namespace '{name}' deleted", "ok:".green());
    Ok(())
}

fn parse_vector(parts: &[&str]) -> anyhow::Result<Vec<f32>> {
    parts
        .iter()
        .map(|p| p.parse::<f32>().map_err(anyhow::Error::from))
        .collect()
}

fn insert(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name, vector @ ..] = args else {
        anyhow::bail!("usage: insert <name> <v0> <v1> ...");
    };
    let vector = parse_vector(vector)?;
    let id = manager.add_vector(name, vector)?;
    println!("{} inserted as id {id}", "ok:".green());
    Ok(())
}

fn search(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name, k, vector @ ..] = args else {
        anyhow::bail!("usage: search <name> <k> <v0> <v1> ...");
    };
    let k: usize = k.parse()?;
    let vector = parse_vector(vector)?;

    let collection = manager
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("namespace '{name}' not found"))?;
    let hits = collection.lock().search(&vector, k, DistanceMetric::Euclidean)?;

    if hits.is_empty() {
        println!("  (no hits)");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["id", "distance"]);
    for hit in hits {
        table.add_row(vec![hit.id.to_string(), format!("{:.6}", hit.distance)]);
    }
    println!("{table}");
    Ok(())
}

fn vacuum(manager: &NamespaceManager, args: &[&str]) -> anyhow::Result<()> {
    let [name] = args else {
        anyhow::bail!("usage: vacuum <name>");
    };
    let collection = manager
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("namespace '{name}' not found"))?;
    let vacuum_manager =
        gigavector_core::VacuumManager::new(collection, gigavector_core::VacuumConfig::default());
    vacuum_manager.run()?;
    println!(
        "{} vacuum pass complete, state={:?}",
        "ok:".green(),
        vacuum_manager.state()
    );
    Ok(())
}
