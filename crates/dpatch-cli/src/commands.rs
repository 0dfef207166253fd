use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use dpatch_diff::{PatchGenerator, PatchStats};
use dpatch_schema::{PatchSchema, TypeRegistry};
use dpatch_types::{FieldChange, FieldChangeKind, ItemOp, ItemOpKind, Patch, Scope, SetChange};
use serde_json::Value;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &cli.format),
        Command::Stats(args) => cmd_stats(args, &cli.format),
        Command::Schema(args) => cmd_schema(args),
    }
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let patch = diff_files(&args)?;
    match format {
        OutputFormat::Json => println!("{}", patch.to_json_pretty()?),
        OutputFormat::Text => print_patch(&patch),
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let patch = read_patch(&args.patch)?;
    let stats = PatchStats::from_patch(&patch);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print_stats(&stats),
    }
    Ok(())
}

fn cmd_schema(args: SchemaArgs) -> anyhow::Result<()> {
    if args.types {
        print!("{}", toml::to_string_pretty(&TypeRegistry::builtin())?);
    } else {
        print!("{}", PatchSchema::default().to_toml_string()?);
    }
    Ok(())
}

/// Load both documents plus optional schema and types, and generate the patch.
pub fn diff_files(args: &DiffArgs) -> anyhow::Result<Patch> {
    let schema = load_schema(args.schema.as_deref())?;
    let registry = load_registry(args.types.as_deref())?;
    let origin = load_document(&args.origin)?;
    let modified = load_document(&args.modified)?;
    let patch = PatchGenerator::new(&schema, &registry)
        .generate(&origin, &modified)
        .context("failed to generate patch")?;
    Ok(patch)
}

/// Read a document; `.toml` files are TOML, anything else JSON.
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let text = read(path)?;
    let value: Value = if is_toml(path) {
        toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    debug!(path = %path.display(), "loaded document");
    Ok(value)
}

pub fn load_schema(path: Option<&Path>) -> anyhow::Result<PatchSchema> {
    let Some(path) = path else {
        return Ok(PatchSchema::default());
    };
    let text = read(path)?;
    let schema = if is_toml(path) {
        PatchSchema::from_toml_str(&text)
    } else {
        PatchSchema::from_json_str(&text)
    };
    schema.with_context(|| format!("invalid schema in {}", path.display()))
}

/// The built-in item types, with the types from `path` merged over them.
pub fn load_registry(path: Option<&Path>) -> anyhow::Result<TypeRegistry> {
    let mut registry = TypeRegistry::builtin();
    if let Some(path) = path {
        let text = read(path)?;
        let extra = if is_toml(path) {
            TypeRegistry::from_toml_str(&text)
        } else {
            TypeRegistry::from_json_str(&text)
        }
        .with_context(|| format!("invalid item types in {}", path.display()))?;
        debug!(path = %path.display(), types = extra.len(), "loaded item types");
        registry.merge(extra);
    }
    Ok(registry)
}

pub fn read_patch(path: &Path) -> anyhow::Result<Patch> {
    let text = read(path)?;
    Patch::from_json_str(&text).with_context(|| format!("invalid patch in {}", path.display()))
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn print_patch(patch: &Patch) {
    if patch.is_empty() {
        println!("{} No changes.", "✓".green());
        return;
    }
    if !patch.doc.is_empty() {
        println!("{}", "Document".bold());
        for change in &patch.doc {
            print_change(change, 1);
        }
    }
    if !patch.items.is_empty() {
        println!("{}", "Items".bold());
        for op in &patch.items {
            print_op(op, 1);
        }
    }
}

fn print_op(op: &ItemOp, depth: usize) {
    let indent = "  ".repeat(depth);
    let id = op.id.bold();
    match &op.kind {
        ItemOpKind::Add { parent_id, sort_order, .. } => {
            println!("{indent}{} {id} at {}", "+".green(), slot(parent_id.as_ref(), *sort_order))
        }
        ItemOpKind::Delete => println!("{indent}{} {id}", "-".red()),
        ItemOpKind::Reorder { parent_id, sort_order } => {
            println!("{indent}{} {id} to {}", "↕".cyan(), slot(parent_id.as_ref(), *sort_order))
        }
        ItemOpKind::Mount { parent_id, sort_order } => {
            println!("{indent}{} {id} mounted at {}", "→".cyan(), slot(Some(parent_id), *sort_order))
        }
        ItemOpKind::Demount { parent_id } => {
            println!("{indent}{} {id} demounted from {}", "←".cyan(), parent_id)
        }
        ItemOpKind::Modify { changes } => {
            println!("{indent}{} {id}", "~".yellow());
            for change in changes {
                print_change(change, depth + 1);
            }
        }
    }
}

fn print_change(change: &FieldChange, depth: usize) {
    let indent = "  ".repeat(depth);
    let path = change.dotted_path();
    match &change.kind {
        FieldChangeKind::Replace { value } => println!("{indent}{} = {}", path.yellow(), value),
        FieldChangeKind::SetPatch { changes } => {
            let elements: Vec<String> = changes
                .iter()
                .map(|c| match c {
                    SetChange::Add { value } => format!("+{value}").green().to_string(),
                    SetChange::Delete { value } => format!("-{value}").red().to_string(),
                })
                .collect();
            println!("{indent}{} {}", path.yellow(), elements.join(" "));
        }
        FieldChangeKind::IdArrayPatch { changes } => {
            println!("{indent}{}", path.yellow());
            for op in changes {
                print_op(op, depth + 1);
            }
        }
    }
}

fn slot(parent: Option<&Scope>, sort_order: usize) -> String {
    match parent {
        Some(scope) => format!("{scope}[{sort_order}]"),
        None => format!("[{sort_order}]"),
    }
}

fn print_stats(stats: &PatchStats) {
    println!("Document: {} field changes", stats.document.field_changes.to_string().bold());
    for field in &stats.document.fields {
        println!("  {} {}", "~".yellow(), field);
    }
    let items = &stats.items;
    println!(
        "Items: {} added, {} deleted, {} modified",
        items.added.count.to_string().green(),
        items.deleted.count.to_string().red(),
        items.modified.count.to_string().yellow()
    );
    for id in &items.added.items {
        println!("  {} {}", "+".green(), id);
    }
    for id in &items.deleted.items {
        println!("  {} {}", "-".red(), id);
    }
    for item in &items.modified.items {
        if item.fields.is_empty() {
            println!("  {} {}", "~".yellow(), item.id);
        } else {
            println!("  {} {}: {}", "~".yellow(), item.id, item.fields.join(", "));
        }
    }
}
