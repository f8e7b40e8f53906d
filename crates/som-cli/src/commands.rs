use std::fs;

use anyhow::Context;
use colored::Colorize;
use som_schema::Repository;
use tracing::debug;

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Schema(args) => cmd_schema(args, &cli.format),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
        Command::Diff(args) => cmd_diff(args),
        Command::Merge(args) => cmd_merge(args),
    }
}

fn load_repository(path: &str) -> anyhow::Result<Repository> {
    let json = fs::read_to_string(path).with_context(|| format!("reading schema {path}"))?;
    let repo = Repository::from_json(&json).with_context(|| format!("loading schema {path}"))?;
    debug!(
        classes = repo.class_count(),
        enums = repo.enum_count(),
        "schema loaded"
    );
    Ok(repo)
}

/// Reads a blob file, unwrapping the compressed envelope if there is one.
fn load_blob(path: &str) -> anyhow::Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("reading blob {path}"))?;
    if som_wire::is_compressed(&bytes) {
        debug!(path, "unwrapping compressed envelope");
        let raw =
            som_wire::decompress(&bytes).with_context(|| format!("decompressing {path}"))?;
        return Ok(raw);
    }
    Ok(bytes)
}

fn cmd_schema(args: SchemaArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let repo = load_repository(&args.file)?;
    match format {
        OutputFormat::Json => {
            let classes: Vec<_> = repo
                .classes()
                .map(|class| {
                    serde_json::json!({
                        "name": class.name,
                        "type_id": class.type_id.to_hex(),
                        "members": class.member_count(),
                    })
                })
                .collect();
            let enums: Vec<_> = repo
                .enums()
                .map(|e| serde_json::json!({ "name": e.name, "type_id": e.type_id.to_hex() }))
                .collect();
            println!(
                "{:#}",
                serde_json::json!({ "classes": classes, "enums": enums })
            );
        }
        OutputFormat::Text => {
            println!(
                "{} Schema valid: {} classes, {} enumerations",
                "✓".green().bold(),
                repo.class_count(),
                repo.enum_count()
            );
            for class in repo.classes() {
                println!(
                    "  {}  {}  {} members",
                    class.type_id.to_string().dimmed(),
                    class.name.cyan(),
                    class.member_count()
                );
            }
            for e in repo.enums() {
                println!(
                    "  {}  {}  enum",
                    e.type_id.to_string().dimmed(),
                    e.name.yellow()
                );
            }
        }
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let repo = load_repository(&args.schema)?;
    let bytes = load_blob(&args.blob)?;
    let node =
        som_wire::from_binary(&repo, &bytes).with_context(|| format!("decoding {}", args.blob))?;
    match format {
        OutputFormat::Json => println!("{:#}", render::to_json(&node)),
        OutputFormat::Text => print!("{}", render::to_text(&node)),
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs) -> anyhow::Result<()> {
    let repo = load_repository(&args.schema)?;
    let target = load_blob(&args.target)?;
    let base = load_blob(&args.base)?;
    let delta = som_diff::diff_blobs(&repo, &target, &base)?;
    fs::write(&args.output, &delta).with_context(|| format!("writing {}", args.output))?;
    println!(
        "{} Delta written to {} ({} bytes)",
        "✓".green().bold(),
        args.output.bold(),
        delta.len()
    );
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let repo = load_repository(&args.schema)?;
    let base = load_blob(&args.base)?;
    let delta = load_blob(&args.delta)?;
    let mut merged =
        som_wire::from_binary(&repo, &base).with_context(|| format!("decoding {}", args.base))?;
    let changes =
        som_wire::from_binary(&repo, &delta).with_context(|| format!("decoding {}", args.delta))?;
    som_merge::merge_changes(&mut merged, &changes)?;
    let bytes = som_wire::to_binary(&merged);
    fs::write(&args.output, &bytes).with_context(|| format!("writing {}", args.output))?;
    println!(
        "{} Merged blob written to {} ({} bytes)",
        "✓".green().bold(),
        args.output.bold(),
        bytes.len()
    );
    Ok(())
}
