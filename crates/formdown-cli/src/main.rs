//! Thin command-line wrapper over the engine's tool contract. All the real
//! work happens in `formdown-engine`; this binary only reads files, calls
//! inspect/apply/export/serialize, and prints JSON.

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use formdown_config::Config;
use formdown_engine::patch::Patch;
use formdown_engine::{
    InspectOptions, apply_patches, export_friendly, export_json, inspect_with, io,
};

const USAGE: &str = "\
Usage: formdown <command> [args]

Commands:
  inspect <file> [--role <role>]   Summaries, prioritized issues, completion
  apply <file> <patches.json>      Apply a patch batch and rewrite the file
  export <file> [--friendly]       Export schema and values as JSON
  fmt <file>                       Rewrite the file in canonical form
  list [dir]                       List .form.md files under a directory
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("inspect") => cmd_inspect(&args[1..]),
        Some("apply") => cmd_apply(&args[1..]),
        Some("export") => cmd_export(&args[1..]),
        Some("fmt") => cmd_fmt(&args[1..]),
        Some("list") => cmd_list(&args[1..]),
        _ => {
            eprint!("{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn cmd_inspect(args: &[String]) -> Result<()> {
    let (path, role_flag) = parse_file_and_flag(args, "--role")?;
    let role = match role_flag {
        Some(role) => Some(role),
        None => Config::load().ok().flatten().and_then(|c| c.default_role),
    };
    let form = io::read_form(&path)?;
    let result = inspect_with(&form, &InspectOptions { role });
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_apply(args: &[String]) -> Result<()> {
    let [file, patches_file] = args else {
        bail!("apply needs <file> and <patches.json>");
    };
    let path = PathBuf::from(file);
    let patches_text = std::fs::read_to_string(patches_file)
        .with_context(|| format!("reading {patches_file}"))?;
    let patches: Vec<Patch> =
        serde_json::from_str(&patches_text).context("parsing patch batch")?;

    let form = io::read_form(&path)?;
    let result = apply_patches(&form, &patches);
    let applied = result.errors.is_empty();
    if applied {
        io::write_form(&path, &result.form)?;
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": result.status,
            "issues": result.issues,
            "errors": result.errors,
        }))?
    );
    if !applied {
        process::exit(1);
    }
    Ok(())
}

fn cmd_export(args: &[String]) -> Result<()> {
    let (path, friendly) = match args {
        [file] => (PathBuf::from(file), false),
        [file, flag] if flag == "--friendly" => (PathBuf::from(file), true),
        _ => bail!("export needs <file> [--friendly]"),
    };
    let form = io::read_form(&path)?;
    let json = if friendly {
        serde_json::to_string_pretty(&export_friendly(&form))?
    } else {
        serde_json::to_string_pretty(&export_json(&form))?
    };
    println!("{json}");
    Ok(())
}

fn cmd_fmt(args: &[String]) -> Result<()> {
    let [file] = args else {
        bail!("fmt needs <file>");
    };
    let path = Path::new(file);
    let form = io::read_form(path)?;
    io::write_form(path, &form)?;
    Ok(())
}

fn cmd_list(args: &[String]) -> Result<()> {
    let root = match args {
        [] => Config::load()
            .ok()
            .flatten()
            .and_then(|c| c.forms_path)
            .context("no directory given and no forms_path configured")?,
        [dir] => PathBuf::from(dir),
        _ => bail!("list takes at most one directory"),
    };
    for file in io::scan_form_files(&root)? {
        println!("{}", file.display());
    }
    Ok(())
}

fn parse_file_and_flag(args: &[String], flag: &str) -> Result<(PathBuf, Option<String>)> {
    match args {
        [file] => Ok((PathBuf::from(file), None)),
        [file, name, value] if name == flag => {
            Ok((PathBuf::from(file), Some(value.clone())))
        }
        _ => bail!("expected <file> [{flag} <value>]"),
    }
}
