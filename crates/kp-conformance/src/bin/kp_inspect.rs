#![forbid(unsafe_code)]

//! Maintenance driver for kernprobe cache files. Operates on the untyped
//! JSON document so one binary serves both cache kinds.

use serde_json::Value;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage());
    }

    let command = args.remove(0);
    match command.as_str() {
        "partitions" => cmd_partitions(args),
        "entries" => cmd_entries(args),
        "verify" => cmd_verify(args),
        _ => Err(usage()),
    }
}

fn load_document(path: &PathBuf) -> Result<Value, String> {
    let raw = std::fs::read(path).map_err(|err| format!("read {}: {err}", path.display()))?;
    serde_json::from_slice(&raw).map_err(|err| format!("parse {}: {err}", path.display()))
}

fn partitions_of(document: &Value) -> Result<&serde_json::Map<String, Value>, String> {
    document
        .get("partitions")
        .and_then(Value::as_object)
        .ok_or_else(|| "document has no partitions object".to_owned())
}

fn cmd_partitions(args: Vec<String>) -> Result<(), String> {
    let path = required_path_flag(&args, "--file")?;
    let document = load_document(&path)?;

    let kind = document
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    println!("{} ({kind} cache)", path.display());

    for (token, snapshot) in partitions_of(&document)? {
        let count = snapshot
            .get("entries")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        println!("  {token}: {count} entrie(s)");
    }
    Ok(())
}

fn cmd_entries(args: Vec<String>) -> Result<(), String> {
    let path = required_path_flag(&args, "--file")?;
    let token = required_string_flag(&args, "--env")?;
    let document = load_document(&path)?;

    let snapshot = partitions_of(&document)?
        .get(&token)
        .ok_or_else(|| format!("no partition for {token}"))?;
    let entries = snapshot
        .get("entries")
        .and_then(Value::as_array)
        .ok_or_else(|| "partition has no entries array".to_owned())?;

    for entry in entries {
        let description = entry
            .pointer("/key/signature/description")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let io = entry
            .pointer("/key/io")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let record = entry.get("record").map_or_else(
            || "?".to_owned(),
            |r| serde_json::to_string(r).unwrap_or_else(|_| "?".to_owned()),
        );
        println!("  {description} io={io} -> {record}");
    }
    Ok(())
}

fn cmd_verify(args: Vec<String>) -> Result<(), String> {
    let path = required_path_flag(&args, "--file")?;
    let expected_kind = optional_string_flag(&args, "--kind")?;
    let document = load_document(&path)?;

    let schema = document
        .get("schema_version")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing schema_version".to_owned())?;
    if schema != kp_cache::SCHEMA_VERSION {
        return Err(format!(
            "schema {schema} (expected {})",
            kp_cache::SCHEMA_VERSION
        ));
    }

    let kind = document
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing kind".to_owned())?;
    if let Some(expected) = expected_kind {
        if kind != expected {
            return Err(format!("holds a {kind} cache (expected {expected})"));
        }
    }

    let mut total = 0_usize;
    for (token, snapshot) in partitions_of(&document)? {
        let entries = snapshot
            .get("entries")
            .and_then(Value::as_array)
            .ok_or_else(|| format!("partition {token} has no entries array"))?;
        for entry in entries {
            if entry.get("key").is_none() || entry.get("record").is_none() {
                return Err(format!("partition {token} has a malformed entry"));
            }
        }
        total += entries.len();
    }

    println!(
        "{}: ok ({kind} cache, {} partition(s), {total} entrie(s))",
        path.display(),
        partitions_of(&document)?.len()
    );
    Ok(())
}

fn required_path_flag(args: &[String], flag: &str) -> Result<PathBuf, String> {
    required_string_flag(args, flag).map(PathBuf::from)
}

fn required_string_flag(args: &[String], flag: &str) -> Result<String, String> {
    optional_string_flag(args, flag)?.ok_or_else(|| format!("missing required flag {flag}"))
}

fn optional_string_flag(args: &[String], flag: &str) -> Result<Option<String>, String> {
    for idx in 0..args.len() {
        if args[idx] == flag {
            if let Some(value) = args.get(idx + 1) {
                return Ok(Some(value.clone()));
            }
            return Err(format!("missing value for {flag}"));
        }
    }
    Ok(None)
}

fn usage() -> String {
    [
        "usage:",
        "  kp_inspect partitions --file <path>",
        "  kp_inspect entries --file <path> --env <token>",
        "  kp_inspect verify --file <path> [--kind cpu|gpu]",
    ]
    .join("\n")
}
