//! typegraph CLI - run the type graph pipeline over a declarations file.
//!
//! Features:
//! - JSON declaration input (as produced by a language front end)
//! - `typegraph.toml` discovery next to the input or in a given directory
//! - Built-in manifest target driven by annotation names
//! - Plain or JSON summaries, generated output to stdout or a file

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use typegraph_core::{
    init_structured_logging_with, load_config, print_json, print_outputs, print_plain, CoreConfig,
    Declaration, GeneratedOutput, ManifestPlugin, Typegraph,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Type graph resolution for annotation-driven generators")]
pub struct Cli {
    /// JSON file holding an array of declarations
    declarations: String,

    /// Directory containing typegraph.toml (defaults to the declarations file's directory)
    #[arg(long)]
    config_dir: Option<String>,

    /// Explicit configuration file, overrides --config-dir
    #[arg(long)]
    config: Option<String>,

    /// Name of the manifest target (also its override key under [targets])
    #[arg(long, default_value = "manifest")]
    target: String,

    /// Annotations that select nodes for the manifest target
    #[arg(long = "annotation", num_args = 1.., default_values_t = vec!["model".to_string()])]
    annotations: Vec<String>,

    /// Output the build summary in JSON format
    #[arg(long)]
    json: bool,

    /// Print the generated output instead of a summary
    #[arg(long)]
    emit: bool,

    /// Write the generated manifest to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<String>,

    /// Stop after registration and validation
    #[arg(long)]
    register_only: bool,
}

/// Security: Validates output file paths to prevent path traversal attacks.
///
/// Rejects:
/// - Absolute paths (must be relative to current directory)
/// - Paths containing `..` (parent directory traversal)
/// - Paths with null bytes (injection attacks)
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(anyhow!("Output path must be relative, not absolute: {}", path));
    }
    if p.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err(anyhow!("Path traversal (..) not allowed in output paths: {}", path));
    }
    Ok(p)
}

/// Configuration from an explicit file, else typegraph.toml in the chosen
/// directory, else defaults.
fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    if let Some(file) = &cli.config {
        let content = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
        return CoreConfig::from_toml_str(&content).with_context(|| format!("Invalid configuration in {}", file));
    }

    let dir = match &cli.config_dir {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(&cli.declarations)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    Ok(load_config(&dir)?.unwrap_or_default())
}

fn read_declarations(path: &str) -> Result<Vec<Declaration>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read declarations from {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid declarations JSON in {}", path))
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] typegraph internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // Structured logging (JSON to stderr, RUST_LOG wins over the configured level)
    init_structured_logging_with(config.log_level);

    let declarations = read_declarations(&cli.declarations)?;
    let annotations: Vec<&str> = cli.annotations.iter().map(String::as_str).collect();

    let mut builder = Typegraph::new(config)
        .declarations(declarations)
        .plugin(ManifestPlugin::new(cli.target.as_str(), &annotations));
    if cli.register_only {
        builder = builder.register_only();
    }
    let result = builder.run().context("typegraph run failed")?;

    if let Some(out) = &cli.out {
        let path = validate_output_path(out)?;
        let target = result
            .target(&cli.target)
            .ok_or_else(|| anyhow!("Target '{}' produced no output", cli.target))?;
        let GeneratedOutput::Single(content) = &target.output else {
            return Err(anyhow!("Target '{}' produced multiple files", cli.target));
        };
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Manifest written to: {}", path.display());
    } else if cli.emit {
        print_outputs(&result);
    } else if cli.json {
        print_json(&result);
    } else {
        print_plain(&result);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_output_path() {
        assert!(validate_output_path("manifest.json").is_ok());
        assert!(validate_output_path("out/manifest.json").is_ok());
        assert!(validate_output_path("../manifest.json").is_err());
        assert!(validate_output_path("/tmp/manifest.json").is_err());
        assert!(validate_output_path("a\0b").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["typegraph", "decls.json"]);
        assert_eq!(cli.target, "manifest");
        assert_eq!(cli.annotations, vec!["model"]);
        assert!(!cli.json);

        let cli = Cli::parse_from(["typegraph", "decls.json", "--annotation", "schema", "api", "--json"]);
        assert_eq!(cli.annotations, vec!["schema", "api"]);
        assert!(cli.json);
    }
}
