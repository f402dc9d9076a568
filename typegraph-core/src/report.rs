//! Output formatting - plaintext and JSON.

use serde_json::json;

use crate::builder::BuildResult;
use crate::plugin::GeneratedOutput;

/// Prints a build summary in plain text format.
pub fn print_plain(result: &BuildResult) {
    let stats = &result.stats;
    println!("REGISTRY ({} nodes, fingerprint {}):", stats.registry.nodes, short(&result.fingerprint));
    for (kind, count) in &stats.registry.by_kind {
        println!("- {}: {}", kind, count);
    }
    println!(
        "- enums: {}, placeholders: {}, graph edges: {}",
        stats.registry.enums, stats.registry.placeholders, stats.graph_edges
    );

    let issues = &result.validation.issues;
    if !issues.is_empty() {
        println!("VALIDATION ({}):", issues.len());
        for issue in issues {
            println!("- {}", issue);
        }
    }

    if result.targets.is_empty() {
        println!("No targets ran.");
        return;
    }
    for target in &result.targets {
        let set = &target.inclusion;
        println!(
            "TARGET {} ({} included, {} accepted, {} auto-generated):",
            target.name,
            set.len(),
            set.accepted.len(),
            set.auto_generated.len()
        );
        for name in &set.included {
            match set.depths.get(name) {
                Some(depth) => println!("- {} (depth {})", name, depth),
                None => println!("- {}", name),
            }
        }
        for warning in &set.warnings {
            println!("  warning: {}", warning);
        }
    }
}

/// Prints the build result in JSON format.
///
/// Falls back to a minimal document if serialization fails.
pub fn print_json(result: &BuildResult) {
    let targets: Vec<_> = result
        .targets
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "inclusion": t.inclusion,
                "files": t.output.file_count(),
            })
        })
        .collect();
    let doc = json!({
        "fingerprint": result.fingerprint,
        "stats": result.stats,
        "validation": result.validation,
        "targets": targets,
    });
    match serde_json::to_string_pretty(&doc) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"fingerprint\": {:?}}}", result.fingerprint);
        }
    }
}

/// Prints what each target generated. Single documents go to stdout as is;
/// multi-file output is listed by path.
pub fn print_outputs(result: &BuildResult) {
    for target in &result.targets {
        match &target.output {
            GeneratedOutput::Single(content) => println!("{}", content),
            GeneratedOutput::Files(files) => {
                for file in files {
                    println!("{}: {} bytes", file.path, file.content.len());
                }
            }
        }
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_fingerprint() {
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }
}
