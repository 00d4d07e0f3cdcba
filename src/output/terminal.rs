// Colored terminal output for topic summaries and run results.
//
// This module handles all terminal-specific formatting: colors, tables and
// the per-artifact save lines. The pipeline and main.rs delegate here.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;

use crate::render::Artifact;
use crate::topics::{TopicInfoRow, NOISE_TOPIC};

/// Display the topic count and how documents are spread over topics.
pub fn display_topic_summary(topic_count: usize, distribution: &BTreeMap<i32, usize>) {
    let total: usize = distribution.values().sum();
    let outliers = distribution.get(&NOISE_TOPIC).copied().unwrap_or(0);

    println!(
        "\n{}",
        format!("Found {topic_count} topics ({outliers} outlier documents)").bold()
    );

    let bar_width: usize = 20;
    for (&topic, &count) in distribution {
        let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        let filled = (share * bar_width as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled),
            " ".repeat(bar_width.saturating_sub(filled))
        );
        let colored_bar = if topic == NOISE_TOPIC {
            bar.dimmed()
        } else if share >= 0.25 {
            bar.bright_green()
        } else if share >= 0.10 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };
        println!("  {:>4}  {} {:>5}", topic, colored_bar, count);
    }
}

/// Display the topic info table.
pub fn display_topic_info(rows: &[TopicInfoRow]) {
    println!("\n{}", "Topics found:".bold());
    println!(
        "  {:>5}  {:>6}  {:<40} {}",
        "Topic".dimmed(),
        "Count".dimmed(),
        "Name".dimmed(),
        "Representation".dimmed(),
    );
    println!("  {}", "-".repeat(96).dimmed());

    for row in rows {
        let name = super::truncate_chars(&row.name, 38);
        let words = super::truncate_chars(&row.representation.join(", "), 60);
        let name = if row.topic == NOISE_TOPIC {
            name.dimmed()
        } else {
            name.normal()
        };
        println!("  {:>5}  {:>6}  {:<40} {}", row.topic, row.count, name, words);
        if let Some(doc) = row.representative_docs.first() {
            println!("  {:>15}{}", "", super::truncate_chars(doc, 80).dimmed());
        }
    }
    println!();
}

/// Indented topic tree, printed when the dendrogram could not be written.
pub fn display_topic_tree(tree: &str) {
    println!("{}", "Topic tree:".bold());
    for line in tree.lines() {
        println!("  {line}");
    }
    println!();
}

/// One "saved" line per written artifact.
pub fn display_saved(path: &Path) {
    println!("{} Saved {}", "✓".green(), path.display());
}

/// Report a failed artifact with its full error chain.
pub fn display_visualization_error(artifact: Artifact, error: &anyhow::Error) {
    println!(
        "\n{} Error during visualization ({}): {}",
        "⚠".yellow().bold(),
        artifact,
        error
    );
    println!("Traceback:\n{error:?}");
}

/// Closing hint listing the files to open.
pub fn display_view_hint(saved: &[(Artifact, &Path)]) {
    if saved.is_empty() {
        return;
    }
    println!("\nView the following files in your browser:");
    for (artifact, path) in saved {
        println!("  - {} ({})", path.display(), artifact.description());
    }
}
