//! Colored console output for the storage decoder.
//!
//! Color scheme: blue+bold headers, cyan values, green strings,
//! yellow booleans, dimmed labels and secondary text.

use crate::layout::StorageLayout;
use crate::path::PathSegment;
use crate::reader::CacheStats;
use crate::value::DecodedValue;
use alloy_primitives::Address;
use colored::Colorize;

// ── Helpers ────────────────────────────────────────────────────────

/// Render a variable path the way Solidity source would: `mapFun[0][1].e`.
pub fn format_path(variable: &str, path: &[PathSegment]) -> String {
    let mut rendered = variable.to_string();
    for segment in path {
        rendered.push_str(&segment.to_string());
    }
    rendered
}

/// Multi-line colored rendering of a decoded value.
pub fn format_value(value: &DecodedValue) -> String {
    render(value, 0)
}

fn render(value: &DecodedValue, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let inner = "  ".repeat(depth + 1);
    match value {
        DecodedValue::Struct(members) if members.is_empty() => "{}".dimmed().to_string(),
        DecodedValue::Struct(members) => {
            let lines: Vec<String> = members
                .iter()
                .map(|(label, member)| format!("{inner}{}: {}", label.dimmed(), render(member, depth + 1)))
                .collect();
            format!("{{\n{}\n{indent}}}", lines.join("\n"))
        }
        DecodedValue::Array(items) if items.is_empty() => "[]".dimmed().to_string(),
        DecodedValue::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{inner}{} {}", format!("[{i}]").dimmed(), render(item, depth + 1)))
                .collect();
            format!("[\n{}\n{indent}]", lines.join("\n"))
        }
        DecodedValue::String(_) => value.to_string().green().to_string(),
        DecodedValue::Bool(_) => value.to_string().yellow().to_string(),
        DecodedValue::Raw(_) => format!("{} {}", value.to_string().cyan(), "(raw)".dimmed()),
        _ => value.to_string().cyan().to_string(),
    }
}

// ── Decoded values ─────────────────────────────────────────────────

/// Print one decoded variable.
pub fn print_value(address: &Address, variable: &str, path: &[PathSegment], value: &DecodedValue) {
    println!(
        "{} {}",
        format_path(variable, path).blue().bold(),
        format!("@ {address}").dimmed()
    );
    println!("  {}", format_value(value).replace('\n', "\n  "));
}

// ── Layout ─────────────────────────────────────────────────────────

/// Print the variables declared in a layout, in declaration order.
pub fn print_variables(layout: &StorageLayout) {
    println!();
    println!(
        "{} ({}):",
        "Storage variables".blue().bold(),
        layout.len().to_string().cyan()
    );
    for entry in layout.variables() {
        let type_label = layout
            .type_of(&entry.type_id)
            .map(|descriptor| descriptor.label.as_str())
            .unwrap_or(entry.type_id.as_str());
        println!(
            "  {} {} {}",
            format!("slot {:<4} +{:<2}", entry.slot, entry.offset).dimmed(),
            entry.label.cyan(),
            type_label.dimmed(),
        );
    }
}

// ── Cache ──────────────────────────────────────────────────────────

/// Print read-cache counters after a lookup.
pub fn print_cache_stats(stats: &CacheStats) {
    println!(
        "  {} {} hits, {} misses ({:.0}% hit rate, {}/{} entries)",
        "cache:".dimmed(),
        stats.hits.to_string().cyan(),
        stats.misses.to_string().cyan(),
        stats.hit_rate() * 100.0,
        stats.current_entries,
        stats.max_entries,
    );
}
