// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Terminal output helpers
//!
//! Consistent markers for command output. `colored` honors `NO_COLOR`.

use colored::Colorize;

/// Print a styled section heading, red for errors and yellow for warnings
pub fn print_section(title: &str) {
    println!();
    let styled = match title {
        "Errors" => title.red().bold(),
        "Warnings" => title.yellow().bold(),
        _ => title.bold(),
    };
    println!("{}:", styled);
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

/// Print a `label: value` line with the label padded and dimmed
pub fn print_field(label: &str, value: &str) {
    println!("  {:<14} {}", format!("{}:", label).dimmed(), value.cyan());
}
