// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Validate command - check the assembled stack

use colored::Colorize;
use miette::Result;

use super::{report, ContextArgs};
use crate::stack::StackValidator;
use crate::utils::{print_error, print_field, print_section, print_success, print_warning};

/// Run the validate command
pub async fn run(context: ContextArgs, verbose: bool) -> Result<()> {
    println!("{}", "Validating stack...".bold());
    println!();

    let stack = context.assemble().map_err(report)?;
    print_success("Context resolved");
    print_success(&format!("Stack '{}' assembled", stack.name));

    let validation = StackValidator::validate(&stack);

    if !validation.errors.is_empty() {
        print_section("Errors");
        for error in &validation.errors {
            print_error(error);
        }
    }

    if validation.has_warnings() {
        print_section("Warnings");
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        print_section("Stack summary");
        print_field("Name", &stack.name);
        print_field("Bucket", stack.bucket_name());
        print_field("Pipeline", &stack.pipeline.name);
        for stage in &stack.pipeline.stages {
            let actions: Vec<&str> = stage.actions.iter().map(|a| a.name()).collect();
            println!("    - {} {}", stage.name(), format!("[{}]", actions.join(", ")).dimmed());
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Stack validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Stack is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Stack is valid!".green().bold());
    }
    Ok(())
}
