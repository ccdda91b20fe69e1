// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Names command - show derived physical names

use colored::Colorize;
use miette::Result;

use super::{report, ContextArgs};
use crate::stack::WebStack;
use crate::utils::{print_field, print_info};

/// Physical names in display order
pub fn derived_names(stack: &WebStack) -> Vec<(&'static str, String)> {
    let mut names = vec![
        ("Secret", stack.secret.name.clone()),
        ("Bucket", stack.bucket_name().to_string()),
        ("Pipeline", stack.pipeline.name.clone()),
        ("Build project", stack.build_project.name.clone()),
        ("Cache policy", stack.cache_policy.name.clone()),
    ];
    names.extend(
        stack
            .pipeline
            .stages
            .actions()
            .map(|a| ("Action", format!("{} ({})", a.name(), a.category()))),
    );
    names
}

/// Run the names command
pub async fn run(context: ContextArgs, verbose: bool) -> Result<()> {
    let stack = context.assemble().map_err(report)?;

    println!("{}", format!("Resource names for {}", stack.name).bold());
    println!();

    for (kind, name) in derived_names(&stack) {
        print_field(kind, &name);
    }

    if verbose && !stack.environment.is_resolved() {
        println!();
        print_info("Account and region are substituted at deploy time");
    }

    Ok(())
}
