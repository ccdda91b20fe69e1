// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest supplying missing context keys
    pub fn provide_context(keys: &[String]) -> Self {
        let mut commands = vec!["# Pass the missing values on the command line:".into()];
        let overrides: Vec<String> = keys.iter().map(|k| format!("-c {}=<value>", k)).collect();
        commands.push(format!("webdevops synth {}", overrides.join(" ")));

        Self {
            action: "Provide the missing stack context".into(),
            steps: vec![
                format!("Missing: {}", keys.join(", ")),
                "Add them under 'context' in your context file, or override them per run".into(),
                "The token can also come from the GITHUB_TOKEN environment variable".into(),
            ],
            commands,
        }
    }

    /// Suggest creating a context file
    pub fn create_context() -> Self {
        Self {
            action: "Create a context file".into(),
            steps: vec![
                "No context file found at the given path".into(),
                "Generate a starter file and fill in your repository details".into(),
            ],
            commands: vec![
                "# Write webdevops.json in the current directory:".into(),
                "webdevops init".into(),
            ],
        }
    }

    /// Suggest fixing an oversized or malformed bucket name
    pub fn shorten_bucket_name(name: &str) -> Self {
        Self {
            action: "Use a repository name that yields a valid bucket name".into(),
            steps: vec![
                format!("Derived bucket name: {} ({} characters)", name, name.len()),
                "Bucket names are webapp-<repo>-<account>-<region>".into(),
                "They must be 3-63 lowercase letters, digits, dots or hyphens".into(),
            ],
            commands: vec![
                "# Preview derived names before synthesizing:".into(),
                "webdevops names".into(),
            ],
        }
    }

    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(resources: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", resources.join(" → ")),
                "Review the references between resources".into(),
            ],
            commands: vec![
                "# Visualize the resource graph:".into(),
                "webdevops graph --format mermaid".into(),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
