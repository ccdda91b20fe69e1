// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Error types
//!
//! Every failure webdevops can report happens before anything reaches the
//! provisioning engine: bad context, a name the provider would reject, or a
//! resource graph that doesn't hang together.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for webdevops operations
pub type WebStackResult<T> = Result<T, WebStackError>;

/// Main error type for webdevops
#[derive(Error, Debug, Diagnostic)]
pub enum WebStackError {
    // ─────────────────────────────────────────────────────────────────────────
    // Context Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Missing required context: {}", keys.join(", "))]
    #[diagnostic(
        code(webdevops::missing_context),
        help("Set them in the context file or pass them with -c key=value")
    )]
    MissingContext { keys: Vec<String> },

    #[error("Unknown context key '{key}'")]
    #[diagnostic(
        code(webdevops::unknown_context_key),
        help("Known keys: githubToken, githubOwner, githubRepo, githubBranch, account, region")
    )]
    UnknownContextKey { key: String },

    #[error("Malformed context override '{raw}'")]
    #[diagnostic(
        code(webdevops::malformed_override),
        help("Overrides take the form key=value, e.g. -c githubRepo=site")
    )]
    MalformedOverride { raw: String },

    #[error("Context file not found: {path}")]
    #[diagnostic(
        code(webdevops::context_not_found),
        help("Create one with 'webdevops init' or pass every key with -c")
    )]
    ContextNotFound { path: PathBuf },

    #[error("Unsupported context file format: {path}")]
    #[diagnostic(
        code(webdevops::unsupported_format),
        help("Use a .json, .yaml, .yml or .toml context file")
    )]
    UnsupportedFormat { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Declaration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid {kind} name '{name}': {reason}")]
    #[diagnostic(code(webdevops::invalid_resource_name))]
    InvalidResourceName {
        kind: String,
        name: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Stage '{stage}' cannot be added after '{previous}'")]
    #[diagnostic(
        code(webdevops::stage_order),
        help("Stages run in declaration order: Source, Build, Deploy")
    )]
    StageOrder { stage: String, previous: String },

    #[error("Stage '{stage}' is declared twice")]
    #[diagnostic(code(webdevops::duplicate_stage))]
    DuplicateStage { stage: String },

    #[error("Stage '{stage}' has no actions")]
    #[diagnostic(code(webdevops::empty_stage))]
    EmptyStage { stage: String },

    #[error("{category} action '{action}' cannot run in stage '{stage}'")]
    #[diagnostic(code(webdevops::misplaced_action))]
    MisplacedAction {
        action: String,
        category: String,
        stage: String,
    },

    #[error("Action '{action}' consumes artifact '{artifact}' which no earlier stage produces")]
    #[diagnostic(
        code(webdevops::dangling_artifact),
        help("An action may only consume artifacts produced by a preceding stage")
    )]
    DanglingArtifact { action: String, artifact: String },

    #[error("Artifact '{artifact}' is produced by both '{first}' and '{second}'")]
    #[diagnostic(code(webdevops::duplicate_artifact))]
    DuplicateArtifact {
        artifact: String,
        first: String,
        second: String,
    },

    #[error("Invalid cache policy TTLs: min {min}s, default {default}s, max {max}s")]
    #[diagnostic(
        code(webdevops::invalid_ttl),
        help("TTLs must satisfy min <= default <= max")
    )]
    InvalidTtl { min: u64, default: u64, max: u64 },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Resource '{resource}' references unknown resource '{target}'")]
    #[diagnostic(code(webdevops::unknown_reference))]
    UnknownReference { resource: String, target: String },

    #[error("Circular dependency between resources")]
    #[diagnostic(
        code(webdevops::circular_dependency),
        help("A resource cannot depend on itself, directly or transitively")
    )]
    CircularDependency { resources: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(webdevops::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(webdevops::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(webdevops::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(webdevops::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(webdevops::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(webdevops::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for WebStackError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for WebStackError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for WebStackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for WebStackError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl WebStackError {
    /// Create an invalid bucket name error, with a hint when the repo name is to blame
    pub fn invalid_bucket_name(name: &str, reason: impl Into<String>) -> Self {
        let help = if name.len() > crate::stack::naming::BUCKET_NAME_MAX_LEN {
            Some(format!(
                "Bucket names embed the repository name, account and region and may not exceed {} characters. \
                 Use a shorter repository name.",
                crate::stack::naming::BUCKET_NAME_MAX_LEN
            ))
        } else if name.chars().any(|c| c.is_ascii_uppercase()) {
            Some("Bucket names must be lowercase. Rename the repository or use a lowercase alias.".into())
        } else {
            None
        };

        Self::InvalidResourceName {
            kind: "bucket".into(),
            name: name.to_string(),
            reason: reason.into(),
            help,
        }
    }

    /// Recovery suggestion for this error, if one applies
    pub fn recovery(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::MissingContext { keys } => Some(RecoverySuggestion::provide_context(keys)),
            Self::ContextNotFound { .. } => Some(RecoverySuggestion::create_context()),
            Self::InvalidResourceName { kind, name, .. } if kind == "bucket" => {
                Some(RecoverySuggestion::shorten_bucket_name(name))
            }
            Self::CircularDependency { resources } => {
                Some(RecoverySuggestion::fix_circular_dependency(resources))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_context_lists_all_keys() {
        let err = WebStackError::MissingContext {
            keys: vec!["githubToken".into(), "githubRepo".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required context: githubToken, githubRepo"
        );
    }

    #[test]
    fn test_oversized_bucket_name_has_help() {
        let name = format!("webapp-{}-123456789012-us-east-1", "x".repeat(60));
        match WebStackError::invalid_bucket_name(&name, "too long") {
            WebStackError::InvalidResourceName { help, .. } => {
                assert!(help.unwrap().contains("shorter repository name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_recovery_for_missing_context() {
        let err = WebStackError::MissingContext {
            keys: vec!["githubBranch".into()],
        };
        let suggestion = err.recovery().unwrap();
        assert!(suggestion.commands.iter().any(|c| c.contains("githubBranch")));
    }
}
