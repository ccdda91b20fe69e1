// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Resource naming
//!
//! Physical names must be unique per account (and, for buckets, globally),
//! so they are derived from the repository, account and region. The
//! formats below are what already-deployed stacks use; changing one renames
//! (and so replaces) the live resource.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{WebStackError, WebStackResult};

/// Maximum bucket name length accepted by the object store
pub const BUCKET_NAME_MAX_LEN: usize = 63;

/// Minimum bucket name length accepted by the object store
pub const BUCKET_NAME_MIN_LEN: usize = 3;

/// Maximum cache policy name length accepted by the CDN
pub const CACHE_POLICY_NAME_MAX_LEN: usize = 128;

/// Name of the single deploy action
pub const DEPLOY_ACTION_NAME: &str = "WebAppDeploy";

/// Name of the stack output carrying the distribution domain
pub const DISTRIBUTION_OUTPUT_NAME: &str = "DistributionURL";

/// Template logical IDs
pub mod logical_ids {
    pub const SECRET: &str = "GithubSecret";
    pub const WEBSITE_BUCKET: &str = "WebappBucket";
    pub const WEBSITE_BUCKET_POLICY: &str = "WebappBucketPolicy";
    pub const ARTIFACTS_BUCKET: &str = "WebAppPipelineArtifactsBucket";
    pub const PIPELINE: &str = "WebAppPipeline";
    pub const PIPELINE_ROLE: &str = "WebAppPipelineRole";
    pub const WEBHOOK: &str = "WebAppPipelineWebhook";
    pub const BUILD_PROJECT: &str = "BuildProject";
    pub const BUILD_PROJECT_ROLE: &str = "BuildProjectRole";
    pub const CACHE_POLICY: &str = "CustomCachePolicy";
    pub const DISTRIBUTION: &str = "WebAppDistribution";
}

/// `GitHub-Token-<repo>`
pub fn secret_name(repo: &str) -> String {
    format!("GitHub-Token-{}", repo)
}

/// `webapp-<repo>-<account>-<region>`
pub fn bucket_name(repo: &str, account: &str, region: &str) -> String {
    format!("webapp-{}-{}-{}", repo, account, region)
}

/// `webAppPipeline-<repo>`
pub fn pipeline_name(repo: &str) -> String {
    format!("webAppPipeline-{}", repo)
}

/// `BuildProject-<repo>`
///
/// The build service rejects `.` and other punctuation, so those become `-`.
pub fn build_project_name(repo: &str) -> String {
    format!("BuildProject-{}", identifier_chars(repo))
}

/// `WebAppSource-<repo>`
pub fn source_action_name(repo: &str) -> String {
    format!("WebAppSource-{}", repo)
}

/// `Build-<repo>`
pub fn build_action_name(repo: &str) -> String {
    format!("Build-{}", repo)
}

/// Artifact produced by the named action
pub fn artifact_name(stage: &str, action: &str) -> String {
    logical_id(&format!("Artifact_{}_{}", stage, action))
}

/// `CustomCachePolicy-<repo>-<region>`
///
/// Cache policy names are unique per account across all regions, so the
/// region is part of the name. The repository part is reduced to
/// `[A-Za-z0-9_-]` and cut short if the whole would exceed
/// [`CACHE_POLICY_NAME_MAX_LEN`].
pub fn cache_policy_name(repo: &str, region: &str) -> String {
    const PREFIX: &str = "CustomCachePolicy-";
    let budget = CACHE_POLICY_NAME_MAX_LEN.saturating_sub(PREFIX.len() + 1 + region.len());
    let repo: String = identifier_chars(repo).chars().take(budget).collect();
    format!("{}{}-{}", PREFIX, repo, region)
}

/// Replace everything outside `[A-Za-z0-9_-]` with `-`
fn identifier_chars(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect()
}

/// Strip everything but ASCII alphanumerics and underscores
///
/// Logical IDs and artifact names accept no other characters.
pub fn logical_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// True if the name still contains unresolved pseudo parameters
pub fn is_deferred(name: &str) -> bool {
    name.contains("${")
}

fn bucket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$").expect("valid regex"))
}

fn pseudo_parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{AWS::[A-Za-z]+\}").expect("valid regex"))
}

fn ip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("valid regex"))
}

/// Check a concrete bucket name against the object store's naming rules
///
/// Over-long names are rejected, never truncated: truncation would break
/// the naming scheme and could collide with another stack's bucket.
pub fn validate_bucket_name(name: &str) -> WebStackResult<()> {
    let len = name.len();
    if len > BUCKET_NAME_MAX_LEN {
        return Err(WebStackError::invalid_bucket_name(
            name,
            format!("{} characters exceeds the {} character limit", len, BUCKET_NAME_MAX_LEN),
        ));
    }
    if len < BUCKET_NAME_MIN_LEN {
        return Err(WebStackError::invalid_bucket_name(
            name,
            format!("must be at least {} characters", BUCKET_NAME_MIN_LEN),
        ));
    }
    if !bucket_pattern().is_match(name) {
        return Err(WebStackError::invalid_bucket_name(
            name,
            "only lowercase letters, digits, '.' and '-' are allowed, starting and ending with a letter or digit",
        ));
    }
    if name.contains("..") {
        return Err(WebStackError::invalid_bucket_name(name, "adjacent periods are not allowed"));
    }
    if ip_pattern().is_match(name) {
        return Err(WebStackError::invalid_bucket_name(name, "must not be formatted as an IP address"));
    }
    Ok(())
}

/// Physical names checked against their service's naming rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Secret,
    Pipeline,
    BuildProject,
    CachePolicy,
}

impl NameKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::Pipeline => "pipeline",
            Self::BuildProject => "build project",
            Self::CachePolicy => "cache policy",
        }
    }

    fn max_len(&self) -> usize {
        match self {
            Self::Secret => 512,
            Self::Pipeline => 100,
            Self::BuildProject => 255,
            Self::CachePolicy => CACHE_POLICY_NAME_MAX_LEN,
        }
    }

    /// Allowed characters, as shown in error messages
    fn allowed(&self) -> &'static str {
        match self {
            Self::Secret => "letters, digits and /_+=.@-",
            Self::Pipeline => "letters, digits and .@_-",
            Self::BuildProject => "letters, digits, '_' and '-', starting with a letter or digit",
            Self::CachePolicy => "letters, digits, '_' and '-'",
        }
    }

    fn pattern(&self) -> &'static Regex {
        static SECRET: OnceLock<Regex> = OnceLock::new();
        static PIPELINE: OnceLock<Regex> = OnceLock::new();
        static BUILD_PROJECT: OnceLock<Regex> = OnceLock::new();
        static CACHE_POLICY: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            Self::Secret => (&SECRET, r"^[A-Za-z0-9/_+=.@-]+$"),
            Self::Pipeline => (&PIPELINE, r"^[A-Za-z0-9.@_-]+$"),
            Self::BuildProject => (&BUILD_PROJECT, r"^[A-Za-z0-9][A-Za-z0-9_-]+$"),
            Self::CachePolicy => (&CACHE_POLICY, r"^[A-Za-z0-9_-]+$"),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
    }
}

/// Check a physical name against its service's character and length rules
///
/// Pseudo parameters are ignored; the engine substitutes them with values
/// that satisfy every rule here.
pub fn validate_name(kind: NameKind, name: &str) -> WebStackResult<()> {
    let concrete = pseudo_parameter_pattern().replace_all(name, "x");

    let invalid = |reason: String| WebStackError::InvalidResourceName {
        kind: kind.label().into(),
        name: name.to_string(),
        reason,
        help: None,
    };

    if concrete.len() > kind.max_len() {
        return Err(invalid(format!(
            "{} characters exceeds the {} character limit",
            concrete.len(),
            kind.max_len()
        )));
    }
    if !kind.pattern().is_match(&concrete) {
        return Err(invalid(format!("only {} are allowed", kind.allowed())));
    }
    Ok(())
}
