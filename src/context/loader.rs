// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Context file loading
//!
//! Layers, lowest precedence first: context file, `GITHUB_TOKEN`,
//! `-c key=value` overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{Environment, StackContext};
use crate::errors::{WebStackError, WebStackResult};

/// Context file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFormat {
    Json,
    Yaml,
    Toml,
}

impl ContextFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> WebStackResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(WebStackError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// On-disk context, every key optional until resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextFile {
    #[serde(default)]
    pub context: PartialContext,

    #[serde(default)]
    pub env: Environment,
}

/// Stack context with unset keys allowed
///
/// Other keys in the `context` table (feature flags and the like) are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_branch: Option<String>,
}

impl ContextFile {
    /// Parse context from a string in the given format
    pub fn parse(content: &str, format: ContextFormat) -> WebStackResult<Self> {
        let file = match format {
            ContextFormat::Json => serde_json::from_str(content)?,
            ContextFormat::Yaml => serde_yaml::from_str(content)?,
            ContextFormat::Toml => toml::from_str(content)?,
        };
        Ok(file)
    }

    /// Set a single key by its context name
    pub fn set(&mut self, key: &str, value: String) -> WebStackResult<()> {
        let slot = match key {
            "githubToken" => &mut self.context.github_token,
            "githubOwner" => &mut self.context.github_owner,
            "githubRepo" => &mut self.context.github_repo,
            "githubBranch" => &mut self.context.github_branch,
            "account" => &mut self.env.account,
            "region" => &mut self.env.region,
            _ => {
                return Err(WebStackError::UnknownContextKey {
                    key: key.to_string(),
                })
            }
        };
        *slot = Some(value);
        Ok(())
    }
}

/// Builds a [`StackContext`] and [`Environment`] from layered sources
#[derive(Debug, Clone, Default)]
pub struct ContextLoader {
    file: ContextFile,
}

impl ContextLoader {
    /// Start with no context at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a context file on disk
    pub fn from_file(path: &Path) -> WebStackResult<Self> {
        if !path.exists() {
            return Err(WebStackError::ContextNotFound {
                path: path.to_path_buf(),
            });
        }

        let format = ContextFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| WebStackError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        debug!(path = %path.display(), ?format, "loaded context file");

        Ok(Self {
            file: ContextFile::parse(&content, format)?,
        })
    }

    /// Start from an already parsed context file
    pub fn from_context_file(file: ContextFile) -> Self {
        Self { file }
    }

    /// Apply a token taken from the environment
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token {
            self.file.context.github_token = Some(token);
        }
        self
    }

    /// Apply `key=value` overrides
    pub fn with_overrides<I, S>(mut self, overrides: I) -> WebStackResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in overrides {
            let raw = raw.as_ref();
            let (key, value) = raw
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| WebStackError::MalformedOverride {
                    raw: raw.to_string(),
                })?;
            self.file.set(key.trim(), value.to_string())?;
        }
        Ok(self)
    }

    /// Resolve into the explicit stack inputs
    ///
    /// All missing keys are reported at once. Values are not otherwise
    /// checked; an empty token is accepted here.
    pub fn resolve(&self) -> WebStackResult<(StackContext, Environment)> {
        let ctx = &self.file.context;
        let mut missing = Vec::new();

        let mut take = |key: &str, value: &Option<String>| match value {
            Some(v) => v.clone(),
            None => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let token = take("githubToken", &ctx.github_token);
        let owner = take("githubOwner", &ctx.github_owner);
        let repo = take("githubRepo", &ctx.github_repo);
        let branch = take("githubBranch", &ctx.github_branch);

        if !missing.is_empty() {
            return Err(WebStackError::MissingContext { keys: missing });
        }

        Ok((
            StackContext::new(token, owner, repo, branch),
            self.file.env.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CDK_JSON: &str = r#"{
  "app": "npx ts-node bin/app.ts",
  "context": {
    "githubToken": "ghp_abc",
    "githubOwner": "acme",
    "githubRepo": "site",
    "githubBranch": "main",
    "@aws-cdk/core:newStyleStackSynthesis": true
  },
  "env": { "account": "123456789012", "region": "eu-west-1" }
}"#;

    #[test]
    fn test_parse_cdk_style_json() {
        let file = ContextFile::parse(CDK_JSON, ContextFormat::Json).unwrap();
        let (ctx, env) = ContextLoader::from_context_file(file).resolve().unwrap();

        assert_eq!(ctx.github_repo, "site");
        assert_eq!(ctx.github_token, "ghp_abc");
        assert_eq!(env, Environment::new("123456789012", "eu-west-1"));
    }

    #[test]
    fn test_parse_yaml_and_toml() {
        let yaml = "context:\n  githubToken: t\n  githubOwner: o\n  githubRepo: r\n  githubBranch: b\n";
        let file = ContextFile::parse(yaml, ContextFormat::Yaml).unwrap();
        assert_eq!(file.context.github_owner.as_deref(), Some("o"));
        assert!(file.env.account.is_none());

        let toml = "[context]\ngithubRepo = \"r\"\n\n[env]\nregion = \"us-east-1\"\n";
        let file = ContextFile::parse(toml, ContextFormat::Toml).unwrap();
        assert_eq!(file.context.github_repo.as_deref(), Some("r"));
        assert_eq!(file.env.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let err = ContextLoader::new()
            .with_overrides(["githubOwner=acme"])
            .unwrap()
            .resolve()
            .unwrap_err();

        match err {
            WebStackError::MissingContext { keys } => {
                assert_eq!(keys, vec!["githubToken", "githubRepo", "githubBranch"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let file = ContextFile::parse(CDK_JSON, ContextFormat::Json).unwrap();
        let (ctx, env) = ContextLoader::from_context_file(file)
            .with_token(Some("from-env".into()))
            .with_overrides(["githubRepo=blog", "region=us-west-2"])
            .unwrap()
            .resolve()
            .unwrap();

        assert_eq!(ctx.github_token, "from-env");
        assert_eq!(ctx.github_repo, "blog");
        assert_eq!(env.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn test_override_value_may_contain_equals() {
        let loader = ContextLoader::new()
            .with_overrides(["githubToken=abc==", "githubOwner=o", "githubRepo=r", "githubBranch=b"])
            .unwrap();
        let (ctx, _) = loader.resolve().unwrap();
        assert_eq!(ctx.github_token, "abc==");
    }

    #[test]
    fn test_empty_token_is_accepted() {
        let (ctx, _) = ContextLoader::new()
            .with_overrides(["githubToken=", "githubOwner=o", "githubRepo=r", "githubBranch=b"])
            .unwrap()
            .resolve()
            .unwrap();
        assert!(ctx.github_token.is_empty());
    }

    #[test]
    fn test_rejects_unknown_and_malformed_overrides() {
        assert!(matches!(
            ContextLoader::new().with_overrides(["githubRepository=x"]),
            Err(WebStackError::UnknownContextKey { .. })
        ));
        assert!(matches!(
            ContextLoader::new().with_overrides(["githubRepo"]),
            Err(WebStackError::MalformedOverride { .. })
        ));
        assert!(matches!(
            ContextLoader::new().with_overrides(["=x"]),
            Err(WebStackError::MalformedOverride { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(CDK_JSON.as_bytes()).unwrap();

        let (ctx, _) = ContextLoader::from_file(file.path()).unwrap().resolve().unwrap();
        assert_eq!(ctx.github_branch, "main");
    }

    #[test]
    fn test_from_file_errors() {
        let missing = ContextLoader::from_file(Path::new("does-not-exist.json"));
        assert!(matches!(missing, Err(WebStackError::ContextNotFound { .. })));

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let unsupported = ContextLoader::from_file(file.path());
        assert!(matches!(unsupported, Err(WebStackError::UnsupportedFormat { .. })));
    }
}
