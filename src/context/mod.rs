// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Stack context
//!
//! The four parameters a stack is assembled from, plus the deployment
//! target. Both are passed explicitly into the assembler; nothing here is
//! looked up from ambient state.

mod loader;

pub use loader::{ContextFile, ContextFormat, ContextLoader};

use serde::{Deserialize, Serialize};

/// Pseudo parameter used when the account is not known at synthesis time
pub const ACCOUNT_PSEUDO_PARAMETER: &str = "${AWS::AccountId}";

/// Pseudo parameter used when the region is not known at synthesis time
pub const REGION_PSEUDO_PARAMETER: &str = "${AWS::Region}";

/// Required stack parameters
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackContext {
    /// Source-control access token, stored in the managed secret store
    pub github_token: String,
    pub github_owner: String,
    pub github_repo: String,
    pub github_branch: String,
}

impl StackContext {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            github_token: token.into(),
            github_owner: owner.into(),
            github_repo: repo.into(),
            github_branch: branch.into(),
        }
    }
}

// Keep the token out of logs and panic messages.
impl std::fmt::Debug for StackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackContext")
            .field("github_token", &"<redacted>")
            .field("github_owner", &self.github_owner)
            .field("github_repo", &self.github_repo)
            .field("github_branch", &self.github_branch)
            .finish()
    }
}

/// Deployment target
///
/// Either field may be left unset, in which case names that embed it are
/// resolved by the provisioning engine from its pseudo parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Environment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            region: Some(region.into()),
        }
    }

    /// Environment-agnostic target
    pub fn agnostic() -> Self {
        Self::default()
    }

    /// Account id, or the pseudo parameter placeholder
    pub fn account_or_placeholder(&self) -> &str {
        self.account.as_deref().unwrap_or(ACCOUNT_PSEUDO_PARAMETER)
    }

    /// Region, or the pseudo parameter placeholder
    pub fn region_or_placeholder(&self) -> &str {
        self.region.as_deref().unwrap_or(REGION_PSEUDO_PARAMETER)
    }

    /// True when both account and region are concrete values
    pub fn is_resolved(&self) -> bool {
        self.account.is_some() && self.region.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let ctx = StackContext::new("ghp_secret", "acme", "site", "main");
        let debug = format!("{:?}", ctx);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("site"));
    }

    #[test]
    fn test_agnostic_environment_uses_placeholders() {
        let env = Environment::agnostic();
        assert!(!env.is_resolved());
        assert_eq!(env.account_or_placeholder(), "${AWS::AccountId}");
        assert_eq!(env.region_or_placeholder(), "${AWS::Region}");
    }
}
