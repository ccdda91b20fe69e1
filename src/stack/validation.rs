// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Stack validation
//!
//! Re-checks an assembled stack for the inconsistencies the provisioning
//! engine or the running pipeline would otherwise reject: mismatched
//! derived names, broken artifact chains, dangling references.

use super::graph::ResourceGraph;
use super::naming::{self, NameKind};
use super::WebStack;
use crate::errors::WebStackError;

/// Stack validator
pub struct StackValidator;

impl StackValidator {
    /// Validate an assembled stack
    pub fn validate(stack: &WebStack) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_pipeline(stack, &mut result);
        Self::validate_names(stack, &mut result);
        Self::validate_distribution(stack, &mut result);

        match ResourceGraph::build(stack) {
            Ok(_) => {}
            Err(WebStackError::CircularDependency { resources }) => {
                result.add_error(&format!("Circular dependency: {}", resources.join(" → ")));
            }
            Err(e) => result.add_error(&e.to_string()),
        }

        if stack.secret.value.is_empty() {
            result.add_warning(
                "githubToken is empty: the source stage will fail to authenticate when the pipeline runs",
            );
        }

        if !stack.environment.is_resolved() {
            result.add_warning(
                "Account or region not set: the bucket name is resolved at deploy time and its length can't be checked",
            );
        }

        if stack.website_bucket.public_read_access {
            result.add_warning(&format!(
                "Bucket '{}' is publicly readable, objects are reachable without the CDN",
                stack.bucket_name()
            ));
        }

        result
    }

    fn validate_pipeline(stack: &WebStack, result: &mut ValidationResult) {
        let pipeline = &stack.pipeline;

        let names = pipeline.stage_names();
        if names != ["Source", "Build", "Deploy"] {
            result.add_error(&format!(
                "Pipeline must have stages Source, Build, Deploy; found: {}",
                names.join(", ")
            ));
        }

        let (Some(source), Some(build), Some(deploy)) = (
            pipeline.source_action(),
            pipeline.build_action(),
            pipeline.deploy_action(),
        ) else {
            return;
        };

        if build.input != source.output {
            result.add_error(&format!(
                "Build action '{}' does not consume the source artifact '{}'",
                build.name,
                source.output.name()
            ));
        }
        if deploy.input != build.output {
            result.add_error(&format!(
                "Deploy action '{}' consumes '{}' but the build produces '{}'",
                deploy.name,
                deploy.input.name(),
                build.output.name()
            ));
        }
        if deploy.bucket != stack.website_bucket.handle() {
            result.add_error(&format!(
                "Deploy action '{}' targets '{}' instead of the website bucket",
                deploy.name,
                deploy.bucket.id()
            ));
        }
        if source.secret != stack.secret.handle() {
            result.add_error(&format!(
                "Source action '{}' references secret '{}' which the stack does not declare",
                source.name,
                source.secret.id()
            ));
        }
        if build.project != stack.build_project.handle() {
            result.add_error(&format!(
                "Build action '{}' runs unknown project '{}'",
                build.name,
                build.project.id()
            ));
        }
        if stack.webhook.target_action != source.name {
            result.add_error(&format!(
                "Webhook targets action '{}' but the source action is '{}'",
                stack.webhook.target_action, source.name
            ));
        }
    }

    fn validate_names(stack: &WebStack, result: &mut ValidationResult) {
        let Some(source) = stack.pipeline.source_action() else {
            return;
        };
        let repo = source.repo.as_str();
        let env = &stack.environment;

        let expected = [
            ("secret", naming::secret_name(repo), stack.secret.name.as_str()),
            ("pipeline", naming::pipeline_name(repo), stack.pipeline.name.as_str()),
            ("build project", naming::build_project_name(repo), stack.build_project.name.as_str()),
            (
                "bucket",
                naming::bucket_name(repo, env.account_or_placeholder(), env.region_or_placeholder()),
                stack.bucket_name(),
            ),
            (
                "cache policy",
                naming::cache_policy_name(repo, env.region_or_placeholder()),
                stack.cache_policy.name.as_str(),
            ),
        ];

        for (kind, want, got) in expected {
            if want != got {
                result.add_error(&format!(
                    "{} name '{}' is not derived from repository '{}' (expected '{}')",
                    kind, got, repo, want
                ));
            }
        }

        let physical = [
            (NameKind::Secret, stack.secret.name.as_str()),
            (NameKind::Pipeline, stack.pipeline.name.as_str()),
            (NameKind::BuildProject, stack.build_project.name.as_str()),
            (NameKind::CachePolicy, stack.cache_policy.name.as_str()),
        ];
        for (kind, name) in physical {
            if let Err(e) = naming::validate_name(kind, name) {
                result.add_error(&e.to_string());
            }
        }

        if env.is_resolved() {
            if let Err(e) = naming::validate_bucket_name(stack.bucket_name()) {
                result.add_error(&e.to_string());
            }
        }
    }

    fn validate_distribution(stack: &WebStack, result: &mut ValidationResult) {
        let dist = &stack.distribution;
        let policy = &stack.cache_policy;

        if !(policy.min_ttl() <= policy.default_ttl() && policy.default_ttl() <= policy.max_ttl()) {
            result.add_error(&format!(
                "Cache policy TTLs out of order: min {}s, default {}s, max {}s",
                policy.min_ttl().as_secs(),
                policy.default_ttl().as_secs(),
                policy.max_ttl().as_secs()
            ));
        }

        if dist.origin != stack.website_bucket.handle() {
            result.add_error(&format!(
                "Distribution origin '{}' is not the website bucket",
                dist.origin.id()
            ));
        }

        if dist.cache_policy != policy.handle() {
            result.add_error(&format!(
                "Distribution uses unknown cache policy '{}'",
                dist.cache_policy.id()
            ));
        }

        if stack.website_bucket.website_index_document.as_deref() != Some(dist.default_root_object.as_str()) {
            result.add_warning(&format!(
                "Distribution root object '{}' differs from the bucket's index document",
                dist.default_root_object
            ));
        }

        for response in &dist.error_responses {
            if !response.response_page_path.starts_with('/') {
                result.add_error(&format!(
                    "Error response page '{}' must start with '/'",
                    response.response_page_path
                ));
            }
        }
    }
}

/// Result of stack validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
