// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Synth command - write the stack template

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{report, ContextArgs};
use crate::errors::{WebStackError, WebStackResult};
use crate::stack::{StackValidator, WebStack};
use crate::template::{digest, TemplateFormat, TemplateSynthesizer};
use crate::utils::{print_error, print_success};

/// What happened to the template file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Run the synth command
pub async fn run(
    context: ContextArgs,
    format: TemplateFormat,
    out: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let stack = context.assemble().map_err(report)?;

    let validation = StackValidator::validate(&stack);
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            print_error(error);
        }
        return Err(miette::miette!(
            "Stack '{}' failed validation with {} error(s)",
            stack.name,
            validation.errors.len()
        ));
    }

    let rendered = render(&stack, format).map_err(report)?;

    let Some(dir) = out else {
        print!("{}", rendered);
        return Ok(());
    };

    let path = template_path(&dir, &stack.name, format);
    let outcome = write_template(&path, &rendered).await.map_err(report)?;

    match outcome {
        WriteOutcome::Unchanged => {
            print_success(&format!("{} (unchanged)", path.display()));
        }
        WriteOutcome::Created | WriteOutcome::Updated => {
            print_success(&format!("Wrote {}", path.display()));
        }
    }

    if verbose {
        println!("    {} {}", "digest:".dimmed(), digest(&rendered).dimmed());
        println!("    {} {}", "bucket:".dimmed(), stack.bucket_name());
    }

    Ok(())
}

/// Synthesize and render a stack
pub fn render(stack: &WebStack, format: TemplateFormat) -> WebStackResult<String> {
    TemplateSynthesizer::synthesize(stack)?.render(format)
}

/// `<dir>/<stack>.template.<ext>`
pub fn template_path(dir: &Path, stack_name: &str, format: TemplateFormat) -> PathBuf {
    dir.join(format!("{}.template.{}", stack_name, format.extension()))
}

/// Write the template unless the file already holds identical content
pub async fn write_template(path: &Path, content: &str) -> WebStackResult<WriteOutcome> {
    let write_error = |e: std::io::Error| WebStackError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let existing = tokio::fs::read_to_string(path).await.ok();
    if let Some(existing) = &existing {
        if digest(existing) == digest(content) {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, content).await.map_err(write_error)?;

    Ok(if existing.is_some() {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Environment, StackContext};
    use tempfile::TempDir;

    fn stack() -> WebStack {
        WebStack::assemble(
            &StackContext::new("ghp_abc", "acme", "site", "main"),
            &Environment::new("123456789012", "us-east-1"),
        )
        .unwrap()
    }

    #[test]
    fn test_template_path() {
        let path = template_path(Path::new("cdk.out"), "WebDevOpsPipelineStack", TemplateFormat::Yaml);
        assert_eq!(path, PathBuf::from("cdk.out/WebDevOpsPipelineStack.template.yaml"));
    }

    #[tokio::test]
    async fn test_write_reports_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("stack.template.json");
        let content = render(&stack(), TemplateFormat::Json).unwrap();

        assert_eq!(write_template(&path, &content).await.unwrap(), WriteOutcome::Created);
        assert_eq!(write_template(&path, &content).await.unwrap(), WriteOutcome::Unchanged);

        let other = render(&stack(), TemplateFormat::Yaml).unwrap();
        assert_eq!(write_template(&path, &other).await.unwrap(), WriteOutcome::Updated);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), other);
    }

    #[tokio::test]
    async fn test_run_writes_template() {
        let temp = TempDir::new().unwrap();
        let context = ContextArgs {
            context: None,
            overrides: vec![
                "githubOwner=acme".into(),
                "githubRepo=site".into(),
                "githubBranch=main".into(),
                "account=123456789012".into(),
                "region=us-east-1".into(),
            ],
            github_token: Some("ghp_abc".into()),
        };

        run(context, TemplateFormat::Json, Some(temp.path().to_path_buf()), false)
            .await
            .unwrap();

        let written = std::fs::read_to_string(temp.path().join("WebDevOpsPipelineStack.template.json")).unwrap();
        let template = crate::template::Template::from_json(&written).unwrap();
        assert!(template.outputs.contains_key("DistributionURL"));
    }

    #[tokio::test]
    async fn test_run_reports_missing_context() {
        let context = ContextArgs {
            context: None,
            overrides: vec!["githubRepo=site".into()],
            github_token: None,
        };
        let err = run(context, TemplateFormat::Json, None, false).await.unwrap_err();
        assert!(err.to_string().contains("githubToken"));
        assert!(err.to_string().contains("githubOwner"));
    }
}
