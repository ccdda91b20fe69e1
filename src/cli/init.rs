// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Init command - write a starter context file

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::report;
use crate::context::{ContextFile, ContextFormat, Environment};
use crate::errors::{WebStackError, WebStackResult};

/// Starter context; the token is left to `GITHUB_TOKEN`
pub fn starter_context() -> ContextFile {
    let mut file = ContextFile {
        env: Environment::agnostic(),
        ..Default::default()
    };
    file.context.github_owner = Some("my-github-user".into());
    file.context.github_repo = Some("my-website".into());
    file.context.github_branch = Some("main".into());
    file
}

/// Render a context file in the format its extension names
pub fn render_context(file: &ContextFile, path: &Path) -> WebStackResult<String> {
    let content = match ContextFormat::from_path(path)? {
        ContextFormat::Json => {
            let mut json = serde_json::to_string_pretty(file)?;
            json.push('\n');
            json
        }
        ContextFormat::Yaml => serde_yaml::to_string(file)?,
        ContextFormat::Toml => toml::to_string_pretty(file).map_err(|e| WebStackError::Toml {
            message: e.to_string(),
        })?,
    };
    Ok(content)
}

/// Run the init command
pub async fn run(path: PathBuf, force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Initializing webdevops context...".bold());
    println!();

    if path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }

    let content = render_context(&starter_context(), &path).map_err(report)?;

    tokio::fs::write(&path, &content).await.map_err(|e| {
        report(WebStackError::FileWriteError {
            path: path.clone(),
            error: e.to_string(),
        })
    })?;

    println!("  {} Created {}", "✓".green(), path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} with your repository details", path.display().to_string().cyan());
    println!("  2. Export {} with a GitHub personal access token", "GITHUB_TOKEN".cyan());
    println!("  3. Run {} to write the template", "webdevops synth --out cdk.out".cyan());
    println!();

    if verbose {
        println!("{}", "Generated context:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", content.dimmed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextLoader;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_context() {
        let temp = TempDir::new().unwrap();
        for name in ["webdevops.json", "webdevops.yaml", "webdevops.toml"] {
            let path = temp.path().join(name);
            run(path.clone(), false, false).await.unwrap();

            let (ctx, env) = ContextLoader::from_file(&path)
                .unwrap()
                .with_token(Some("ghp_abc".into()))
                .resolve()
                .unwrap();
            assert_eq!(ctx.github_repo, "my-website");
            assert!(!env.is_resolved());
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webdevops.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(run(path.clone(), false, false).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        run(path.clone(), true, false).await.unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("githubRepo"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = render_context(&starter_context(), Path::new("context.ini"));
        assert!(matches!(result, Err(WebStackError::UnsupportedFormat { .. })));
    }
}
