// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for webdevops.

pub mod graph;
pub mod init;
pub mod names;
pub mod synth;
pub mod validate;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::context::ContextLoader;
use crate::errors::{WebStackError, WebStackResult};
use crate::stack::WebStack;
use crate::template::TemplateFormat;

/// Context file read when `--context` is not given
pub const DEFAULT_CONTEXT_FILE: &str = "webdevops.json";

/// Static website delivery stack synthesizer
///
/// Declares a build pipeline, website bucket and CDN for a GitHub repository.
#[derive(Parser, Debug)]
#[clap(
    name = "webdevops",
    version,
    about = "Synthesize a continuous-delivery pipeline and CDN stack for a static website",
    long_about = None,
    after_help = "Examples:\n\
        webdevops init                          Write a starter webdevops.json\n\
        webdevops names -c githubRepo=site      Show the derived resource names\n\
        webdevops synth --out cdk.out           Write the template to cdk.out/\n\
        webdevops graph --format mermaid        Show resource dependencies\n\n\
        See 'webdevops <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter context file
    Init {
        /// Context file to create
        #[clap(default_value = DEFAULT_CONTEXT_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },

    /// Synthesize the stack template
    Synth {
        #[clap(flatten)]
        context: ContextArgs,

        /// Template format
        #[clap(short, long, default_value = "json")]
        format: TemplateFormat,

        /// Output directory (default: stdout)
        #[clap(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Check the assembled stack without writing anything
    Validate {
        #[clap(flatten)]
        context: ContextArgs,
    },

    /// Show the resource dependency graph
    Graph {
        #[clap(flatten)]
        context: ContextArgs,

        /// Output format
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Show the physical names derived from the context
    Names {
        #[clap(flatten)]
        context: ContextArgs,
    },
}

/// Where the stack context comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Context file (.json, .yaml or .toml)
    #[clap(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Context override, e.g. -c githubRepo=site
    #[clap(short = 'c', long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// GitHub personal access token
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl ContextArgs {
    /// Layer file, token and overrides into a loader
    ///
    /// An explicit `--context` must exist; the default file is optional.
    pub fn loader(&self) -> WebStackResult<ContextLoader> {
        let loader = match &self.context {
            Some(path) => ContextLoader::from_file(path)?,
            None if Path::new(DEFAULT_CONTEXT_FILE).exists() => {
                ContextLoader::from_file(Path::new(DEFAULT_CONTEXT_FILE))?
            }
            None => ContextLoader::new(),
        };

        loader
            .with_token(self.github_token.clone())
            .with_overrides(&self.overrides)
    }

    /// Resolve the context and assemble the stack
    pub fn assemble(&self) -> WebStackResult<WebStack> {
        let (ctx, env) = self.loader()?.resolve()?;
        WebStack::assemble(&ctx, &env)
    }
}

/// Print any recovery steps for an error, then hand it to miette
pub fn report(error: WebStackError) -> miette::Report {
    if let Some(suggestion) = error.recovery() {
        eprintln!("{}", suggestion.to_string().yellow());
    }
    error.into()
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_overrides_and_format() {
        let cli = Cli::try_parse_from([
            "webdevops",
            "synth",
            "-c",
            "githubRepo=site",
            "--set",
            "githubOwner=acme",
            "--format",
            "yaml",
        ])
        .unwrap();

        match cli.command {
            Commands::Synth { context, format, out } => {
                assert_eq!(context.overrides, vec!["githubRepo=site", "githubOwner=acme"]);
                assert_eq!(format, TemplateFormat::Yaml);
                assert!(out.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_graph_format() {
        assert!(Cli::try_parse_from(["webdevops", "graph", "--format", "svg"]).is_err());
    }

    #[test]
    fn test_explicit_context_file_must_exist() {
        let args = ContextArgs {
            context: Some(PathBuf::from("/nonexistent/webdevops.json")),
            ..Default::default()
        };
        assert!(matches!(args.loader(), Err(WebStackError::ContextNotFound { .. })));
    }

    #[test]
    fn test_overrides_alone_assemble() {
        let args = ContextArgs {
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
        let stack = args.assemble().unwrap();
        assert_eq!(stack.bucket_name(), "webapp-site-123456789012-us-east-1");
    }
}
