// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! # webdevops - Static Website Delivery Stack
//!
//! `webdevops` declares everything needed to build and serve a static
//! website from a GitHub repository and synthesizes it as a CloudFormation
//! template.
//!
//! ## Features
//!
//! - **Source → Build → Deploy pipeline** - GitHub source, managed build, bucket deploy
//! - **CDN in front** - HTTPS redirect, SPA-style 404 fallback, short cache TTLs
//! - **Typed references** - resources link through handles, never hand-built strings
//! - **Checked names** - bucket names are validated before anything is deployed
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter context file
//! webdevops init
//!
//! # Inspect the derived names
//! webdevops names
//!
//! # Write the template
//! GITHUB_TOKEN=... webdevops synth --out cdk.out
//! ```

pub mod cli;
pub mod context;
pub mod errors;
pub mod stack;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use context::{Environment, StackContext};
pub use errors::{WebStackError, WebStackResult};
pub use stack::WebStack;
pub use template::{Template, TemplateSynthesizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
