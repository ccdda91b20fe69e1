// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Stack declarations
//!
//! The resource model for a static-site delivery stack, the assembler that
//! wires it together, and the checks run over the result.

mod assembler;
pub mod graph;
pub mod naming;
pub mod pipeline;
pub mod resources;
mod validation;

pub use assembler::*;
pub use graph::{Declaration, ResourceGraph, ResourceKind};
pub use pipeline::{Action, Artifact, Pipeline, Stage, StageKind, StageList};
pub use validation::{StackValidator, ValidationResult};
