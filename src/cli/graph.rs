// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Graph command - visualize resource dependencies

use miette::Result;

use super::{report, ContextArgs, GraphFormat};
use crate::stack::ResourceGraph;

/// Run the graph command
pub async fn run(context: ContextArgs, format: GraphFormat, _verbose: bool) -> Result<()> {
    let stack = context.assemble().map_err(report)?;
    let graph = ResourceGraph::build(&stack).map_err(report)?;

    let output = match format {
        GraphFormat::Text => graph.to_text().map_err(report)?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
