// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Delivery pipeline declarations
//!
//! A pipeline is an ordered list of stages, each holding typed actions that
//! pass opaque artifacts forward. Order is enforced when a stage is
//! appended, not left to call order.

use std::collections::HashMap;
use std::fmt;

use super::resources::{Bucket, BuildProject, Handle, Secret, ServiceRole};
use crate::errors::{WebStackError, WebStackResult};

/// Opaque handle to a set of files passed between actions
///
/// Only identity matters; contents are never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    name: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Stage kinds, in the only order they may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    Source,
    Build,
    Deploy,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "Source"),
            Self::Build => write!(f, "Build"),
            Self::Deploy => write!(f, "Deploy"),
        }
    }
}

/// How the source action learns about new commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTrigger {
    /// Push events delivered by a registered webhook
    Webhook,
    /// The pipeline service polls the repository
    Poll,
}

/// Fetch a branch from a source-control repository
#[derive(Debug, Clone)]
pub struct GitHubSource {
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Secret holding the access token
    pub secret: Handle<Secret>,
    pub trigger: SourceTrigger,
    pub output: Artifact,
}

/// Run a build project over the source artifact
#[derive(Debug, Clone)]
pub struct CodeBuild {
    pub name: String,
    pub project: Handle<BuildProject>,
    pub input: Artifact,
    pub output: Artifact,
}

/// Copy an artifact's contents into a bucket
#[derive(Debug, Clone)]
pub struct S3Deploy {
    pub name: String,
    pub bucket: Handle<Bucket>,
    pub input: Artifact,
    /// Unpack the artifact archive rather than uploading it as one object
    pub extract: bool,
}

/// A single typed pipeline step
#[derive(Debug, Clone)]
pub enum Action {
    Source(GitHubSource),
    Build(CodeBuild),
    Deploy(S3Deploy),
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Self::Source(a) => &a.name,
            Self::Build(a) => &a.name,
            Self::Deploy(a) => &a.name,
        }
    }

    /// Stage kind this action belongs to
    pub fn category(&self) -> StageKind {
        match self {
            Self::Source(_) => StageKind::Source,
            Self::Build(_) => StageKind::Build,
            Self::Deploy(_) => StageKind::Deploy,
        }
    }

    pub fn inputs(&self) -> Vec<&Artifact> {
        match self {
            Self::Source(_) => vec![],
            Self::Build(a) => vec![&a.input],
            Self::Deploy(a) => vec![&a.input],
        }
    }

    pub fn outputs(&self) -> Vec<&Artifact> {
        match self {
            Self::Source(a) => vec![&a.output],
            Self::Build(a) => vec![&a.output],
            Self::Deploy(_) => vec![],
        }
    }
}

/// Named group of actions
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn new(kind: StageKind, actions: Vec<Action>) -> Self {
        Self { kind, actions }
    }

    /// Stage name, as shown by the pipeline service
    pub fn name(&self) -> String {
        self.kind.to_string()
    }
}

/// Stages in execution order
#[derive(Debug, Clone, Default)]
pub struct StageList {
    stages: Vec<Stage>,
    /// Artifact name → producing action
    produced: HashMap<String, String>,
}

impl StageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage after checking it may run here
    ///
    /// Rejects stages out of Source → Build → Deploy order, empty stages,
    /// actions of the wrong category, inputs no earlier stage produced, and
    /// artifacts produced twice. A rejected stage leaves the list unchanged.
    pub fn push(&mut self, stage: Stage) -> WebStackResult<()> {
        let name = stage.name();

        if self.stages.iter().any(|s| s.kind == stage.kind) {
            return Err(WebStackError::DuplicateStage { stage: name });
        }
        if let Some(last) = self.stages.last() {
            if stage.kind < last.kind {
                return Err(WebStackError::StageOrder {
                    stage: name,
                    previous: last.name(),
                });
            }
        }
        if stage.actions.is_empty() {
            return Err(WebStackError::EmptyStage { stage: name });
        }

        let mut new_outputs: HashMap<String, String> = HashMap::new();
        for action in &stage.actions {
            if action.category() != stage.kind {
                return Err(WebStackError::MisplacedAction {
                    action: action.name().to_string(),
                    category: action.category().to_string(),
                    stage: name,
                });
            }

            // Inputs must come from a preceding stage, not a sibling action.
            for input in action.inputs() {
                if !self.produced.contains_key(input.name()) {
                    return Err(WebStackError::DanglingArtifact {
                        action: action.name().to_string(),
                        artifact: input.name().to_string(),
                    });
                }
            }

            for output in action.outputs() {
                let previous = self
                    .produced
                    .get(output.name())
                    .or_else(|| new_outputs.get(output.name()));
                if let Some(first) = previous {
                    return Err(WebStackError::DuplicateArtifact {
                        artifact: output.name().to_string(),
                        first: first.clone(),
                        second: action.name().to_string(),
                    });
                }
                new_outputs.insert(output.name().to_string(), action.name().to_string());
            }
        }

        self.produced.extend(new_outputs);
        self.stages.push(stage);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    pub fn get(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    /// Action that produced the named artifact
    pub fn producer_of(&self, artifact: &Artifact) -> Option<&str> {
        self.produced.get(artifact.name()).map(String::as_str)
    }

    /// All actions, in execution order
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.stages.iter().flat_map(|s| s.actions.iter())
    }
}

impl<'a> IntoIterator for &'a StageList {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

/// Managed continuous-delivery pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub logical_id: String,
    pub name: String,
    pub role: Handle<ServiceRole>,
    /// Private bucket the pipeline service stages artifacts in
    pub artifact_bucket: Handle<Bucket>,
    pub stages: StageList,
}

impl Pipeline {
    pub fn handle(&self) -> Handle<Pipeline> {
        Handle::new(&self.logical_id)
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// The source action, if the pipeline has one
    pub fn source_action(&self) -> Option<&GitHubSource> {
        self.stages.actions().find_map(|a| match a {
            Action::Source(s) => Some(s),
            _ => None,
        })
    }

    pub fn build_action(&self) -> Option<&CodeBuild> {
        self.stages.actions().find_map(|a| match a {
            Action::Build(b) => Some(b),
            _ => None,
        })
    }

    pub fn deploy_action(&self) -> Option<&S3Deploy> {
        self.stages.actions().find_map(|a| match a {
            Action::Deploy(d) => Some(d),
            _ => None,
        })
    }
}

/// Webhook registered with the source-control host
#[derive(Debug, Clone)]
pub struct Webhook {
    pub logical_id: String,
    pub pipeline: Handle<Pipeline>,
    /// Source action the webhook triggers
    pub target_action: String,
    pub branch: String,
    pub secret: Handle<Secret>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(output: &str) -> Action {
        Action::Source(GitHubSource {
            name: "WebAppSource-site".into(),
            owner: "acme".into(),
            repo: "site".into(),
            branch: "main".into(),
            secret: Handle::new("GithubSecret"),
            trigger: SourceTrigger::Webhook,
            output: Artifact::new(output),
        })
    }

    fn build(input: &str, output: &str) -> Action {
        Action::Build(CodeBuild {
            name: "Build-site".into(),
            project: Handle::new("BuildProject"),
            input: Artifact::new(input),
            output: Artifact::new(output),
        })
    }

    fn deploy(input: &str) -> Action {
        Action::Deploy(S3Deploy {
            name: "WebAppDeploy".into(),
            bucket: Handle::new("WebappBucket"),
            input: Artifact::new(input),
            extract: true,
        })
    }

    #[test]
    fn test_push_in_order() {
        let mut stages = StageList::new();
        stages.push(Stage::new(StageKind::Source, vec![source("src")])).unwrap();
        stages.push(Stage::new(StageKind::Build, vec![build("src", "out")])).unwrap();
        stages.push(Stage::new(StageKind::Deploy, vec![deploy("out")])).unwrap();

        let names: Vec<String> = stages.iter().map(Stage::name).collect();
        assert_eq!(names, vec!["Source", "Build", "Deploy"]);
        assert_eq!(stages.producer_of(&Artifact::new("out")), Some("Build-site"));
    }

    #[test]
    fn test_rejects_out_of_order_stage() {
        let mut stages = StageList::new();
        stages.push(Stage::new(StageKind::Source, vec![source("src")])).unwrap();
        stages.push(Stage::new(StageKind::Deploy, vec![deploy("src")])).unwrap();

        let result = stages.push(Stage::new(StageKind::Build, vec![build("src", "out")]));
        assert!(matches!(result, Err(WebStackError::StageOrder { .. })));
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn test_rejects_duplicate_stage() {
        let mut stages = StageList::new();
        stages.push(Stage::new(StageKind::Source, vec![source("a")])).unwrap();
        let result = stages.push(Stage::new(StageKind::Source, vec![source("b")]));
        assert!(matches!(result, Err(WebStackError::DuplicateStage { .. })));
    }

    #[test]
    fn test_rejects_dangling_input() {
        let mut stages = StageList::new();
        stages.push(Stage::new(StageKind::Source, vec![source("src")])).unwrap();

        let result = stages.push(Stage::new(StageKind::Build, vec![build("missing", "out")]));
        assert!(matches!(
            result,
            Err(WebStackError::DanglingArtifact { ref artifact, .. }) if artifact == "missing"
        ));
        assert!(stages.producer_of(&Artifact::new("out")).is_none());
    }

    #[test]
    fn test_rejects_duplicate_artifact() {
        let mut stages = StageList::new();
        stages.push(Stage::new(StageKind::Source, vec![source("src")])).unwrap();
        let result = stages.push(Stage::new(StageKind::Build, vec![build("src", "src")]));
        assert!(matches!(result, Err(WebStackError::DuplicateArtifact { .. })));
    }

    #[test]
    fn test_rejects_misplaced_and_empty() {
        let mut stages = StageList::new();
        let result = stages.push(Stage::new(StageKind::Source, vec![deploy("x")]));
        assert!(matches!(result, Err(WebStackError::MisplacedAction { .. })));

        let result = stages.push(Stage::new(StageKind::Source, vec![]));
        assert!(matches!(result, Err(WebStackError::EmptyStage { .. })));
        assert!(stages.is_empty());
    }
}
