// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Stack assembly
//!
//! Turns a [`StackContext`] and [`Environment`] into the full set of
//! resource declarations, in dependency order.

use std::time::Duration;
use tracing::debug;

use super::naming::{self, logical_ids};
use super::pipeline::{
    Action, Artifact, CodeBuild, GitHubSource, Pipeline, S3Deploy, SourceTrigger, Stage,
    StageKind, StageList, Webhook,
};
use super::resources::{
    BlockPublicAccess, Bucket, BuildArtifacts, BuildEnvironment, BuildPhase, BuildProject,
    BuildSpec, CachePolicy, Distribution, ErrorResponse, Grant, GrantTarget, Handle, OutputValue,
    PublicReadPolicy, RemovalPolicy, Secret, ServiceRole, StackOutput, ViewerProtocolPolicy,
};
use crate::context::{Environment, StackContext};
use crate::errors::WebStackResult;

/// Default stack name
pub const STACK_NAME: &str = "WebDevOpsPipelineStack";

/// Document served for `/` and as the fallback for unknown paths
pub const INDEX_DOCUMENT: &str = "index.html";

/// Install phase commands
pub const INSTALL_COMMANDS: &[&str] = &["npm install"];

/// Build phase commands; the build is expected to write into [`BUILD_OUTPUT_DIR`]
pub const BUILD_COMMANDS: &[&str] = &["npm run build"];

pub const BUILD_OUTPUT_DIR: &str = "build";
pub const BUILD_OUTPUT_FILES: &str = "**/*";
pub const BUILD_SPEC_VERSION: &str = "0.2";
pub const BUILD_IMAGE: &str = "aws/codebuild/standard:5.0";
pub const BUILD_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";

pub const MIN_TTL: Duration = Duration::from_secs(1);
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const MAX_TTL: Duration = Duration::from_secs(120);

const ARTIFACT_READ_WRITE: &[&str] = &[
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

const BUILD_CONTROL: &[&str] = &["codebuild:BatchGetBuilds", "codebuild:StartBuild", "codebuild:StopBuild"];

const BUILD_LOGGING: &[&str] = &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"];

/// Every declaration making up one website delivery stack
#[derive(Debug, Clone)]
pub struct WebStack {
    pub name: String,
    pub description: String,
    pub environment: Environment,
    pub secret: Secret,
    pub website_bucket: Bucket,
    pub website_bucket_policy: PublicReadPolicy,
    pub artifact_bucket: Bucket,
    pub build_role: ServiceRole,
    pub build_project: BuildProject,
    pub pipeline_role: ServiceRole,
    pub pipeline: Pipeline,
    pub webhook: Webhook,
    pub cache_policy: CachePolicy,
    pub distribution: Distribution,
    pub outputs: Vec<StackOutput>,
}

impl WebStack {
    /// Assemble the stack
    ///
    /// Fails only on declarations the provider would reject outright: a
    /// bucket name it can't accept, or a pipeline whose stages don't chain.
    pub fn assemble(ctx: &StackContext, env: &Environment) -> WebStackResult<Self> {
        let repo = ctx.github_repo.as_str();
        debug!(repo, owner = %ctx.github_owner, branch = %ctx.github_branch, "assembling stack");

        let secret = Secret {
            logical_id: logical_ids::SECRET.into(),
            name: naming::secret_name(repo),
            description: format!("GitHub personal access token for {}", repo),
            value: ctx.github_token.clone(),
        };

        let bucket_name = naming::bucket_name(
            repo,
            env.account_or_placeholder(),
            env.region_or_placeholder(),
        );
        if env.is_resolved() {
            naming::validate_bucket_name(&bucket_name)?;
        }
        let website_bucket = Bucket {
            logical_id: logical_ids::WEBSITE_BUCKET.into(),
            name: Some(bucket_name),
            website_index_document: Some(INDEX_DOCUMENT.into()),
            public_read_access: true,
            block_public_access: BlockPublicAccess::ALLOW_ALL,
            encrypted: false,
            removal_policy: RemovalPolicy::Destroy,
        };
        let website_bucket_policy = PublicReadPolicy {
            logical_id: logical_ids::WEBSITE_BUCKET_POLICY.into(),
            bucket: website_bucket.handle(),
        };
        debug!(bucket = ?website_bucket.name, "declared website bucket");

        let artifact_bucket = Bucket {
            logical_id: logical_ids::ARTIFACTS_BUCKET.into(),
            name: None,
            website_index_document: None,
            public_read_access: false,
            block_public_access: BlockPublicAccess::BLOCK_ALL,
            encrypted: true,
            removal_policy: RemovalPolicy::Retain,
        };

        let project_name = naming::build_project_name(repo);
        let build_role = ServiceRole {
            logical_id: logical_ids::BUILD_PROJECT_ROLE.into(),
            principal: "codebuild.amazonaws.com".into(),
            grants: vec![
                Grant::new(BUILD_LOGGING, vec![GrantTarget::BuildLogs(project_name.clone())]),
                Grant::new(
                    ARTIFACT_READ_WRITE,
                    vec![
                        GrantTarget::Bucket(artifact_bucket.handle()),
                        GrantTarget::BucketObjects(artifact_bucket.handle()),
                    ],
                ),
            ],
        };
        let build_project = BuildProject {
            logical_id: logical_ids::BUILD_PROJECT.into(),
            name: project_name,
            build_spec: default_build_spec(),
            environment: BuildEnvironment {
                image: BUILD_IMAGE.into(),
                compute_type: BUILD_COMPUTE_TYPE.into(),
                privileged: false,
            },
            role: build_role.handle(),
        };
        debug!(project = %build_project.name, "declared build project");

        let pipeline_role = ServiceRole {
            logical_id: logical_ids::PIPELINE_ROLE.into(),
            principal: "codepipeline.amazonaws.com".into(),
            grants: vec![
                Grant::new(
                    ARTIFACT_READ_WRITE,
                    vec![
                        GrantTarget::Bucket(artifact_bucket.handle()),
                        GrantTarget::BucketObjects(artifact_bucket.handle()),
                    ],
                ),
                Grant::new(BUILD_CONTROL, vec![GrantTarget::Project(build_project.handle())]),
                Grant::new(
                    ARTIFACT_READ_WRITE,
                    vec![
                        GrantTarget::Bucket(website_bucket.handle()),
                        GrantTarget::BucketObjects(website_bucket.handle()),
                    ],
                ),
            ],
        };

        let stages = wire_stages(ctx, &secret, &build_project, &website_bucket)?;
        let pipeline = Pipeline {
            logical_id: logical_ids::PIPELINE.into(),
            name: naming::pipeline_name(repo),
            role: pipeline_role.handle(),
            artifact_bucket: artifact_bucket.handle(),
            stages,
        };
        debug!(pipeline = %pipeline.name, stages = ?pipeline.stage_names(), "declared pipeline");

        let webhook = Webhook {
            logical_id: logical_ids::WEBHOOK.into(),
            pipeline: pipeline.handle(),
            target_action: naming::source_action_name(repo),
            branch: ctx.github_branch.clone(),
            secret: secret.handle(),
        };

        let cache_policy = CachePolicy::new(
            logical_ids::CACHE_POLICY,
            naming::cache_policy_name(repo, env.region_or_placeholder()),
            MIN_TTL,
            DEFAULT_TTL,
            MAX_TTL,
        )?;

        let distribution = Distribution {
            logical_id: logical_ids::DISTRIBUTION.into(),
            origin: website_bucket.handle(),
            cache_policy: cache_policy.handle(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            default_root_object: INDEX_DOCUMENT.into(),
            error_responses: vec![ErrorResponse {
                http_status: 404,
                response_http_status: 200,
                response_page_path: format!("/{}", INDEX_DOCUMENT),
            }],
        };

        let outputs = vec![StackOutput {
            name: naming::DISTRIBUTION_OUTPUT_NAME.into(),
            description: "Website URL".into(),
            value: OutputValue::DistributionDomainName(distribution.handle()),
        }];

        Ok(Self {
            name: STACK_NAME.into(),
            description: format!(
                "Continuous delivery pipeline and CDN for {}/{}",
                ctx.github_owner, repo
            ),
            environment: env.clone(),
            secret,
            website_bucket,
            website_bucket_policy,
            artifact_bucket,
            build_role,
            build_project,
            pipeline_role,
            pipeline,
            webhook,
            cache_policy,
            distribution,
            outputs,
        })
    }

    /// Physical name of the website bucket
    pub fn bucket_name(&self) -> &str {
        self.website_bucket.name.as_deref().unwrap_or_default()
    }

    /// Look up a service role by handle
    pub fn role(&self, handle: &Handle<ServiceRole>) -> Option<&ServiceRole> {
        [&self.build_role, &self.pipeline_role]
            .into_iter()
            .find(|r| r.logical_id == handle.id())
    }

    /// Look up a bucket by handle
    pub fn bucket(&self, handle: &Handle<Bucket>) -> Option<&Bucket> {
        [&self.website_bucket, &self.artifact_bucket]
            .into_iter()
            .find(|b| b.logical_id == handle.id())
    }

    /// Look up the secret by handle
    pub fn secret(&self, handle: &Handle<Secret>) -> Option<&Secret> {
        (self.secret.logical_id == handle.id()).then_some(&self.secret)
    }
}

fn commands(cmds: &[&str]) -> Vec<String> {
    cmds.iter().map(|c| c.to_string()).collect()
}

fn default_build_spec() -> BuildSpec {
    BuildSpec {
        version: BUILD_SPEC_VERSION.into(),
        phases: vec![
            BuildPhase {
                name: "install".into(),
                commands: commands(INSTALL_COMMANDS),
            },
            BuildPhase {
                name: "build".into(),
                commands: commands(BUILD_COMMANDS),
            },
        ],
        artifacts: BuildArtifacts {
            base_directory: BUILD_OUTPUT_DIR.into(),
            files: vec![BUILD_OUTPUT_FILES.into()],
        },
    }
}

/// Source → Build → Deploy, chained through artifacts
fn wire_stages(
    ctx: &StackContext,
    secret: &Secret,
    project: &BuildProject,
    bucket: &Bucket,
) -> WebStackResult<StageList> {
    let repo = ctx.github_repo.as_str();
    let mut stages = StageList::new();

    let source_name = naming::source_action_name(repo);
    let source_output = Artifact::new(naming::artifact_name("Source", &source_name));
    stages.push(Stage::new(
        StageKind::Source,
        vec![Action::Source(GitHubSource {
            name: source_name,
            owner: ctx.github_owner.clone(),
            repo: repo.to_string(),
            branch: ctx.github_branch.clone(),
            secret: secret.handle(),
            trigger: SourceTrigger::Webhook,
            output: source_output.clone(),
        })],
    ))?;

    let build_name = naming::build_action_name(repo);
    let build_output = Artifact::new(naming::artifact_name("Build", &build_name));
    stages.push(Stage::new(
        StageKind::Build,
        vec![Action::Build(CodeBuild {
            name: build_name,
            project: project.handle(),
            input: source_output,
            output: build_output.clone(),
        })],
    ))?;

    stages.push(Stage::new(
        StageKind::Deploy,
        vec![Action::Deploy(S3Deploy {
            name: naming::DEPLOY_ACTION_NAME.into(),
            bucket: bucket.handle(),
            input: build_output,
            extract: true,
        })],
    ))?;

    Ok(stages)
}
