// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Template synthesis
//!
//! Renders an assembled [`WebStack`] as a CloudFormation template.
//! Cross-resource references become `Ref`/`Fn::GetAtt`, so the engine
//! derives creation order from them.

use serde_json::{json, Value};
use tracing::info;

use super::intrinsic::{secret_reference, Expr};
use super::{Output, Resource, Template};
use crate::errors::{WebStackError, WebStackResult};
use crate::stack::pipeline::{Action, SourceTrigger};
use crate::stack::resources::{Bucket, GrantTarget, Handle, OutputValue, Secret, ServiceRole};
use crate::stack::{ResourceGraph, WebStack};

const POLICY_VERSION: &str = "2012-10-17";

/// Builds templates from assembled stacks
pub struct TemplateSynthesizer<'a> {
    stack: &'a WebStack,
}

impl<'a> TemplateSynthesizer<'a> {
    pub fn new(stack: &'a WebStack) -> Self {
        Self { stack }
    }

    /// Synthesize a stack
    ///
    /// Fails if any handle points at a resource the stack doesn't declare.
    pub fn synthesize(stack: &WebStack) -> WebStackResult<Template> {
        TemplateSynthesizer::new(stack).build()
    }

    fn build(&self) -> WebStackResult<Template> {
        let stack = self.stack;
        ResourceGraph::build(stack)?;

        let mut template = Template::new(stack.description.clone());
        let mut add = |id: &str, resource: Resource| {
            template.resources.insert(id.to_string(), resource);
        };

        add(&stack.secret.logical_id, self.secret());
        add(&stack.website_bucket.logical_id, self.bucket(&stack.website_bucket));
        add(&stack.website_bucket_policy.logical_id, self.public_read_policy());
        add(&stack.artifact_bucket.logical_id, self.bucket(&stack.artifact_bucket));
        add(&stack.build_role.logical_id, self.role(&stack.build_role));
        add(&stack.build_project.logical_id, self.build_project()?);
        add(&stack.pipeline_role.logical_id, self.role(&stack.pipeline_role));
        add(&stack.pipeline.logical_id, self.pipeline()?);
        if let Some(webhook) = self.webhook()? {
            add(&stack.webhook.logical_id, webhook);
        }
        add(&stack.cache_policy.logical_id, self.cache_policy());
        add(&stack.distribution.logical_id, self.distribution());

        for output in &stack.outputs {
            let value = match &output.value {
                OutputValue::DistributionDomainName(d) => Expr::attribute(d, "DomainName"),
            };
            template.outputs.insert(
                output.name.clone(),
                Output {
                    description: output.description.clone(),
                    value: value.into(),
                },
            );
        }

        info!(
            stack = %stack.name,
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "synthesized template"
        );

        Ok(template)
    }

    fn secret(&self) -> Resource {
        let secret = &self.stack.secret;
        Resource::new(
            "AWS::SecretsManager::Secret",
            json!({
                "Name": secret.name,
                "Description": secret.description,
                "SecretString": secret.value,
            }),
        )
    }

    fn bucket(&self, bucket: &Bucket) -> Resource {
        let mut props = json!({
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": bucket.block_public_access.block_public_acls,
                "BlockPublicPolicy": bucket.block_public_access.block_public_policy,
                "IgnorePublicAcls": bucket.block_public_access.ignore_public_acls,
                "RestrictPublicBuckets": bucket.block_public_access.restrict_public_buckets,
            },
        });
        if let Some(name) = &bucket.name {
            props["BucketName"] = Expr::name(name).into();
        }
        if let Some(index) = &bucket.website_index_document {
            props["WebsiteConfiguration"] = json!({ "IndexDocument": index });
        }
        if bucket.encrypted {
            props["BucketEncryption"] = json!({
                "ServerSideEncryptionConfiguration": [
                    { "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" } }
                ]
            });
        }

        Resource::new("AWS::S3::Bucket", props)
            .removal_policy(bucket.removal_policy.as_deletion_policy())
    }

    fn public_read_policy(&self) -> Resource {
        let bucket = &self.stack.website_bucket_policy.bucket;
        Resource::new(
            "AWS::S3::BucketPolicy",
            json!({
                "Bucket": Expr::reference(bucket),
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Action": "s3:GetObject",
                        "Effect": "Allow",
                        "Principal": { "AWS": "*" },
                        "Resource": Expr::objects_of(bucket),
                    }],
                },
            }),
        )
    }

    fn grant_resources(target: &GrantTarget) -> Vec<Expr> {
        match target {
            GrantTarget::Bucket(b) => vec![Expr::attribute(b, "Arn")],
            GrantTarget::BucketObjects(b) => vec![Expr::objects_of(b)],
            GrantTarget::Project(p) => vec![Expr::attribute(p, "Arn")],
            GrantTarget::BuildLogs(project) => {
                let group = format!(
                    "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:/aws/codebuild/{}",
                    project
                );
                vec![Expr::Sub(group.clone()), Expr::Sub(format!("{}:*", group))]
            }
        }
    }

    fn role(&self, role: &ServiceRole) -> Resource {
        let statements: Vec<Value> = role
            .grants
            .iter()
            .map(|grant| {
                let resources: Vec<Expr> = grant.targets.iter().flat_map(Self::grant_resources).collect();
                json!({
                    "Action": grant.actions,
                    "Effect": "Allow",
                    "Resource": resources,
                })
            })
            .collect();

        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": role.principal },
                    }],
                },
                "Policies": [{
                    "PolicyName": format!("{}DefaultPolicy", role.logical_id),
                    "PolicyDocument": {
                        "Version": POLICY_VERSION,
                        "Statement": statements,
                    },
                }],
            }),
        )
    }

    fn build_project(&self) -> WebStackResult<Resource> {
        let project = &self.stack.build_project;
        Ok(Resource::new(
            "AWS::CodeBuild::Project",
            json!({
                "Name": project.name,
                "ServiceRole": Expr::attribute(&project.role, "Arn"),
                "Source": {
                    "Type": "CODEPIPELINE",
                    "BuildSpec": project.build_spec.to_json_string()?,
                },
                "Artifacts": { "Type": "CODEPIPELINE" },
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "ComputeType": project.environment.compute_type,
                    "Image": project.environment.image,
                    "ImagePullCredentialsType": "CODEBUILD",
                    "PrivilegedMode": project.environment.privileged,
                },
            }),
        ))
    }

    fn secret_name(&self, handle: &Handle<Secret>, referrer: &str) -> WebStackResult<&str> {
        self.stack
            .secret(handle)
            .map(|s| s.name.as_str())
            .ok_or_else(|| WebStackError::UnknownReference {
                resource: referrer.to_string(),
                target: handle.id().to_string(),
            })
    }

    fn action(&self, action: &Action) -> WebStackResult<Value> {
        let value = match action {
            Action::Source(source) => json!({
                "Name": source.name,
                "ActionTypeId": {
                    "Category": "Source",
                    "Owner": "ThirdParty",
                    "Provider": "GitHub",
                    "Version": "1",
                },
                "Configuration": {
                    "Owner": source.owner,
                    "Repo": source.repo,
                    "Branch": source.branch,
                    "OAuthToken": secret_reference(self.secret_name(&source.secret, &source.name)?),
                    "PollForSourceChanges": source.trigger == SourceTrigger::Poll,
                },
                "OutputArtifacts": [{ "Name": source.output.name() }],
                "RunOrder": 1,
            }),
            Action::Build(build) => json!({
                "Name": build.name,
                "ActionTypeId": {
                    "Category": "Build",
                    "Owner": "AWS",
                    "Provider": "CodeBuild",
                    "Version": "1",
                },
                "Configuration": { "ProjectName": Expr::reference(&build.project) },
                "InputArtifacts": [{ "Name": build.input.name() }],
                "OutputArtifacts": [{ "Name": build.output.name() }],
                "RunOrder": 1,
            }),
            Action::Deploy(deploy) => json!({
                "Name": deploy.name,
                "ActionTypeId": {
                    "Category": "Deploy",
                    "Owner": "AWS",
                    "Provider": "S3",
                    "Version": "1",
                },
                "Configuration": {
                    "BucketName": Expr::reference(&deploy.bucket),
                    "Extract": deploy.extract.to_string(),
                },
                "InputArtifacts": [{ "Name": deploy.input.name() }],
                "RunOrder": 1,
            }),
        };
        Ok(value)
    }

    fn pipeline(&self) -> WebStackResult<Resource> {
        let pipeline = &self.stack.pipeline;

        let mut stages = Vec::with_capacity(pipeline.stages.len());
        for stage in &pipeline.stages {
            let actions = stage
                .actions
                .iter()
                .map(|a| self.action(a))
                .collect::<WebStackResult<Vec<_>>>()?;
            stages.push(json!({ "Name": stage.name(), "Actions": actions }));
        }

        // The token is read through a dynamic reference, which carries no
        // implicit dependency on the secret.
        let mut resource = Resource::new(
            "AWS::CodePipeline::Pipeline",
            json!({
                "Name": pipeline.name,
                "RoleArn": Expr::attribute(&pipeline.role, "Arn"),
                "ArtifactStore": {
                    "Type": "S3",
                    "Location": Expr::reference(&pipeline.artifact_bucket),
                },
                "Stages": stages,
            }),
        );
        if let Some(source) = pipeline.source_action() {
            resource = resource.depends_on(source.secret.id());
        }
        Ok(resource)
    }

    fn webhook(&self) -> WebStackResult<Option<Resource>> {
        let webhook = &self.stack.webhook;
        let Some(source) = self.stack.pipeline.source_action() else {
            return Ok(None);
        };
        if source.trigger != SourceTrigger::Webhook {
            return Ok(None);
        }

        let token = secret_reference(self.secret_name(&webhook.secret, &webhook.logical_id)?);
        Ok(Some(
            Resource::new(
                "AWS::CodePipeline::Webhook",
                json!({
                    "Authentication": "GITHUB_HMAC",
                    "AuthenticationConfiguration": { "SecretToken": token },
                    "Filters": [{
                        "JsonPath": "$.ref",
                        "MatchEquals": "refs/heads/{Branch}",
                    }],
                    "TargetAction": webhook.target_action,
                    "TargetPipeline": Expr::reference(&webhook.pipeline),
                    "TargetPipelineVersion": 1,
                    "RegisterWithThirdParty": true,
                }),
            )
            .depends_on(webhook.secret.id()),
        ))
    }

    fn cache_policy(&self) -> Resource {
        let policy = &self.stack.cache_policy;
        Resource::new(
            "AWS::CloudFront::CachePolicy",
            json!({
                "CachePolicyConfig": {
                    "Name": Expr::name(&policy.name),
                    "MinTTL": policy.min_ttl().as_secs(),
                    "DefaultTTL": policy.default_ttl().as_secs(),
                    "MaxTTL": policy.max_ttl().as_secs(),
                    "ParametersInCacheKeyAndForwardedToOrigin": {
                        "CookiesConfig": { "CookieBehavior": "none" },
                        "HeadersConfig": { "HeaderBehavior": "none" },
                        "QueryStringsConfig": { "QueryStringBehavior": "none" },
                        "EnableAcceptEncodingGzip": false,
                        "EnableAcceptEncodingBrotli": false,
                    },
                },
            }),
        )
    }

    fn distribution(&self) -> Resource {
        let dist = &self.stack.distribution;
        let origin_id = format!("{}Origin", dist.origin.id());

        // Website endpoint host, without the http:// scheme
        let origin_domain = Expr::Select(
            2,
            Box::new(Expr::Split(
                "/".into(),
                Box::new(Expr::attribute(&dist.origin, "WebsiteURL")),
            )),
        );

        let error_responses: Vec<Value> = dist
            .error_responses
            .iter()
            .map(|r| {
                json!({
                    "ErrorCode": r.http_status,
                    "ResponseCode": r.response_http_status,
                    "ResponsePagePath": r.response_page_path,
                })
            })
            .collect();

        Resource::new(
            "AWS::CloudFront::Distribution",
            json!({
                "DistributionConfig": {
                    "Enabled": true,
                    "HttpVersion": "http2",
                    "IPV6Enabled": true,
                    "DefaultRootObject": dist.default_root_object,
                    "Origins": [{
                        "Id": origin_id,
                        "DomainName": origin_domain,
                        "CustomOriginConfig": { "OriginProtocolPolicy": "http-only" },
                    }],
                    "DefaultCacheBehavior": {
                        "TargetOriginId": origin_id,
                        "ViewerProtocolPolicy": dist.viewer_protocol_policy.to_string(),
                        "CachePolicyId": Expr::reference(&dist.cache_policy),
                        "Compress": true,
                    },
                    "CustomErrorResponses": error_responses,
                },
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Environment, StackContext};
    use crate::stack::naming::logical_ids;
    use crate::stack::{Stage, StageList};

    fn stack_in(env: Environment) -> WebStack {
        WebStack::assemble(&StackContext::new("<secret>", "acme", "site", "main"), &env).unwrap()
    }

    fn template() -> Template {
        TemplateSynthesizer::synthesize(&stack_in(Environment::new("123456789012", "us-east-1"))).unwrap()
    }

    fn props<'a>(template: &'a Template, id: &str) -> &'a Value {
        &template.resource(id).unwrap().properties
    }

    #[test]
    fn test_declares_every_resource() {
        let t = template();
        assert_eq!(t.resources.len(), 11);
        assert_eq!(t.resources_of_type("AWS::S3::Bucket").len(), 2);
        assert_eq!(t.resources_of_type("AWS::IAM::Role").len(), 2);
        assert_eq!(t.format_version, "2010-09-09");
    }

    #[test]
    fn test_secret_and_source_action() {
        let t = template();
        assert_eq!(props(&t, logical_ids::SECRET)["Name"], "GitHub-Token-site");
        assert_eq!(props(&t, logical_ids::SECRET)["SecretString"], "<secret>");

        let stages = &props(&t, logical_ids::PIPELINE)["Stages"];
        let source = &stages[0]["Actions"][0];
        assert_eq!(stages[0]["Name"], "Source");
        assert_eq!(source["Name"], "WebAppSource-site");
        assert_eq!(source["Configuration"]["Owner"], "acme");
        assert_eq!(source["Configuration"]["Branch"], "main");
        assert_eq!(
            source["Configuration"]["OAuthToken"],
            "{{resolve:secretsmanager:GitHub-Token-site:SecretString:::}}"
        );
        assert_eq!(source["Configuration"]["PollForSourceChanges"], false);
    }

    #[test]
    fn test_pipeline_stages_chain_artifacts() {
        let t = template();
        let pipeline = props(&t, logical_ids::PIPELINE);
        assert_eq!(pipeline["Name"], "webAppPipeline-site");

        let stages = pipeline["Stages"].as_array().unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s["Name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Source", "Build", "Deploy"]);

        let build = &stages[1]["Actions"][0];
        let deploy = &stages[2]["Actions"][0];
        assert_eq!(build["InputArtifacts"][0], stages[0]["Actions"][0]["OutputArtifacts"][0]);
        assert_eq!(deploy["InputArtifacts"][0], build["OutputArtifacts"][0]);
        assert_eq!(build["Configuration"]["ProjectName"], json!({ "Ref": "BuildProject" }));
        assert_eq!(deploy["Configuration"]["BucketName"], json!({ "Ref": "WebappBucket" }));
        assert_eq!(deploy["Configuration"]["Extract"], "true");

        let resource = t.resource(logical_ids::PIPELINE).unwrap();
        assert_eq!(resource.depends_on, vec![logical_ids::SECRET]);
    }

    #[test]
    fn test_website_bucket() {
        let t = template();
        let bucket = t.resource(logical_ids::WEBSITE_BUCKET).unwrap();
        assert_eq!(bucket.properties["BucketName"], "webapp-site-123456789012-us-east-1");
        assert_eq!(bucket.properties["WebsiteConfiguration"]["IndexDocument"], "index.html");
        assert_eq!(bucket.properties["PublicAccessBlockConfiguration"]["BlockPublicPolicy"], false);
        assert_eq!(bucket.deletion_policy.as_deref(), Some("Delete"));

        let artifacts = t.resource(logical_ids::ARTIFACTS_BUCKET).unwrap();
        assert!(artifacts.properties.get("BucketName").is_none());
        assert_eq!(artifacts.deletion_policy.as_deref(), Some("Retain"));
    }

    #[test]
    fn test_agnostic_bucket_name_uses_sub() {
        let t = TemplateSynthesizer::synthesize(&stack_in(Environment::agnostic())).unwrap();
        assert_eq!(
            props(&t, logical_ids::WEBSITE_BUCKET)["BucketName"],
            json!({ "Fn::Sub": "webapp-site-${AWS::AccountId}-${AWS::Region}" })
        );
    }

    #[test]
    fn test_build_project_spec() {
        let t = template();
        let project = props(&t, logical_ids::BUILD_PROJECT);
        assert_eq!(project["Name"], "BuildProject-site");
        assert_eq!(project["Environment"]["Image"], "aws/codebuild/standard:5.0");

        let spec: Value = serde_json::from_str(project["Source"]["BuildSpec"].as_str().unwrap()).unwrap();
        assert_eq!(spec["phases"]["install"]["commands"], json!(["npm install"]));
        assert_eq!(spec["phases"]["build"]["commands"], json!(["npm run build"]));
        assert_eq!(spec["artifacts"]["base-directory"], "build");
    }

    #[test]
    fn test_cache_policy_and_distribution() {
        let t = template();
        let config = &props(&t, logical_ids::CACHE_POLICY)["CachePolicyConfig"];
        assert_eq!(config["MinTTL"], 1);
        assert_eq!(config["DefaultTTL"], 60);
        assert_eq!(config["MaxTTL"], 120);

        let dist = &props(&t, logical_ids::DISTRIBUTION)["DistributionConfig"];
        assert_eq!(dist["DefaultRootObject"], "index.html");
        assert_eq!(dist["DefaultCacheBehavior"]["ViewerProtocolPolicy"], "redirect-to-https");
        assert_eq!(dist["DefaultCacheBehavior"]["CachePolicyId"], json!({ "Ref": "CustomCachePolicy" }));
        assert_eq!(
            dist["CustomErrorResponses"],
            json!([{ "ErrorCode": 404, "ResponseCode": 200, "ResponsePagePath": "/index.html" }])
        );
        assert_eq!(
            dist["Origins"][0]["DomainName"]["Fn::Select"][1]["Fn::Split"][1],
            json!({ "Fn::GetAtt": ["WebappBucket", "WebsiteURL"] })
        );
    }

    #[test]
    fn test_cache_policy_name_deferred_when_agnostic() {
        let t = TemplateSynthesizer::synthesize(&stack_in(Environment::agnostic())).unwrap();
        assert_eq!(
            props(&t, logical_ids::CACHE_POLICY)["CachePolicyConfig"]["Name"],
            json!({ "Fn::Sub": "CustomCachePolicy-site-${AWS::Region}" })
        );
    }

    #[test]
    fn test_dotted_repo_synthesizes() {
        let stack = WebStack::assemble(
            &StackContext::new("<secret>", "acme", "acme.github.io", "main"),
            &Environment::new("123456789012", "us-east-1"),
        )
        .unwrap();
        let t = TemplateSynthesizer::synthesize(&stack).unwrap();

        assert_eq!(
            props(&t, logical_ids::CACHE_POLICY)["CachePolicyConfig"]["Name"],
            "CustomCachePolicy-acme-github-io-us-east-1"
        );
        assert_eq!(props(&t, logical_ids::BUILD_PROJECT)["Name"], "BuildProject-acme-github-io");
        assert_eq!(
            props(&t, logical_ids::WEBSITE_BUCKET)["BucketName"],
            "webapp-acme.github.io-123456789012-us-east-1"
        );
        let source = &props(&t, logical_ids::PIPELINE)["Stages"][0]["Actions"][0];
        assert_eq!(source["Configuration"]["Repo"], "acme.github.io");
        assert_eq!(source["OutputArtifacts"][0]["Name"], "Artifact_Source_WebAppSourceacmegithubio");
    }

    #[test]
    fn test_distribution_output() {
        let t = template();
        let output = &t.outputs["DistributionURL"];
        assert_eq!(output.description, "Website URL");
        assert_eq!(output.value, json!({ "Fn::GetAtt": ["WebAppDistribution", "DomainName"] }));
    }

    #[test]
    fn test_webhook_filters_branch() {
        let t = template();
        let webhook = t.resource(logical_ids::WEBHOOK).unwrap();
        assert_eq!(webhook.properties["TargetAction"], "WebAppSource-site");
        assert_eq!(webhook.properties["Filters"][0]["MatchEquals"], "refs/heads/{Branch}");
        assert_eq!(webhook.properties["TargetPipeline"], json!({ "Ref": "WebAppPipeline" }));
        assert_eq!(webhook.depends_on, vec![logical_ids::SECRET]);
    }

    #[test]
    fn test_polling_source_has_no_webhook() {
        let mut stack = stack_in(Environment::new("123456789012", "us-east-1"));
        let mut stages = StageList::new();
        for stage in stack.pipeline.stages.iter() {
            let mut stage: Stage = stage.clone();
            if let Some(Action::Source(s)) = stage.actions.first_mut() {
                s.trigger = SourceTrigger::Poll;
            }
            stages.push(stage).unwrap();
        }
        stack.pipeline.stages = stages;

        let t = TemplateSynthesizer::synthesize(&stack).unwrap();
        assert!(t.resource(logical_ids::WEBHOOK).is_none());
        assert_eq!(
            props(&t, logical_ids::PIPELINE)["Stages"][0]["Actions"][0]["Configuration"]["PollForSourceChanges"],
            true
        );
    }

    #[test]
    fn test_roles_grant_build_and_deploy() {
        let t = template();
        let pipeline_role = props(&t, logical_ids::PIPELINE_ROLE);
        assert_eq!(
            pipeline_role["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            "codepipeline.amazonaws.com"
        );
        let statements = pipeline_role["Policies"][0]["PolicyDocument"]["Statement"].as_array().unwrap();
        assert!(statements.iter().any(|s| s["Resource"][0] == json!({ "Fn::GetAtt": ["BuildProject", "Arn"] })));

        let build_role = props(&t, logical_ids::BUILD_PROJECT_ROLE);
        let logs = &build_role["Policies"][0]["PolicyDocument"]["Statement"][0]["Resource"][0]["Fn::Sub"];
        assert!(logs.as_str().unwrap().ends_with(":log-group:/aws/codebuild/BuildProject-site"));
    }

    #[test]
    fn test_dangling_handle_fails() {
        let mut stack = stack_in(Environment::new("123456789012", "us-east-1"));
        stack.webhook.secret = Handle::new("OtherSecret");
        assert!(matches!(
            TemplateSynthesizer::synthesize(&stack),
            Err(WebStackError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let t = template();
        let parsed = Template::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(parsed, t);
        assert!(t.to_yaml().unwrap().contains("AWSTemplateFormatVersion"));
    }
}
