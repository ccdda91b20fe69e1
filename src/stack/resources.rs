// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Resource declarations
//!
//! Plain data describing what the provisioning engine should create.
//! Resources refer to each other through [`Handle`]s, never through
//! hand-built strings.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use crate::errors::{WebStackError, WebStackResult};

/// Typed reference to a declared resource, by logical ID
pub struct Handle<T> {
    id: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            _kind: PhantomData,
        }
    }

    /// Logical ID of the referenced resource
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Managed secret holding the source-control token
#[derive(Clone)]
pub struct Secret {
    pub logical_id: String,
    pub name: String,
    pub description: String,
    pub value: String,
}

impl Secret {
    pub fn handle(&self) -> Handle<Secret> {
        Handle::new(&self.logical_id)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("logical_id", &self.logical_id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// What happens to a resource when the stack is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

impl RemovalPolicy {
    pub fn as_deletion_policy(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

/// Public access block settings; `true` blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPublicAccess {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl BlockPublicAccess {
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };

    pub const ALLOW_ALL: Self = Self {
        block_public_acls: false,
        block_public_policy: false,
        ignore_public_acls: false,
        restrict_public_buckets: false,
    };
}

/// Object storage bucket
#[derive(Debug, Clone)]
pub struct Bucket {
    pub logical_id: String,
    /// Physical name; `None` lets the provider generate one
    pub name: Option<String>,
    /// Hosting index document, enables static website hosting when set
    pub website_index_document: Option<String>,
    pub public_read_access: bool,
    pub block_public_access: BlockPublicAccess,
    pub encrypted: bool,
    pub removal_policy: RemovalPolicy,
}

impl Bucket {
    pub fn handle(&self) -> Handle<Bucket> {
        Handle::new(&self.logical_id)
    }

    pub fn is_website(&self) -> bool {
        self.website_index_document.is_some()
    }
}

/// Bucket policy granting anonymous read on every object
#[derive(Debug, Clone)]
pub struct PublicReadPolicy {
    pub logical_id: String,
    pub bucket: Handle<Bucket>,
}

/// What a role grant applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    Bucket(Handle<Bucket>),
    BucketObjects(Handle<Bucket>),
    Project(Handle<BuildProject>),
    /// Log groups of the build project with this physical name
    ///
    /// By name rather than handle: the project already depends on the role
    /// holding this grant.
    BuildLogs(String),
}

/// A single permission statement
#[derive(Debug, Clone)]
pub struct Grant {
    pub actions: Vec<String>,
    pub targets: Vec<GrantTarget>,
}

impl Grant {
    pub fn new(actions: &[&str], targets: Vec<GrantTarget>) -> Self {
        Self {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            targets,
        }
    }
}

/// Role assumed by a managed service
#[derive(Debug, Clone)]
pub struct ServiceRole {
    pub logical_id: String,
    /// Service principal allowed to assume the role
    pub principal: String,
    pub grants: Vec<Grant>,
}

impl ServiceRole {
    pub fn handle(&self) -> Handle<ServiceRole> {
        Handle::new(&self.logical_id)
    }
}

/// One named phase of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPhase {
    pub name: String,
    pub commands: Vec<String>,
}

/// Files collected from a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    pub base_directory: String,
    pub files: Vec<String>,
}

/// Build specification run by the managed build service
///
/// Phases keep their declaration order when serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub version: String,
    pub phases: Vec<BuildPhase>,
    pub artifacts: BuildArtifacts,
}

impl BuildSpec {
    pub fn phase(&self, name: &str) -> Option<&BuildPhase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Render as the JSON document the build service reads
    pub fn to_json_string(&self) -> WebStackResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

struct PhaseCommands<'a>(&'a [String]);

impl Serialize for PhaseCommands<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Phase", 1)?;
        s.serialize_field("commands", self.0)?;
        s.end()
    }
}

struct Phases<'a>(&'a [BuildPhase]);

impl Serialize for Phases<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for phase in self.0 {
            map.serialize_entry(&phase.name, &PhaseCommands(&phase.commands))?;
        }
        map.end()
    }
}

impl Serialize for BuildArtifacts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Artifacts", 2)?;
        s.serialize_field("base-directory", &self.base_directory)?;
        s.serialize_field("files", &self.files)?;
        s.end()
    }
}

impl Serialize for BuildSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BuildSpec", 3)?;
        s.serialize_field("version", &self.version)?;
        s.serialize_field("phases", &Phases(&self.phases))?;
        s.serialize_field("artifacts", &self.artifacts)?;
        s.end()
    }
}

/// Managed build environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub image: String,
    pub compute_type: String,
    pub privileged: bool,
}

/// Build project driven by the pipeline
#[derive(Debug, Clone)]
pub struct BuildProject {
    pub logical_id: String,
    pub name: String,
    pub build_spec: BuildSpec,
    pub environment: BuildEnvironment,
    pub role: Handle<ServiceRole>,
}

impl BuildProject {
    pub fn handle(&self) -> Handle<BuildProject> {
        Handle::new(&self.logical_id)
    }
}

/// Edge cache TTL bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub logical_id: String,
    pub name: String,
    min_ttl: Duration,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl CachePolicy {
    /// Create a cache policy; rejects TTLs outside `min <= default <= max`
    pub fn new(
        logical_id: impl Into<String>,
        name: impl Into<String>,
        min_ttl: Duration,
        default_ttl: Duration,
        max_ttl: Duration,
    ) -> WebStackResult<Self> {
        if min_ttl > default_ttl || default_ttl > max_ttl {
            return Err(WebStackError::InvalidTtl {
                min: min_ttl.as_secs(),
                default: default_ttl.as_secs(),
                max: max_ttl.as_secs(),
            });
        }

        Ok(Self {
            logical_id: logical_id.into(),
            name: name.into(),
            min_ttl,
            default_ttl,
            max_ttl,
        })
    }

    pub fn handle(&self) -> Handle<CachePolicy> {
        Handle::new(&self.logical_id)
    }

    pub fn min_ttl(&self) -> Duration {
        self.min_ttl
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_ttl(&self) -> Duration {
        self.max_ttl
    }
}

/// How viewers may reach the distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

impl fmt::Display for ViewerProtocolPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllowAll => write!(f, "allow-all"),
            Self::RedirectToHttps => write!(f, "redirect-to-https"),
            Self::HttpsOnly => write!(f, "https-only"),
        }
    }
}

/// Status code remapping at the edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub http_status: u16,
    pub response_http_status: u16,
    pub response_page_path: String,
}

/// CDN distribution fronting the website bucket
#[derive(Debug, Clone)]
pub struct Distribution {
    pub logical_id: String,
    /// Website endpoint of this bucket is the origin
    pub origin: Handle<Bucket>,
    pub cache_policy: Handle<CachePolicy>,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub default_root_object: String,
    pub error_responses: Vec<ErrorResponse>,
}

impl Distribution {
    pub fn handle(&self) -> Handle<Distribution> {
        Handle::new(&self.logical_id)
    }
}

/// Value surfaced by the stack after it is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
    DistributionDomainName(Handle<Distribution>),
}

/// Named stack output
#[derive(Debug, Clone)]
pub struct StackOutput {
    pub name: String,
    pub description: String,
    pub value: OutputValue,
}
