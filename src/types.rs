use crate::path::RootPath;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind tag of a discovered endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    RestResource,
    ServletMapping,
    StaticResource,
    AdditionalEndpoint,
    NonJaxRsResource,
}

/// One HTTP operation on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MethodDescription {
    /// HTTP method token (GET, POST, ...)
    pub verb: String,
    /// Sub-path relative to the owning resource's base path
    pub path: String,
    /// Media type the operation produces
    pub produces: Option<String>,
    /// Media type the operation consumes
    pub consumes: Option<String>,
}

impl MethodDescription {
    pub fn new(
        verb: impl Into<String>,
        path: impl Into<String>,
        produces: Option<String>,
        consumes: Option<String>,
    ) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            produces,
            consumes,
        }
    }
}

/// A resource base path with the operations served below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResourceDescription {
    pub base_path: String,
    pub calls: Vec<MethodDescription>,
}

impl ResourceDescription {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            calls: Vec::new(),
        }
    }

    pub fn add_method(
        &mut self,
        verb: impl Into<String>,
        path: impl Into<String>,
        produces: Option<String>,
        consumes: Option<String>,
    ) -> &mut Self {
        self.calls
            .push(MethodDescription::new(verb, path, produces, consumes));
        self
    }

    /// Builder-style variant of [`ResourceDescription::add_method`]
    pub fn with_method(
        mut self,
        verb: impl Into<String>,
        path: impl Into<String>,
        produces: Option<String>,
        consumes: Option<String>,
    ) -> Self {
        self.add_method(verb, path, produces, consumes);
        self
    }
}

/// One endpoint handed over by a discovery collaborator.
///
/// Only the resource variants carry methods, so a servlet mapping or a
/// static file can never be built with operations attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointEntry {
    RestResource(ResourceDescription),
    NonJaxRsResource(ResourceDescription),
    ServletMapping { path: String },
    StaticResource { path: String },
    AdditionalEndpoint { path: String },
}

impl EndpointEntry {
    pub fn kind(&self) -> EndpointKind {
        match self {
            EndpointEntry::RestResource(_) => EndpointKind::RestResource,
            EndpointEntry::NonJaxRsResource(_) => EndpointKind::NonJaxRsResource,
            EndpointEntry::ServletMapping { .. } => EndpointKind::ServletMapping,
            EndpointEntry::StaticResource { .. } => EndpointKind::StaticResource,
            EndpointEntry::AdditionalEndpoint { .. } => EndpointKind::AdditionalEndpoint,
        }
    }

    /// Raw, un-normalized path (base path for resources)
    pub fn display_path(&self) -> &str {
        match self {
            EndpointEntry::RestResource(resource) | EndpointEntry::NonJaxRsResource(resource) => {
                &resource.base_path
            }
            EndpointEntry::ServletMapping { path }
            | EndpointEntry::StaticResource { path }
            | EndpointEntry::AdditionalEndpoint { path } => path,
        }
    }

    pub fn methods(&self) -> &[MethodDescription] {
        match self {
            EndpointEntry::RestResource(resource) | EndpointEntry::NonJaxRsResource(resource) => {
                &resource.calls
            }
            _ => &[],
        }
    }
}

// Response structures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(title = "Error Payload", description = "JSON body of an internal server error")]
pub struct ErrorPayload {
    /// Human-readable summary including the error id
    pub details: String,
    /// Textual stack, empty unless internals are shown
    pub stack: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Greeting", description = "Demo greeting message")]
pub struct Greeting {
    /// Who is greeted
    pub name: String,
    /// Rendered greeting text
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Health Response", description = "Service health status")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// Configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server port
    pub server_port: u16,
    /// Mount prefix of the whole application
    pub root_path: RootPath,
    /// Launch mode, decides whether error internals are shown
    pub launch_mode: LaunchMode,
    /// Template directory path (optional)
    pub template_dir: Option<String>,
    /// Directory whose files are listed as static resources (optional)
    pub static_dir: Option<String>,
    /// Extra paths listed on the 404 page
    pub additional_endpoints: Vec<String>,
    /// Failure handling
    pub failure: FailureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            root_path: RootPath::default(),
            launch_mode: LaunchMode::default(),
            template_dir: None,
            static_dir: None,
            additional_endpoints: vec![],
            failure: FailureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    Dev,
    Test,
    #[default]
    Prod,
}

impl LaunchMode {
    pub fn is_dev_or_test(self) -> bool {
        matches!(self, LaunchMode::Dev | LaunchMode::Test)
    }
}

impl std::str::FromStr for LaunchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(LaunchMode::Dev),
            "test" => Ok(LaunchMode::Test),
            "prod" | "production" => Ok(LaunchMode::Prod),
            other => Err(anyhow::anyhow!("Unknown launch mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureConfig {
    /// Name of a user-provided failure handler replacing the default one
    pub handler: Option<String>,
}
