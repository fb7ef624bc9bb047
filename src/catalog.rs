use crate::types::{EndpointEntry, ResourceDescription};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use utoipa::openapi::path::Operation;
use utoipa::openapi::{OpenApi, RefOr};

/// Upper bound on static files listed on the 404 page
pub const MAX_STATIC_RESOURCES: usize = 1000;

/// Endpoints known to the application, frozen once built.
///
/// Servlet mappings and static resources are kept sorted; resources and
/// additional endpoints keep the order they were discovered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointCatalog {
    resources: Vec<ResourceDescription>,
    servlet_mappings: Vec<String>,
    static_resources: Vec<String>,
    additional_endpoints: Vec<String>,
}

impl EndpointCatalog {
    pub fn new(
        resources: Vec<ResourceDescription>,
        servlet_mappings: impl IntoIterator<Item = String>,
        static_resources: impl IntoIterator<Item = String>,
        additional_endpoints: Vec<String>,
    ) -> Self {
        Self {
            resources,
            servlet_mappings: sorted(servlet_mappings),
            static_resources: sorted(static_resources),
            additional_endpoints,
        }
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn resources(&self) -> &[ResourceDescription] {
        &self.resources
    }

    pub fn servlet_mappings(&self) -> &[String] {
        &self.servlet_mappings
    }

    pub fn static_resources(&self) -> &[String] {
        &self.static_resources
    }

    pub fn additional_endpoints(&self) -> &[String] {
        &self.additional_endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
            && self.servlet_mappings.is_empty()
            && self.static_resources.is_empty()
            && self.additional_endpoints.is_empty()
    }
}

fn sorted(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Collects endpoint descriptions from discovery sources during startup
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceDescription>,
    servlet_mappings: Vec<String>,
    static_files: Vec<String>,
    additional_endpoints: Vec<String>,
}

impl CatalogBuilder {
    pub fn entry(mut self, entry: EndpointEntry) -> Self {
        match entry {
            EndpointEntry::RestResource(resource) | EndpointEntry::NonJaxRsResource(resource) => {
                self.resources.push(resource)
            }
            EndpointEntry::ServletMapping { path } => self.servlet_mappings.push(path),
            EndpointEntry::StaticResource { path } => self.static_files.push(path),
            EndpointEntry::AdditionalEndpoint { path } => self.additional_endpoints.push(path),
        }
        self
    }

    pub fn entries(self, entries: impl IntoIterator<Item = EndpointEntry>) -> Self {
        entries.into_iter().fold(self, CatalogBuilder::entry)
    }

    pub fn resource(mut self, resource: ResourceDescription) -> Self {
        self.resources.push(resource);
        self
    }

    /// Register every URL mapping of one servlet
    pub fn servlet<I, S>(mut self, name: &str, mappings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.servlet_mappings.len();
        self.servlet_mappings
            .extend(mappings.into_iter().map(Into::into));
        log::debug!(
            "Servlet {} contributed {} mappings",
            name,
            self.servlet_mappings.len() - before
        );
        self
    }

    /// Register static files. The HTML preference and the
    /// [`MAX_STATIC_RESOURCES`] cap apply once to every file registered,
    /// when the catalog is built.
    pub fn static_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn additional_endpoint(mut self, path: impl Into<String>) -> Self {
        self.additional_endpoints.push(path.into());
        self
    }

    /// Describe every documented path of an OpenAPI document as a resource
    pub fn openapi(mut self, doc: &OpenApi) -> Self {
        for (path, item) in doc.paths.paths.iter() {
            let operations = [
                ("GET", &item.get),
                ("PUT", &item.put),
                ("POST", &item.post),
                ("DELETE", &item.delete),
                ("OPTIONS", &item.options),
                ("HEAD", &item.head),
                ("PATCH", &item.patch),
                ("TRACE", &item.trace),
            ];

            let mut resource = ResourceDescription::new(path.clone());
            for (verb, operation) in operations {
                if let Some(operation) = operation {
                    resource.add_method(verb, "", produces(operation), consumes(operation));
                }
            }
            if !resource.calls.is_empty() {
                self.resources.push(resource);
            }
        }
        self
    }

    pub fn build(self) -> EndpointCatalog {
        let registered = self.static_files.len();
        let static_resources = select_displayable_files(self.static_files);
        if static_resources.len() < registered {
            log::debug!(
                "Listing {} of {} static files",
                static_resources.len(),
                registered
            );
        }
        log::info!(
            "Endpoint catalog built: {} resources, {} servlet mappings, {} static resources, {} additional endpoints",
            self.resources.len(),
            self.servlet_mappings.len(),
            static_resources.len(),
            self.additional_endpoints.len()
        );
        EndpointCatalog::new(
            self.resources,
            self.servlet_mappings,
            static_resources,
            self.additional_endpoints,
        )
    }
}

fn consumes(operation: &Operation) -> Option<String> {
    operation
        .request_body
        .as_ref()
        .and_then(|body| body.content.keys().next().cloned())
}

fn produces(operation: &Operation) -> Option<String> {
    operation
        .responses
        .responses
        .values()
        .find_map(|response| match response {
            RefOr::T(response) => response.content.keys().next().cloned(),
            RefOr::Ref(_) => None,
        })
}

/// HTML files if there are any, otherwise every file; at most
/// [`MAX_STATIC_RESOURCES`] either way.
pub fn select_displayable_files(files: Vec<String>) -> Vec<String> {
    let html: Vec<String> = files
        .iter()
        .filter(|f| is_html_file_name(f))
        .take(MAX_STATIC_RESOURCES)
        .cloned()
        .collect();
    if !html.is_empty() {
        return html;
    }
    files.into_iter().take(MAX_STATIC_RESOURCES).collect()
}

fn is_html_file_name(file_name: &str) -> bool {
    file_name.ends_with(".html") || file_name.ends_with(".htm")
}

/// Every file below `dir`, as `/`-separated paths relative to it
pub fn collect_static_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read static directory {}", current.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // Symlinked directories are listed as files, never descended into
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(dir) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(parts.join("/"));
            }
        }
    }
    Ok(files)
}
