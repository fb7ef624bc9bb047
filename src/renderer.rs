use crate::catalog::EndpointCatalog;
use crate::path::{RootPath, join_paths};
use crate::types::ErrorPayload;
use anyhow::{Context, Result};
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Output, State};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Embedded default templates, keyed by the name they are registered under.
/// Names end in `.html` so minijinja auto-escapes every value through
/// `html_formatter`.
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/pages/layout.html.jinja2")),
    ("not_found.html", include_str!("../templates/pages/not_found.html.jinja2")),
    ("error.html", include_str!("../templates/pages/error.html.jinja2")),
];

pub const NOT_FOUND_TITLE: &str = "404 - Resource Not Found";
pub const ERROR_TITLE: &str = "Internal Server Error";

#[derive(Debug, Serialize)]
struct MethodView {
    verb: String,
    path: String,
    consumes: Option<String>,
    produces: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResourceView {
    path: String,
    methods: Vec<MethodView>,
}

#[derive(Debug, Serialize)]
struct NotFoundPage<'a> {
    title: &'a str,
    subtitle: &'a str,
    details: &'a str,
    resources: Vec<ResourceView>,
    servlet_mappings: Vec<String>,
    static_resources: Vec<String>,
    additional_endpoints: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorPage<'a> {
    title: &'a str,
    subtitle: &'a str,
    details: &'a str,
    generated_at: String,
    stack: &'a str,
}

/// Renders the 404 and 500 diagnostic documents
pub struct PageRenderer {
    templates: Vec<(&'static str, String)>,
}

impl PageRenderer {
    pub fn new(template_dir: Option<&str>) -> Self {
        log::info!(
            "Page renderer initialized with {} templates",
            if template_dir.is_some() { "custom" } else { "embedded" }
        );

        let templates = EMBEDDED_TEMPLATES
            .iter()
            .map(|(name, embedded)| (*name, load_template_content(template_dir, name, embedded)))
            .collect();
        Self { templates }
    }

    fn environment(&self) -> Result<Environment<'_>> {
        let mut env = Environment::new();
        env.set_formatter(html_formatter);
        for (name, source) in &self.templates {
            env.add_template(*name, source.as_str())
                .with_context(|| format!("Failed to parse template {}", name))?;
        }
        Ok(env)
    }

    /// Resource listing shown for unmatched routes
    pub fn not_found_html(&self, catalog: &EndpointCatalog, root: &RootPath) -> Result<String> {
        let resources = catalog
            .resources()
            .iter()
            .map(|resource| ResourceView {
                path: root.normalize(&resource.base_path),
                methods: resource
                    .calls
                    .iter()
                    .map(|method| MethodView {
                        verb: method.verb.clone(),
                        path: root.normalize(&join_paths(&resource.base_path, &method.path)),
                        consumes: method.consumes.clone(),
                        produces: method.produces.clone(),
                    })
                    .collect(),
            })
            .collect();

        let normalize_all =
            |paths: &[String]| paths.iter().map(|p| root.normalize(p)).collect::<Vec<_>>();

        let page = NotFoundPage {
            title: NOT_FOUND_TITLE,
            subtitle: "",
            details: "Resources overview",
            resources,
            servlet_mappings: normalize_all(catalog.servlet_mappings()),
            static_resources: normalize_all(catalog.static_resources()),
            additional_endpoints: normalize_all(catalog.additional_endpoints()),
        };

        self.render("not_found.html", &page)
    }

    /// Error document; `stack` is empty when internals stay hidden
    pub fn error_html(&self, details: &str, stack: &str) -> Result<String> {
        let page = ErrorPage {
            title: ERROR_TITLE,
            subtitle: details,
            details,
            generated_at: timestamp(),
            stack,
        };
        self.render("error.html", &page)
    }

    fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String> {
        let env = self.environment()?;
        let template = env
            .get_template(name)
            .with_context(|| format!("Template {} is not registered", name))?;
        template
            .render(ctx)
            .with_context(|| format!("Failed to render template {}", name))
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

/// JSON error document with `details` then `stack`
pub fn error_json(details: &str, stack: &str) -> Result<String> {
    let payload = ErrorPayload {
        details: details.to_string(),
        stack: stack.to_string(),
    };
    serde_json::to_string(&payload).context("Failed to serialize error payload")
}

/// Summary line shown when internals are visible
pub fn header_message(error_id: &str, class_name: &str, message: &str) -> String {
    format!(
        "Error handling {}, {}: {}",
        error_id,
        class_name,
        extract_first_line(message)
    )
}

/// Summary line shown when internals stay hidden
pub fn hidden_message(error_id: &str) -> String {
    format!("Error id {}", error_id)
}

/// Auto-escape that rewrites only `&`, `<` and `>`, so listed paths keep
/// their literal slashes.
fn html_formatter(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), minijinja::Error> {
    match value.as_str() {
        Some(text) if matches!(state.auto_escape(), AutoEscape::Html) && !value.is_safe() => {
            out.write_str(&escape_html(text)).map_err(|_| {
                minijinja::Error::new(minijinja::ErrorKind::WriteFailure, "failed to write value")
            })
        }
        _ => minijinja::escape_formatter(out, state, value),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn extract_first_line(message: &str) -> &str {
    message.split('\n').next().unwrap_or("").trim()
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Load template content - priority: external > embedded
fn load_template_content(template_dir: Option<&str>, name: &str, embedded: &str) -> String {
    if let Some(dir) = template_dir {
        let template_path = Path::new(dir).join("pages").join(format!("{}.jinja2", name));
        if template_path.exists() {
            match std::fs::read_to_string(&template_path) {
                Ok(content) => {
                    log::info!("Loaded external template from: {}", template_path.display());
                    return content;
                }
                Err(e) => log::warn!(
                    "Failed to read external template {}: {}",
                    template_path.display(),
                    e
                ),
            }
        } else {
            log::debug!(
                "External template not found at: {}, falling back to embedded",
                template_path.display()
            );
        }
    }
    embedded.to_string()
}
