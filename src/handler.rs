use crate::catalog::EndpointCatalog;
use crate::error_id::ErrorIdGenerator;
use crate::path::RootPath;
use crate::renderer::{self, PageRenderer};
use crate::types::Config;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpResponse, ResponseError};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level failure, usually a client that went away
    Io,
    Application,
}

/// An error that escaped request processing
#[derive(Debug, Clone)]
pub struct Failure {
    pub class_name: String,
    pub message: String,
    pub stack: String,
    pub kind: FailureKind,
}

impl Failure {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>, kind: FailureKind) -> Self {
        let class_name = class_name.into();
        let message = message.into();
        let stack = format!("{}: {}", class_name, message);
        Self {
            class_name,
            message,
            stack,
            kind,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    /// Describe an error by its type name, message and source chain.
    ///
    /// For callers that build a [`FailureContext`] themselves and still hold
    /// the concrete error. An `std::io::Error` anywhere in the source chain
    /// makes it a [`FailureKind::Io`] failure.
    pub fn from_error<E: StdError + 'static>(err: &E) -> Self {
        let class_name = std::any::type_name::<E>();
        let stack = source_chain_stack(class_name, err);
        Self {
            class_name: class_name.to_string(),
            message: err.to_string(),
            stack,
            kind: kind_of(err),
        }
    }

    /// Like [`Failure::from_error`], appending anyhow's captured backtrace
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let root: &(dyn StdError + 'static) = err.as_ref();
        let mut stack = source_chain_stack("anyhow::Error", root);
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            stack.push_str(&format!("\n{}", backtrace));
        }
        Self {
            class_name: "anyhow::Error".to_string(),
            message: err.to_string(),
            stack,
            kind: kind_of(root),
        }
    }

    /// actix errors are type-erased; the class name is taken from the
    /// leading identifier of their `Debug` output.
    ///
    /// `ResponseError` exposes no source chain, so only an
    /// `std::io::Error` converted directly into the actix error counts as
    /// [`FailureKind::Io`]. An io error wrapped in another error is an
    /// application failure here, unlike [`Failure::from_error`].
    pub fn from_actix(err: &actix_web::Error) -> Self {
        let debug = format!("{:?}", err);
        let (class_name, kind) = if err.as_error::<std::io::Error>().is_some() {
            ("std::io::Error".to_string(), FailureKind::Io)
        } else {
            (debug_class_name(&debug), FailureKind::Application)
        };
        let message = err.to_string();
        let stack = format!("{}: {}\n{:#?}", class_name, message, err);
        Self {
            class_name,
            message,
            stack,
            kind,
        }
    }
}

fn kind_of(err: &(dyn StdError + 'static)) -> FailureKind {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<std::io::Error>() {
            return FailureKind::Io;
        }
        current = e.source();
    }
    FailureKind::Application
}

fn source_chain_stack(class_name: &str, err: &(dyn StdError + 'static)) -> String {
    let mut stack = format!("{}: {}", class_name, err);
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push_str(&format!("\nCaused by: {}", cause));
        source = cause.source();
    }
    stack
}

fn debug_class_name(debug: &str) -> String {
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if name.is_empty() {
        "actix_web::Error".to_string()
    } else {
        name
    }
}

/// What the owning HTTP layer knows about a failed exchange
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub uri: String,
    pub status: StatusCode,
    pub accept: Option<String>,
    pub failure: Option<Failure>,
}

impl FailureContext {
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::status(uri, StatusCode::NOT_FOUND)
    }

    pub fn status(uri: impl Into<String>, status: StatusCode) -> Self {
        Self {
            uri: uri.into(),
            status,
            accept: None,
            failure: None,
        }
    }

    pub fn failed(uri: impl Into<String>, failure: Failure) -> Self {
        Self {
            uri: uri.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            accept: None,
            failure: Some(failure),
        }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    fn wants_json(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.contains("application/json"))
    }
}

/// Finalized response produced by the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResponse {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl DiagnosticResponse {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    fn render_failed(err: anyhow::Error) -> Self {
        log::error!("Failed to render diagnostic page: {:#}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: Some(TEXT_CONTENT_TYPE),
            body: "Internal Server Error".to_string(),
        }
    }

    pub fn into_http_response(self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        if let Some(content_type) = self.content_type {
            builder.insert_header((header::CONTENT_TYPE, content_type));
        }
        builder.body(self.body)
    }
}

/// Status-only failure: rejects a request without an error to report.
///
/// Goes through the same branches as a response with no failure, so a
/// `Rejection(404)` shows the resource overview and anything else an
/// empty body.
#[derive(Debug, Clone, Copy)]
pub struct Rejection(pub StatusCode);

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request rejected with status {}", self.0)
    }
}

impl ResponseError for Rejection {
    fn status_code(&self) -> StatusCode {
        self.0
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::new(self.0)
    }
}

/// Fallback for unmatched routes and escaped errors
pub struct ErrorHandler {
    catalog: Arc<EndpointCatalog>,
    root_path: RootPath,
    show_internals: bool,
    renderer: PageRenderer,
    error_ids: ErrorIdGenerator,
}

impl ErrorHandler {
    pub fn new(
        catalog: Arc<EndpointCatalog>,
        root_path: RootPath,
        show_internals: bool,
        renderer: PageRenderer,
    ) -> Self {
        Self {
            catalog,
            root_path,
            show_internals,
            renderer,
            error_ids: ErrorIdGenerator::new(),
        }
    }

    /// The default handler, or `None` when the configuration names a user
    /// handler that replaces it.
    pub fn from_config(config: &Config, catalog: Arc<EndpointCatalog>) -> Option<Self> {
        if let Some(custom) = &config.failure.handler {
            log::info!("Failure handler '{}' configured, default handler not installed", custom);
            return None;
        }
        Some(Self::new(
            catalog,
            config.root_path.clone(),
            config.launch_mode.is_dev_or_test(),
            PageRenderer::new(config.template_dir.as_deref()),
        ))
    }

    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    pub fn show_internals(&self) -> bool {
        self.show_internals
    }

    pub fn handle(&self, ctx: &FailureContext) -> DiagnosticResponse {
        match &ctx.failure {
            None if ctx.status == StatusCode::NOT_FOUND => self.handle_not_found(ctx),
            None => DiagnosticResponse::empty(ctx.status),
            Some(failure) => self.handle_failure(ctx, failure),
        }
    }

    fn handle_not_found(&self, ctx: &FailureContext) -> DiagnosticResponse {
        if ctx.wants_json() {
            // No JSON listing exists; only the content type is set
            return DiagnosticResponse {
                status: StatusCode::NOT_FOUND,
                content_type: Some(JSON_CONTENT_TYPE),
                body: String::new(),
            };
        }

        match self.renderer.not_found_html(&self.catalog, &self.root_path) {
            Ok(body) => DiagnosticResponse {
                status: StatusCode::NOT_FOUND,
                content_type: Some(HTML_CONTENT_TYPE),
                body,
            },
            Err(e) => DiagnosticResponse::render_failed(e),
        }
    }

    fn handle_failure(&self, ctx: &FailureContext, failure: &Failure) -> DiagnosticResponse {
        let error_id = self.error_ids.next_id();

        match failure.kind {
            FailureKind::Io => log::debug!(
                "IOError processing HTTP request to {} failed, the client likely terminated the connection. Error id: {}\n{}",
                ctx.uri,
                error_id,
                failure.stack
            ),
            FailureKind::Application => log::error!(
                "HTTP Request to {} failed, error id: {}\n{}",
                ctx.uri,
                error_id,
                failure.stack
            ),
        }

        let (details, stack) = if self.show_internals {
            (
                renderer::header_message(&error_id, &failure.class_name, &failure.message),
                failure.stack.trim(),
            )
        } else {
            (renderer::hidden_message(&error_id), "")
        };

        let rendered = if ctx.wants_json() {
            renderer::error_json(&details, stack).map(|body| (JSON_CONTENT_TYPE, body))
        } else {
            self.renderer
                .error_html(&details, stack)
                .map(|body| (HTML_CONTENT_TYPE, body))
        };

        match rendered {
            Ok((content_type, body)) => DiagnosticResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                content_type: Some(content_type),
                body,
            },
            Err(e) => DiagnosticResponse::render_failed(e),
        }
    }

    /// Rewrite an error-status actix response through [`ErrorHandler::handle`].
    ///
    /// Responses without an attached error are the handler's own output and
    /// pass untouched, except an unmatched route's bare 404.
    pub fn handle_service_response<B>(
        &self,
        res: ServiceResponse<B>,
    ) -> actix_web::Result<ErrorHandlerResponse<B>> {
        let status = res.status();
        let failure = match res.response().error() {
            None if status == StatusCode::NOT_FOUND => None,
            None => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
            Some(err) if err.as_error::<Rejection>().is_some() => None,
            Some(err) => Some(Failure::from_actix(err)),
        };

        let ctx = FailureContext {
            uri: res.request().uri().to_string(),
            status,
            accept: res
                .request()
                .headers()
                .get(header::ACCEPT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            failure,
        };

        let response = self.handle(&ctx).into_http_response();
        let (req, _) = res.into_parts();
        Ok(ErrorHandlerResponse::Response(
            ServiceResponse::new(req, response).map_into_right_body(),
        ))
    }

    /// Install `handler` as the fallback for every 4xx/5xx response.
    ///
    /// With `None` (a user handler is configured) responses pass through.
    pub fn middleware<B: MessageBody + 'static>(
        handler: Option<Arc<ErrorHandler>>,
    ) -> ErrorHandlers<B> {
        ErrorHandlers::new().default_handler(move |res| match &handler {
            Some(handler) => handler.handle_service_response(res),
            None => Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceDescription;
    use std::collections::HashSet;
    use std::io;

    #[derive(Debug)]
    struct WrappedIo(io::Error);

    impl fmt::Display for WrappedIo {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "write failed")
        }
    }

    impl StdError for WrappedIo {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    fn handler(show_internals: bool) -> ErrorHandler {
        let catalog = EndpointCatalog::builder()
            .resource(ResourceDescription::new("/hello").with_method("GET", "", None, None))
            .build();
        ErrorHandler::new(
            Arc::new(catalog),
            RootPath::default(),
            show_internals,
            PageRenderer::default(),
        )
    }

    fn boom() -> Failure {
        Failure::new("app::BoomError", "it broke\nsecond line", FailureKind::Application)
            .with_stack("app::BoomError: it broke\n    at app::handler")
    }

    #[test]
    fn not_found_renders_html_overview() {
        let res = handler(true).handle(&FailureContext::not_found("/missing"));
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.content_type, Some(HTML_CONTENT_TYPE));
        assert!(res.body.contains(renderer::NOT_FOUND_TITLE));
        assert!(res.body.contains("REST resources"));
    }

    #[test]
    fn json_not_found_has_content_type_and_no_body() {
        let ctx = FailureContext::not_found("/missing").with_accept("application/json");
        let res = handler(true).handle(&ctx);
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.content_type, Some(JSON_CONTENT_TYPE));
        assert!(res.body.is_empty());
    }

    #[test]
    fn other_status_without_failure_passes_through() {
        let res = handler(true).handle(&FailureContext::status("/x", StatusCode::FORBIDDEN));
        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert_eq!(res.content_type, None);
        assert!(res.body.is_empty());
    }

    #[test]
    fn failure_forces_internal_server_error() {
        let mut ctx = FailureContext::failed("/x", boom());
        ctx.status = StatusCode::BAD_REQUEST;
        let res = handler(false).handle(&ctx);
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn hidden_internals_show_error_id_only() {
        let h = handler(false);
        let ctx = FailureContext::failed("/x", boom()).with_accept("application/json");
        let res = h.handle(&ctx);
        let expected_id = format!("{}-1", h.error_ids.base());
        assert_eq!(res.content_type, Some(JSON_CONTENT_TYPE));
        assert_eq!(
            res.body,
            format!(r#"{{"details":"Error id {}","stack":""}}"#, expected_id)
        );

        let res = h.handle(&FailureContext::failed("/x", boom()));
        assert_eq!(res.content_type, Some(HTML_CONTENT_TYPE));
        assert!(res.body.contains(&format!("Error id {}-2", h.error_ids.base())));
        assert!(!res.body.contains("BoomError"));
        assert!(!res.body.contains("it broke"));
        assert!(!res.body.contains("class=\"stack\""));
    }

    #[test]
    fn shown_internals_include_class_message_and_stack() {
        let res = handler(true).handle(&FailureContext::failed("/x", boom()));
        assert!(res.body.contains("app::BoomError: it broke"));
        assert!(!res.body.contains("second line"));
        assert!(res.body.contains("class=\"stack\""));
        assert!(res.body.contains("at app::handler"));
    }

    #[test]
    fn shown_internals_json_carries_stack() {
        let ctx = FailureContext::failed("/x", boom()).with_accept("text/html, application/json");
        let res = handler(true).handle(&ctx);
        let payload: crate::types::ErrorPayload = serde_json::from_str(&res.body).unwrap();
        assert!(payload.details.starts_with("Error handling "));
        assert!(payload.details.ends_with("app::BoomError: it broke"));
        assert_eq!(payload.stack, "app::BoomError: it broke\n    at app::handler");
    }

    #[test]
    fn failure_from_error_detects_io_in_source_chain() {
        let failure = Failure::from_error(&WrappedIo(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));
        assert_eq!(failure.kind, FailureKind::Io);
        assert!(failure.class_name.ends_with("WrappedIo"));
        assert_eq!(failure.message, "write failed");
        assert!(failure.stack.contains("Caused by: pipe closed"));

        let failure = Failure::from_error(&fmt::Error);
        assert_eq!(failure.kind, FailureKind::Application);
        assert_eq!(failure.class_name, "core::fmt::Error");
    }

    #[test]
    fn failure_from_anyhow_keeps_context_chain() {
        let err = anyhow::Error::new(io::Error::other("disk gone")).context("saving report");
        let failure = Failure::from_anyhow(&err);
        assert_eq!(failure.message, "saving report");
        assert_eq!(failure.kind, FailureKind::Io);
        assert!(failure.stack.contains("Caused by: disk gone"));
    }

    #[test]
    fn actix_failures_detect_io_at_top_level_only() {
        let direct = actix_web::Error::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        let failure = Failure::from_actix(&direct);
        assert_eq!(failure.kind, FailureKind::Io);
        assert_eq!(failure.class_name, "std::io::Error");
        assert_eq!(failure.message, "reset");

        let wrapped = actix_web::error::ErrorInternalServerError(WrappedIo(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));
        let failure = Failure::from_actix(&wrapped);
        assert_eq!(failure.kind, FailureKind::Application);
        assert_eq!(failure.message, "write failed");
    }

    #[test]
    fn io_failures_render_like_others() {
        let io_failure = Failure::new("std::io::Error", "reset", FailureKind::Io);
        let res = handler(true).handle(&FailureContext::failed("/x", io_failure));
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.contains("std::io::Error: reset"));
    }

    #[test]
    fn concurrent_failures_get_distinct_ids() {
        let h = handler(false);
        let bodies: Vec<String> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        (0..150)
                            .map(|_| {
                                let ctx = FailureContext::failed("/x", boom())
                                    .with_accept("application/json");
                                h.handle(&ctx).body
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });

        let unique: HashSet<&String> = bodies.iter().collect();
        assert_eq!(bodies.len(), 1200);
        assert_eq!(unique.len(), bodies.len());
    }

    #[test]
    fn broken_template_falls_back_to_plain_text() {
        let dir = std::env::temp_dir().join(format!("endpoint-pages-broken-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("pages")).unwrap();
        std::fs::write(dir.join("pages").join("not_found.html.jinja2"), "{% if %}").unwrap();

        let h = ErrorHandler::new(
            Arc::new(EndpointCatalog::default()),
            RootPath::default(),
            true,
            PageRenderer::new(dir.to_str()),
        );
        let res = h.handle(&FailureContext::not_found("/missing"));
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.content_type, Some(TEXT_CONTENT_TYPE));
        assert_eq!(res.body, "Internal Server Error");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn debug_class_name_takes_leading_identifier() {
        assert_eq!(debug_class_name("NotFound(\"x\")"), "NotFound");
        assert_eq!(debug_class_name("\"plain\""), "actix_web::Error");
    }
}
