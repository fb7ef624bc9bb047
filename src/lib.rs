//! Fallback pages for actix-web applications.
//!
//! Unmatched routes get a 404 page listing every endpoint the application
//! knows about (REST resources, servlet mappings, static files, additional
//! endpoints). Errors that escape a handler get a 500 page carrying an error
//! id, with the error detail and stack shown only in dev and test mode.
//!
//! ```no_run
//! use std::sync::Arc;
//! use actix_web::{App, HttpServer};
//! use endpoint_pages::{EndpointCatalog, ErrorHandler, PageRenderer, RootPath};
//!
//! # #[actix_web::main] async fn main() -> std::io::Result<()> {
//! let catalog = Arc::new(EndpointCatalog::builder().additional_endpoint("/q/health").build());
//! let handler = Arc::new(ErrorHandler::new(catalog, RootPath::default(), true, PageRenderer::default()));
//! HttpServer::new(move || App::new().wrap(ErrorHandler::middleware(Some(handler.clone()))))
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! # }
//! ```
pub mod catalog;
pub mod config;
pub mod error_id;
pub mod handler;
pub mod path;
pub mod renderer;
pub mod routes;
pub mod service;
pub mod types;

pub use catalog::{CatalogBuilder, EndpointCatalog};
pub use handler::{DiagnosticResponse, ErrorHandler, Failure, FailureContext, FailureKind, Rejection};
pub use path::RootPath;
pub use renderer::PageRenderer;
pub use types::{Config, EndpointEntry, EndpointKind, MethodDescription, ResourceDescription};
