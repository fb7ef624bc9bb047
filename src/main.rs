use actix_web::{App, HttpResponse, HttpServer, web};
use endpoint_pages::catalog::{EndpointCatalog, collect_static_files};
use endpoint_pages::config::ConfigManager;
use endpoint_pages::handler::ErrorHandler;
use endpoint_pages::routes::Routes;
use endpoint_pages::service::{self, ApiDoc};
use endpoint_pages::types::Config;
use std::env;
use std::path::Path;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init();

    // Print example if requested
    if env::args().any(|arg| arg == "--example-config") {
        if let Err(e) = ConfigManager::save_example_config() {
            log::error!("Failed to write example config: {}", e);
        }
        return Ok(());
    }

    // Print help if requested
    if env::args().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    // Load configuration
    let mut config = ConfigManager::load().map_err(std::io::Error::other)?;

    // Apply environment variable overrides
    config.apply_env_overrides();

    log::info!("Starting endpoint pages demo");
    log::info!("Server will listen on port {}", config.server_port);
    log::info!(
        "Root path: {}, launch mode: {:?}",
        config.root_path,
        config.launch_mode
    );

    let catalog = Arc::new(build_catalog(&config));
    let handler = ErrorHandler::from_config(&config, catalog.clone()).map(Arc::new);
    if handler.is_none() {
        log::warn!("Default failure handler disabled, unmatched routes get bare responses");
    }

    let catalog_data = web::Data::from(catalog);
    let prefix = config.root_path.mount_prefix().to_string();
    let port = config.server_port;

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(catalog_data.clone())
            .wrap(ErrorHandler::middleware(handler.clone()))
            .service(
                web::scope(&prefix)
                    // OpenAPI documentation endpoint (Scalar UI)
                    .service(Scalar::with_url(Routes::DEV_OPENAPI_UI, ApiDoc::openapi()))
                    // OpenAPI JSON endpoint
                    .route(Routes::DEV_OPENAPI_JSON, web::get().to(openapi_json))
                    .configure(service::configure),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

fn build_catalog(config: &Config) -> EndpointCatalog {
    let mut builder = EndpointCatalog::builder()
        .openapi(&ApiDoc::openapi())
        .additional_endpoint(Routes::DEV_OPENAPI_UI)
        .additional_endpoint(Routes::DEV_OPENAPI_JSON);

    for endpoint in &config.additional_endpoints {
        builder = builder.additional_endpoint(endpoint.clone());
    }

    if let Some(dir) = &config.static_dir {
        match collect_static_files(Path::new(dir)) {
            Ok(files) => builder = builder.static_files(files),
            Err(e) => log::warn!("Static resources not listed: {:#}", e),
        }
    }

    builder.build()
}

/// OpenAPI JSON endpoint
async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

fn print_help() {
    println!("Endpoint pages demo server");
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS]", env::args().next().unwrap_or_default());
    println!();
    println!("OPTIONS:");
    println!("    --example-config    Generate example configuration file");
    println!("    -h, --help          Show this help message");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    PORT                Server port (default: 8080)");
    println!("    ROOT_PATH           Prefix the application is mounted under (default: /)");
    println!("    LAUNCH_MODE         dev, test or prod (default: prod)");
    println!("    FAILURE_HANDLER     Name of a custom failure handler, disables the default one");
    println!("    RUST_LOG            Log filter, e.g. info or endpoint_pages=debug");
    println!();
    println!("CONFIGURATION:");
    println!("    Create config.toml, config.json or config.yaml in the current directory");
    println!("    Run --example-config to generate a template");
}
