use crate::catalog::EndpointCatalog;
use crate::handler::Rejection;
use crate::routes::Routes;
use crate::types::*;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result, web};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// OpenAPI documentation of the demo API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Endpoint Pages Demo",
        description = "Demo API showing the 404 resource overview and error pages",
        version = "0.1.0"
    ),
    paths(
        crate::service::list_greetings,
        crate::service::get_greeting,
        crate::service::create_greeting,
        crate::service::fail,
        crate::service::forbidden,
        crate::service::health_check,
        crate::service::list_endpoints,
    ),
    components(
        schemas(
            Greeting,
            HealthResponse,
            ErrorPayload,
            EndpointsResponse,
            ResourceDescription,
            MethodDescription,
        )
    ),
    tags(
        (name = "greetings", description = "Demo resource"),
        (name = "errors", description = "Endpoints that fail on purpose"),
        (name = "dev", description = "Development endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(title = "Endpoints Response", description = "Known endpoints, as listed on the 404 page")]
pub struct EndpointsResponse {
    pub resources: Vec<ResourceDescription>,
    pub servlet_mappings: Vec<String>,
    pub static_resources: Vec<String>,
    pub additional_endpoints: Vec<String>,
}

/// Register the demo routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(Routes::GREETINGS, web::get().to(list_greetings))
        .route(Routes::GREETINGS, web::post().to(create_greeting))
        .route(Routes::GREETING, web::get().to(get_greeting))
        .route(Routes::FAIL, web::get().to(fail))
        .route(Routes::FORBIDDEN, web::get().to(forbidden))
        .route(Routes::HEALTH, web::get().to(health_check))
        .route(Routes::DEV_ENDPOINTS, web::get().to(list_endpoints));
}

fn greeting_for(name: &str) -> Greeting {
    Greeting {
        name: name.to_string(),
        message: format!("Hello, {}!", name),
    }
}

/// List greetings
#[utoipa::path(
    get,
    path = Routes::GREETINGS,
    tag = "greetings",
    responses(
        (status = 200, description = "Known greetings", body = Vec<Greeting>)
    )
)]
pub async fn list_greetings() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(vec![greeting_for("world")]))
}

/// Greet someone by name
#[utoipa::path(
    get,
    path = Routes::GREETING,
    tag = "greetings",
    params(
        ("name" = String, Path, description = "Who to greet")
    ),
    responses(
        (status = 200, description = "Greeting", body = Greeting)
    )
)]
pub async fn get_greeting(path: web::Path<(String,)>) -> Result<HttpResponse> {
    let name = path.into_inner().0;
    Ok(HttpResponse::Ok().json(greeting_for(&name)))
}

/// Create a greeting
#[utoipa::path(
    post,
    path = Routes::GREETINGS,
    tag = "greetings",
    request_body = Greeting,
    responses(
        (status = 201, description = "Greeting created", body = Greeting)
    )
)]
pub async fn create_greeting(greeting: web::Json<Greeting>) -> Result<HttpResponse> {
    log::info!("Creating greeting for {}", greeting.name);
    Ok(HttpResponse::Created().json(greeting.into_inner()))
}

/// Fail with an internal error
#[utoipa::path(
    get,
    path = Routes::FAIL,
    tag = "errors",
    responses(
        (status = 500, description = "Error page", body = ErrorPayload)
    )
)]
pub async fn fail() -> Result<HttpResponse> {
    Err(actix_web::error::ErrorInternalServerError(
        "Demo failure\nraised on purpose",
    ))
}

/// Reject with 403 and no failure details
#[utoipa::path(
    get,
    path = Routes::FORBIDDEN,
    tag = "errors",
    responses(
        (status = 403, description = "Rejected")
    )
)]
pub async fn forbidden() -> Result<HttpResponse> {
    Err(Rejection(StatusCode::FORBIDDEN).into())
}

/// Health check
#[utoipa::path(
    get,
    path = Routes::HEALTH,
    tag = "dev",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Endpoint catalog as JSON
#[utoipa::path(
    get,
    path = Routes::DEV_ENDPOINTS,
    tag = "dev",
    responses(
        (status = 200, description = "Known endpoints", body = EndpointsResponse)
    )
)]
pub async fn list_endpoints(catalog: web::Data<EndpointCatalog>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(EndpointsResponse {
        resources: catalog.resources().to_vec(),
        servlet_mappings: catalog.servlet_mappings().to_vec(),
        static_resources: catalog.static_resources().to_vec(),
        additional_endpoints: catalog.additional_endpoints().to_vec(),
    }))
}
