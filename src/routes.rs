/// API route definitions
///
/// Paths are relative to the configured root path; the application scope
/// is mounted under it and the 404 page normalizes them the same way.
///
/// # Example
/// ```
/// use endpoint_pages::routes::Routes;
///
/// let path = Routes::GREETINGS;
/// ```
pub struct Routes;

impl Routes {
    /// Greeting collection
    pub const GREETINGS: &'static str = "/api/greetings";

    /// Single greeting by name
    pub const GREETING: &'static str = "/api/greetings/{name}";

    /// Always fails, shows the error page
    pub const FAIL: &'static str = "/api/fail";

    /// Rejects with 403 and no body
    pub const FORBIDDEN: &'static str = "/api/forbidden";

    /// Health check
    pub const HEALTH: &'static str = "/health";

    /// JSON listing of the endpoint catalog
    pub const DEV_ENDPOINTS: &'static str = "/dev/endpoints";

    /// OpenAPI UI (Scalar) endpoint
    pub const DEV_OPENAPI_UI: &'static str = "/dev/openapi-ui/scalar";

    /// OpenAPI JSON specification endpoint
    pub const DEV_OPENAPI_JSON: &'static str = "/dev/openapi.json";
}
