/// Gives driven adapters access to the clients they need to reach the task API,
/// so business logic stays agnostic of how the API is reached.
pub trait ExternalConnectivity {
    /// HTTP client with tracing middleware attached
    fn http_client(&self) -> &reqwest_middleware::ClientWithMiddleware;

    /// Builds the absolute URL for an API path such as `/tasks/`
    fn api_url(&self, path: &str) -> String;
}
