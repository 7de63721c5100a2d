// Endpoint derivation from the host page origin and base path
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("host url has no host")]
    MissingHost,
    #[error("invalid endpoint url: {0}")]
    Parse(#[from] url::ParseError),
}

fn join_path(base_path: &str, suffix: &str) -> String {
    let base = base_path.trim_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("/{}/{}", base, suffix)
    }
}

fn authority(page: &Url) -> Result<String, EndpointError> {
    let host = page.host_str().ok_or(EndpointError::MissingHost)?;
    Ok(match page.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Stream endpoint whose security level mirrors the page: `https` pages get `wss`.
pub fn ws_endpoint(page: &Url, base_path: &str, suffix: &str) -> Result<Url, EndpointError> {
    let scheme = match page.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };
    let url = format!("{}://{}{}", scheme, authority(page)?, join_path(base_path, suffix));
    Ok(Url::parse(&url)?)
}

/// `<scheme>://<host>/<basePath>telemetry/ws`
pub fn telemetry_endpoint(page: &Url, base_path: &str) -> Result<Url, EndpointError> {
    ws_endpoint(page, base_path, "telemetry/ws")
}

/// Plain HTTP endpoint below the base path on the page's own origin.
pub fn http_endpoint(page: &Url, base_path: &str, suffix: &str) -> Result<Url, EndpointError> {
    let scheme = match page.scheme() {
        "https" | "wss" => "https",
        "http" | "ws" => "http",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };
    let url = format!("{}://{}{}", scheme, authority(page)?, join_path(base_path, suffix));
    Ok(Url::parse(&url)?)
}
