use std::{error::Error, fmt, future::Future};

use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

use crate::{config::StorageConfig, mediawiki_api::QueryUrl};

/// Anything able to perform the single GET a page retrieval needs.
///
/// Implementations resolve the scheme-relative [`QueryUrl`], send the request and
/// hand back the response body already parsed as JSON. The returned future must
/// complete exactly once.
pub trait Transport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a QueryUrl,
    ) -> impl Future<Output = Result<Value, RustError>> + Send + 'a;
}

/// Custom struct as a wrapper for the http client and the scheme to resolve urls with.
#[derive(Debug, Clone)]
pub struct RustClient {
    client: ClientWithMiddleware,
    scheme: String,
}

/// Custom error to include all potential transport related errors.
#[derive(Debug)]
pub enum RustError {
    MiddleWare(reqwest_middleware::Error),
    Underly(reqwest::Error),
    /// The query url could not be turned into an absolute url.
    Url(url::ParseError),
    /// Failure reported by a custom transport.
    Other(Box<dyn Error + Send + Sync + 'static>),
}

impl RustError {
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self::Other(error.into())
    }
}

impl RustClient {
    /// Create a new client from the given configuration.
    ///
    /// # Arguments
    /// - config -> user agent, timeout and the scheme to resolve `//host/...` urls with.
    ///
    /// # Returns
    /// - Ok(RustClient) -> a client ready to be handed to [`crate::MediawikiStorage`].
    /// - Err(RustError) -> reqwest failed to build its client (tls backend, etc).
    pub fn new(config: &StorageConfig) -> Result<Self, RustError> {
        let mut builder = reqwest::ClientBuilder::new().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = reqwest_middleware::ClientBuilder::new(builder.build()?).build();
        Ok(Self::with_client(client, &config.scheme))
    }

    /// Wrap an existing middleware client, e.g. one with custom middleware attached.
    pub fn with_client<S: Into<String>>(client: ClientWithMiddleware, scheme: S) -> Self {
        Self {
            client,
            scheme: scheme.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl RustClient {
    async fn get_json(&self, url: &QueryUrl) -> Result<Value, RustError> {
        let url = url.resolve(&self.scheme)?;
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

impl Transport for RustClient {
    fn fetch<'a>(
        &'a self,
        url: &'a QueryUrl,
    ) -> impl Future<Output = Result<Value, RustError>> + Send + 'a {
        self.get_json(url)
    }
}

impl fmt::Display for RustError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RustError::MiddleWare(e) => write!(f, "{}", e),
            RustError::Underly(e) => write!(f, "{}", e),
            RustError::Url(e) => write!(f, "invalid query url: {}", e),
            RustError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl Error for RustError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RustError::MiddleWare(e) => Some(e),
            RustError::Underly(e) => Some(e),
            RustError::Url(e) => Some(e),
            RustError::Other(e) => Some(e.as_ref()),
        }
    }
}

impl From<reqwest::Error> for RustError {
    fn from(value: reqwest::Error) -> Self {
        Self::Underly(value)
    }
}
impl From<reqwest_middleware::Error> for RustError {
    fn from(value: reqwest_middleware::Error) -> Self {
        Self::MiddleWare(value)
    }
}
impl From<url::ParseError> for RustError {
    fn from(value: url::ParseError) -> Self {
        Self::Url(value)
    }
}
