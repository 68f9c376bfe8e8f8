use std::collections::HashMap;

use uuid::Uuid;

/// Wire name of the grant type parameter.
pub const GRANT_TYPE: &str = "grant_type";
pub const CLIENT_ID: &str = "client_id";
pub const CLIENT_SECRET: &str = "client_secret";
pub const CODE: &str = "code";
pub const CODE_VERIFIER: &str = "code_verifier";
pub const REDIRECT_URI: &str = "redirect_uri";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const DEVICE_CODE: &str = "device_code";

/// One inbound token request, as seen by the gate.
///
/// Built once by the transport layer and read-only afterwards. Header names
/// are stored lowercased.
#[derive(Debug, Clone)]
pub struct TokenRequestContext {
    request_id: Uuid,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl TokenRequestContext {
    /// Creates a context from decoded form parameters.
    pub fn new<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        TokenRequestContext {
            request_id: Uuid::new_v4(),
            params: params.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            headers: HashMap::new(),
        }
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Correlation id for logs.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// A request parameter. Empty values count as absent.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// A request header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
