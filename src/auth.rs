use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Header carrying the encoded authentication
pub const AUTHENTICATION_HEADER: &str = "Authentication";

/// Authentication attached to a request
///
/// When set, the encoded value is stored in the `Authentication` header.
/// If an endpoint expects a different header name, use [`Authentication::encoded`]
/// and pass the value along with the request headers instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authentication {
    /// No authentication
    #[default]
    None,
    /// Basic authentication, encoded as `Basic base64(username:password)`
    Basic {
        username: String,
        password: String,
    },
    /// OAuth2 authentication, encoded as `name secret`
    OAuth2 {
        name: String,
        secret: String,
    },
}

impl Authentication {
    /// Create a basic authentication
    pub fn basic(username: &str, password: &str) -> Self {
        Authentication::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Create an OAuth2 authentication
    pub fn oauth2(name: &str, secret: &str) -> Self {
        Authentication::OAuth2 {
            name: name.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !matches!(self, Authentication::None)
    }

    /// Get the encoded header value
    pub fn encoded(&self) -> Option<String> {
        match self {
            Authentication::None => None,
            Authentication::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password);
                let encoded = BASE64.encode(credentials.as_bytes());
                Some(format!("Basic {}", encoded))
            }
            Authentication::OAuth2 { name, secret } => Some(format!("{} {}", name, secret)),
        }
    }
}
