//! Decoding of `Authorization: Basic <base64(email:password)>` headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

/// Prefix that marks a Basic credential header.
pub const BASIC_PREFIX: &str = "Basic ";

/// Email and password decoded from a request. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Return the token following `"Basic "`, or `None` for any other header.
pub fn extract_base64(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix(BASIC_PREFIX)
}

/// Decode a base64 token into UTF-8 text.
pub fn decode(token: Option<&str>) -> Option<String> {
    let bytes = match STANDARD.decode(token?) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Rejecting Basic credentials: invalid base64 ({})", e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            debug!("Rejecting Basic credentials: payload is not UTF-8");
            None
        }
    }
}

/// Split `email:password` on the first colon; the password may contain colons.
pub fn split_credentials(decoded: Option<&str>) -> Option<Credentials> {
    let (email, password) = decoded?.split_once(':')?;
    Some(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Run the whole header-to-credentials pipeline.
pub fn credentials_from_header(header: Option<&str>) -> Option<Credentials> {
    let token = extract_base64(header)?;
    let decoded = decode(Some(token))?;
    split_credentials(Some(&decoded))
}
