//! The authenticator contract shared by every strategy.

use cookie::Cookie;
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

use crate::auth::user_store::User;

/// Answers "does this request need auth, and who is calling".
///
/// `request` is `None` when there is no request to inspect; every method
/// treats that as a failed lookup rather than an error.
pub trait Authenticator: Send + Sync {
    /// Whether `path` needs authentication given the exempt prefixes.
    fn require_auth(&self, path: Option<&str>, excluded_paths: &[String]) -> bool {
        require_auth(path, excluded_paths)
    }

    /// Raw value of the `Authorization` header.
    fn authorization_header<'r>(&self, request: Option<&'r HeaderMap>) -> Option<&'r str> {
        request?.get(AUTHORIZATION)?.to_str().ok()
    }

    /// Resolve the calling user. `None` on any failure.
    fn current_user(&self, request: Option<&HeaderMap>) -> Option<User>;
}

/// Path gate shared by all strategies.
///
/// No auth is required when the path is empty, when nothing is excluded, or
/// when some excluded entry contains the path. A path with or without a
/// trailing slash matches the same entries.
pub fn require_auth<S: AsRef<str>>(path: Option<&str>, excluded_paths: &[S]) -> bool {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return false;
    };
    if excluded_paths.is_empty() {
        return false;
    }

    let excludes = |candidate: &str| {
        excluded_paths
            .iter()
            .any(|excluded| excluded.as_ref().contains(candidate))
    };
    let trimmed = path.trim_end_matches('/');
    !(excludes(path) || (!trimmed.is_empty() && excludes(trimmed)))
}

/// Read a named cookie from the `Cookie` header(s).
///
/// Surrounding double quotes are stripped; an empty value counts as absent.
pub fn cookie_value(request: Option<&HeaderMap>, name: &str) -> Option<String> {
    request?
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| Cookie::split_parse(header))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}
