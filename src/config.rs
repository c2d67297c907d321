use serde::{Deserialize, Serialize};
use std::{env, fmt, path::PathBuf, str::FromStr};

/// Default name of the cookie carrying the session ID.
pub const DEFAULT_SESSION_NAME: &str = "_my_session_id";

/// Default file backing the persisted session variant.
pub const DEFAULT_SESSION_STORE_PATH: &str = ".db_UserSession.json";

/// Routes reachable without authentication.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/api/v1/status/",
    "/api/v1/unauthorized/",
    "/api/v1/forbidden/",
    "/api/v1/auth_session/login/",
    "/api/v1/users/",
];

/// Which authentication strategy guards the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    BasicAuth,
    #[default]
    SessionAuth,
    SessionExpAuth,
    SessionDbAuth,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicAuth => "basic_auth",
            Self::SessionAuth => "session_auth",
            Self::SessionExpAuth => "session_exp_auth",
            Self::SessionDbAuth => "session_db_auth",
        }
    }

    /// Parse a strategy name, falling back to the default for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for AuthType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "basic_auth" => Ok(Self::BasicAuth),
            "session_auth" => Ok(Self::SessionAuth),
            "session_exp_auth" => Ok(Self::SessionExpAuth),
            "session_db_auth" => Ok(Self::SessionDbAuth),
            other => Err(anyhow::anyhow!("Unknown auth type `{}`", other)),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Strategy used to authenticate requests
    pub auth_type: AuthType,
    /// Name of the session cookie
    pub session_name: String,
    /// Session lifetime in seconds; zero or negative means sessions never expire
    pub session_duration: i64,
    /// JSON file backing the persisted session store
    pub session_store_path: PathBuf,
    /// Path prefixes exempt from authentication
    pub excluded_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: AuthType::default(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            session_duration: 0,
            session_store_path: PathBuf::from(DEFAULT_SESSION_STORE_PATH),
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl AuthConfig {
    /// Build a config from `AUTH_TYPE`, `SESSION_NAME`, `SESSION_DURATION`
    /// and `SESSION_STORE_PATH`, using defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source using the environment's keys.
    ///
    /// An unknown `AUTH_TYPE` falls back to the default strategy, a blank
    /// `SESSION_NAME` is ignored, and a non-numeric `SESSION_DURATION` is 0.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            auth_type: lookup("AUTH_TYPE")
                .map(|v| AuthType::parse_lenient(&v))
                .unwrap_or(defaults.auth_type),
            session_name: lookup("SESSION_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.session_name),
            session_duration: parse_session_duration(lookup("SESSION_DURATION").as_deref()),
            session_store_path: lookup("SESSION_STORE_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.session_store_path),
            excluded_paths: defaults.excluded_paths,
        }
    }

    /// Create a config for Basic authentication.
    pub fn basic() -> Self {
        Self {
            auth_type: AuthType::BasicAuth,
            ..Default::default()
        }
    }

    /// Create a config for in-memory sessions with an optional lifetime.
    pub fn with_sessions(session_duration: i64) -> Self {
        let auth_type = if session_duration > 0 {
            AuthType::SessionExpAuth
        } else {
            AuthType::SessionAuth
        };
        Self {
            auth_type,
            session_duration,
            ..Default::default()
        }
    }

    /// Create a config for sessions mirrored to a JSON file.
    pub fn with_persisted_sessions(path: impl Into<PathBuf>, session_duration: i64) -> Self {
        Self {
            auth_type: AuthType::SessionDbAuth,
            session_duration,
            session_store_path: path.into(),
            ..Default::default()
        }
    }
}

/// Interpret a `SESSION_DURATION` value. Absent or non-numeric means 0.
pub fn parse_session_duration(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AuthConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert_eq!(config.auth_type, AuthType::SessionAuth);
        assert_eq!(config.session_name, "_my_session_id");
        assert_eq!(config.session_duration, 0);
        assert!(config.excluded_paths.contains(&"/api/v1/status/".to_string()));
    }

    #[test]
    fn test_parse_session_duration() {
        assert_eq!(parse_session_duration(None), 0);
        assert_eq!(parse_session_duration(Some("60")), 60);
        assert_eq!(parse_session_duration(Some(" 15 ")), 15);
        assert_eq!(parse_session_duration(Some("-5")), -5);
        assert_eq!(parse_session_duration(Some("soon")), 0);
        assert_eq!(parse_session_duration(Some("")), 0);
    }

    #[test]
    fn test_auth_type_parsing() {
        assert_eq!("basic_auth".parse::<AuthType>().unwrap(), AuthType::BasicAuth);
        assert_eq!(
            "session_db_auth".parse::<AuthType>().unwrap(),
            AuthType::SessionDbAuth
        );
        assert!("kerberos".parse::<AuthType>().is_err());
        assert_eq!(AuthType::parse_lenient("kerberos"), AuthType::SessionAuth);
        assert_eq!(AuthType::SessionExpAuth.to_string(), "session_exp_auth");
    }

    #[test]
    fn test_auth_config_with_sessions() {
        assert_eq!(AuthConfig::with_sessions(0).auth_type, AuthType::SessionAuth);
        let config = AuthConfig::with_sessions(30);
        assert_eq!(config.auth_type, AuthType::SessionExpAuth);
        assert_eq!(config.session_duration, 30);
    }

    #[test]
    fn test_auth_config_with_persisted_sessions() {
        let config = AuthConfig::with_persisted_sessions("/tmp/sessions.json", 10);
        assert_eq!(config.auth_type, AuthType::SessionDbAuth);
        assert_eq!(config.session_store_path, PathBuf::from("/tmp/sessions.json"));
    }

    #[test]
    fn test_from_lookup_reads_every_key() {
        let config = config_from(&[
            ("AUTH_TYPE", "session_db_auth"),
            ("SESSION_NAME", "sid"),
            ("SESSION_DURATION", "120"),
            ("SESSION_STORE_PATH", "/var/lib/auth/sessions.json"),
        ]);
        assert_eq!(config.auth_type, AuthType::SessionDbAuth);
        assert_eq!(config.session_name, "sid");
        assert_eq!(config.session_duration, 120);
        assert_eq!(
            config.session_store_path,
            PathBuf::from("/var/lib/auth/sessions.json")
        );
    }

    #[test]
    fn test_from_lookup_falls_back_on_bad_values() {
        let config = config_from(&[
            ("AUTH_TYPE", "kerberos"),
            ("SESSION_NAME", "   "),
            ("SESSION_DURATION", "an hour"),
        ]);
        assert_eq!(config.auth_type, AuthType::SessionAuth);
        assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(config.session_duration, 0);
        assert_eq!(
            config.session_store_path,
            PathBuf::from(DEFAULT_SESSION_STORE_PATH)
        );
    }

    #[test]
    fn test_from_lookup_with_nothing_set_is_default() {
        let config = config_from(&[]);
        let defaults = AuthConfig::default();
        assert_eq!(config.auth_type, defaults.auth_type);
        assert_eq!(config.session_name, defaults.session_name);
        assert_eq!(config.session_duration, defaults.session_duration);
        assert_eq!(config.excluded_paths, defaults.excluded_paths);
    }
}
