use thiserror::Error;
use url::Url;

/// Session credential attached to every backend request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Raw `Cookie` header value, e.g. `token=abc`.
    Cookie(String),
    Bearer(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Cookie(_) => f.write_str("Cookie(<redacted>)"),
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    base_url: Url,
    credential: Option<Credential>,
}

#[derive(Clone, Debug, Default)]
pub struct BackendSettingsDraft {
    pub base_url: Option<String>,
    pub session_cookie: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendSettingsError {
    #[error("backend base URL is not configured")]
    MissingBaseUrl,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("base URL must use http or https")]
    UnsupportedScheme,
}

impl BackendSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// A cookie wins over a bearer token when both are present.
    ///
    /// # Errors
    ///
    /// Returns `BackendSettingsError` if the base URL is missing, unparsable,
    /// or not http(s).
    pub fn validate(self) -> Result<BackendSettings, BackendSettingsError> {
        let raw = normalize_optional(self.base_url).ok_or(BackendSettingsError::MissingBaseUrl)?;
        let base_url =
            Url::parse(&raw).map_err(|err| BackendSettingsError::InvalidBaseUrl(err.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BackendSettingsError::UnsupportedScheme);
        }

        let credential = normalize_optional(self.session_cookie)
            .map(Credential::Cookie)
            .or_else(|| normalize_optional(self.api_token).map(Credential::Bearer));

        Ok(BackendSettings {
            base_url,
            credential,
        })
    }
}

impl BackendSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Join a root-relative API path (which may carry a query string) onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(base: &str) -> BackendSettingsDraft {
        BackendSettingsDraft {
            base_url: Some(base.into()),
            ..BackendSettingsDraft::default()
        }
    }

    #[test]
    fn missing_base_url_is_rejected() {
        let err = BackendSettingsDraft::new().validate().unwrap_err();
        assert_eq!(err, BackendSettingsError::MissingBaseUrl);
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = draft("ftp://example.com").validate().unwrap_err();
        assert_eq!(err, BackendSettingsError::UnsupportedScheme);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let settings = draft("http://localhost:5000/").validate().unwrap();
        assert_eq!(
            settings.endpoint("/api/courses?studentId=s1"),
            "http://localhost:5000/api/courses?studentId=s1"
        );
    }

    #[test]
    fn cookie_takes_precedence_over_token() {
        let settings = BackendSettingsDraft {
            base_url: Some("https://mentornet.example".into()),
            session_cookie: Some("token=abc".into()),
            api_token: Some("xyz".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(
            settings.credential(),
            Some(&Credential::Cookie("token=abc".into()))
        );

        let settings = BackendSettingsDraft {
            base_url: Some("https://mentornet.example".into()),
            session_cookie: Some("  ".into()),
            api_token: Some("xyz".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(settings.credential(), Some(&Credential::Bearer("xyz".into())));
    }
}
