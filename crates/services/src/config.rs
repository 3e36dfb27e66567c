use std::env;

use mentornet_core::model::{BackendSettings, BackendSettingsDraft, BackendSettingsError, StudentId};

pub const DEFAULT_DB_URL: &str = "sqlite:mentornet.sqlite3";

/// Runtime configuration gathered from `MENTORNET_*` variables.
///
/// Every field stays raw until [`MentorNetConfig::backend_settings`] validates it,
/// so command-line flags can still override individual values.
#[derive(Clone, Debug, Default)]
pub struct MentorNetConfig {
    pub backend: BackendSettingsDraft,
    pub student_id: Option<String>,
    pub db_url: Option<String>,
}

impl MentorNetConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            backend: BackendSettingsDraft {
                base_url: lookup("MENTORNET_API_BASE_URL"),
                session_cookie: lookup("MENTORNET_SESSION_COOKIE"),
                api_token: lookup("MENTORNET_API_TOKEN"),
            },
            student_id: lookup("MENTORNET_STUDENT_ID"),
            db_url: lookup("MENTORNET_DB_URL"),
        }
    }

    /// # Errors
    ///
    /// Returns `BackendSettingsError` if the base URL is missing or invalid.
    pub fn backend_settings(&self) -> Result<BackendSettings, BackendSettingsError> {
        self.backend.clone().validate()
    }

    /// Explicit identity override; blank values count as absent.
    #[must_use]
    pub fn explicit_student_id(&self) -> Option<StudentId> {
        self.student_id
            .as_deref()
            .and_then(|raw| StudentId::new(raw).ok())
    }

    #[must_use]
    pub fn db_url(&self) -> &str {
        self.db_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_DB_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> MentorNetConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        MentorNetConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn reads_backend_and_identity() {
        let config = config(&[
            ("MENTORNET_API_BASE_URL", "https://mentornet.test"),
            ("MENTORNET_API_TOKEN", "abc"),
            ("MENTORNET_STUDENT_ID", " s1 "),
        ]);
        let settings = config.backend_settings().unwrap();
        assert_eq!(settings.base_url().as_str(), "https://mentornet.test/");
        assert!(settings.credential().is_some());
        assert_eq!(config.explicit_student_id().unwrap().as_str(), "s1");
        assert_eq!(config.db_url(), DEFAULT_DB_URL);
    }

    #[test]
    fn blank_values_are_absent() {
        let config = config(&[("MENTORNET_STUDENT_ID", "  "), ("MENTORNET_DB_URL", "")]);
        assert!(config.explicit_student_id().is_none());
        assert_eq!(config.db_url(), DEFAULT_DB_URL);
        assert_eq!(
            config.backend_settings(),
            Err(BackendSettingsError::MissingBaseUrl)
        );
    }
}
