use std::sync::Arc;

use mentornet_core::Clock;
use mentornet_core::model::{CourseId, StudentId};
use storage::repository::{Storage, StorageError};

use crate::config::MentorNetConfig;
use crate::counts::{CourseCount, EnrollmentCounts};
use crate::diagnostics::Diagnostics;
use crate::error::{AppServicesError, ConfigError};
use crate::session::EnrollmentSession;
use crate::transport::{ReqwestTransport, Transport};

/// Assembles the enrollment session, the counts service and the identity cache.
#[derive(Clone)]
pub struct AppServices {
    session: Arc<EnrollmentSession>,
    counts: Arc<EnrollmentCounts>,
    storage: Storage,
}

impl AppServices {
    /// Build services against the configured backend with a `SQLite` identity cache.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the backend settings are invalid or
    /// storage initialization fails.
    pub async fn new_sqlite(
        config: &MentorNetConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let settings = config.backend_settings().map_err(ConfigError::from)?;
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(settings)?);
        let storage = Storage::sqlite(config.db_url()).await?;
        Ok(Self::with_transport(
            transport,
            storage,
            clock,
            config.explicit_student_id(),
        ))
    }

    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        storage: Storage,
        clock: Clock,
        explicit: Option<StudentId>,
    ) -> Self {
        let session = Arc::new(EnrollmentSession::from_transport(
            Arc::clone(&transport),
            Arc::clone(&storage.identity),
            clock,
            explicit,
        ));
        let counts = Arc::new(EnrollmentCounts::new(transport));
        Self {
            session,
            counts,
            storage,
        }
    }

    #[must_use]
    pub fn session(&self) -> Arc<EnrollmentSession> {
        Arc::clone(&self.session)
    }

    /// Enrollment counts for the courses currently in the view.
    pub async fn enrollment_counts(&self) -> (Vec<CourseCount>, Diagnostics) {
        let course_ids: Vec<CourseId> = self
            .session
            .snapshot()
            .view
            .entries()
            .iter()
            .map(|entry| entry.course_id().clone())
            .collect();
        let mut diagnostics = Diagnostics::new();
        let counts = self.counts.fetch(&course_ids, &mut diagnostics).await;
        (counts, diagnostics)
    }

    /// Drop the cached identity and reset the session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache cannot be cleared.
    pub async fn forget_identity(&self) -> Result<(), StorageError> {
        self.storage.identity.clear_identity().await?;
        self.session.invalidate();
        tracing::info!("cached identity cleared");
        Ok(())
    }
}
