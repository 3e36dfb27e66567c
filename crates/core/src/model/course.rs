use serde::{Deserialize, Serialize};

use crate::model::{CourseId, ProgressRecord};

/// A course the student is enrolled in, as discovered from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub course_id: CourseId,
    /// Best-effort display metadata.
    pub title: Option<String>,
}

impl CourseRef {
    #[must_use]
    pub fn new(course_id: CourseId, title: Option<String>) -> Self {
        let title = title
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty());
        Self { course_id, title }
    }

    /// Title to render, falling back to the course id.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.course_id.as_str())
    }
}

/// One row of the enrollment view model.
///
/// `progress == None` means no progress was found yet, which is not the same
/// as a record with all fields at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course: CourseRef,
    pub progress: Option<ProgressRecord>,
}

impl Enrollment {
    #[must_use]
    pub fn new(course: CourseRef, progress: Option<ProgressRecord>) -> Self {
        Self { course, progress }
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course.course_id
    }

    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.progress.is_some()
    }
}
