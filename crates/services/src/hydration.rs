use std::sync::Arc;

use mentornet_core::model::{CourseId, Enrollment, ProgressRecord, StudentId};
use serde_json::Value;

use crate::diagnostics::{Diagnostics, Stage};
use crate::discovery::DiscoveredCourse;
use crate::endpoints::{ProgressCandidate, progress_for_student};
use crate::error::CandidateMissReason;
use crate::normalize::normalize_progress;
use crate::shape::course_id_of;
use crate::transport::{Transport, fetch_success};

/// The all-progress-for-student body, fetched at most once per hydration run.
#[derive(Default)]
struct SharedProgress {
    loaded: Option<Result<Vec<Value>, CandidateMissReason>>,
}

impl SharedProgress {
    async fn entries(
        &mut self,
        transport: &dyn Transport,
        student_id: &StudentId,
        diagnostics: &mut Diagnostics,
    ) -> Result<&[Value], CandidateMissReason> {
        if self.loaded.is_none() {
            let path = progress_for_student(student_id);
            let result = match fetch_success(transport, &path).await {
                Ok(Value::Array(items)) => Ok(items),
                Ok(_) => Err(CandidateMissReason::UnrecognizedShape),
                Err(reason) => Err(reason),
            };
            diagnostics.record(
                Stage::HydrationFallback,
                &path,
                None,
                result.as_ref().map(Vec::len).map_err(CandidateMissReason::clone),
            );
            self.loaded = Some(result);
        }
        match &self.loaded {
            Some(Ok(items)) => Ok(items.as_slice()),
            Some(Err(reason)) => Err(reason.clone()),
            None => Err(CandidateMissReason::EmptyBody),
        }
    }
}

/// Attaches progress to discovered courses.
#[derive(Clone)]
pub struct ProgressHydrator {
    transport: Arc<dyn Transport>,
}

impl ProgressHydrator {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Resolve progress for every course, independently of each other.
    ///
    /// Courses that arrived with prefetched progress are not re-fetched.
    /// Safe to re-run; each run starts from fresh backend reads.
    pub async fn hydrate_progress(
        &self,
        student_id: &StudentId,
        courses: &[DiscoveredCourse],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Enrollment> {
        let mut shared = SharedProgress::default();
        let mut enrollments = Vec::with_capacity(courses.len());

        for discovered in courses {
            let progress = match &discovered.prefetched {
                Some(prefetched) => Some(prefetched.clone()),
                None => {
                    self.course_progress(
                        student_id,
                        &discovered.course.course_id,
                        &mut shared,
                        diagnostics,
                    )
                    .await
                }
            };
            enrollments.push(Enrollment::new(discovered.course.clone(), progress));
        }

        let missing = enrollments.iter().filter(|e| !e.has_progress()).count();
        if missing > 0 {
            tracing::info!(
                student_id = student_id.as_str(),
                courses = enrollments.len(),
                missing,
                "progress partially hydrated"
            );
        }
        enrollments
    }

    async fn course_progress(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
        shared: &mut SharedProgress,
        diagnostics: &mut Diagnostics,
    ) -> Option<ProgressRecord> {
        for candidate in ProgressCandidate::ORDER {
            let path = candidate.path(student_id, course_id);
            let result = match fetch_success(self.transport.as_ref(), &path).await {
                Ok(body) if body.is_object() => Ok(normalize_progress(&body)),
                Ok(_) => Err(CandidateMissReason::NotAnObject),
                Err(reason) => Err(reason),
            };
            diagnostics.record(
                Stage::Hydration,
                &path,
                Some(course_id),
                result.as_ref().map(|_| 1).map_err(CandidateMissReason::clone),
            );
            if let Ok(record) = result {
                return Some(record);
            }
        }

        // Matches only on the shared course-id aliases; an all-progress body
        // keyed by any other field never matches.
        let entries = match shared
            .entries(self.transport.as_ref(), student_id, diagnostics)
            .await
        {
            Ok(entries) => entries,
            Err(_) => return None,
        };
        let found = entries
            .iter()
            .find(|entry| course_id_of(entry).as_ref() == Some(course_id))
            .map(normalize_progress);
        if found.is_none() {
            tracing::debug!(
                course_id = course_id.as_str(),
                reason = %CandidateMissReason::NoMatchingEntry,
                "no progress for course"
            );
        }
        found
    }
}
