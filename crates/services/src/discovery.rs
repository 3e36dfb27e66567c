use std::collections::HashSet;
use std::sync::Arc;

use mentornet_core::model::{CourseRef, ProgressRecord, StudentId};
use serde_json::Value;

use crate::diagnostics::{Diagnostics, Stage};
use crate::endpoints::{CourseCandidate, progress_for_student};
use crate::error::CandidateMissReason;
use crate::normalize::normalize_progress;
use crate::shape::{ResponseShape, classify, course_ref_of, map_course_items};
use crate::transport::{Transport, fetch_success};

/// A discovered course, possibly carrying progress found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredCourse {
    pub course: CourseRef,
    /// Set when the course came from the progress fallback; hydration skips it.
    pub prefetched: Option<ProgressRecord>,
}

impl DiscoveredCourse {
    #[must_use]
    pub fn new(course: CourseRef) -> Self {
        Self {
            course,
            prefetched: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Candidate(CourseCandidate),
    ProgressFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOutcome {
    pub courses: Vec<DiscoveredCourse>,
    /// `None` when every candidate and the fallback came up empty.
    pub source: Option<DiscoverySource>,
}

impl DiscoveryOutcome {
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Keep the first occurrence of each course id, preserving order.
#[must_use]
pub fn dedupe_courses(courses: Vec<DiscoveredCourse>) -> Vec<DiscoveredCourse> {
    let mut seen = HashSet::with_capacity(courses.len());
    courses
        .into_iter()
        .filter(|item| seen.insert(item.course.course_id.clone()))
        .collect()
}

/// Map a course-list body using the shape classifier.
///
/// # Errors
///
/// Returns `UnrecognizedShape` if no known shape matches and `NoUsableItems`
/// if a top-level array carries no item with an id.
pub fn courses_from_body(body: &Value) -> Result<Vec<CourseRef>, CandidateMissReason> {
    let shape = classify(body);
    if matches!(shape, ResponseShape::Unrecognized) {
        return Err(CandidateMissReason::UnrecognizedShape);
    }
    let courses = map_course_items(shape.items());
    if courses.is_empty() {
        return Err(CandidateMissReason::NoUsableItems);
    }
    Ok(courses)
}

/// Finds which endpoint serves a student's enrolled courses.
#[derive(Clone)]
pub struct CourseDiscovery {
    transport: Arc<dyn Transport>,
}

impl CourseDiscovery {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Probe candidates in priority order, then the progress fallback.
    ///
    /// Never fails; an empty outcome means discovery was exhausted.
    pub async fn discover_courses(
        &self,
        student_id: &StudentId,
        diagnostics: &mut Diagnostics,
    ) -> DiscoveryOutcome {
        for candidate in CourseCandidate::ORDER {
            let path = candidate.path(student_id);
            let result = self.try_candidate(&path).await;
            diagnostics.record(
                Stage::Discovery,
                &path,
                None,
                result.as_ref().map(Vec::len).map_err(CandidateMissReason::clone),
            );
            if let Ok(courses) = result {
                let courses =
                    dedupe_courses(courses.into_iter().map(DiscoveredCourse::new).collect());
                tracing::info!(
                    student_id = student_id.as_str(),
                    %path,
                    courses = courses.len(),
                    "courses discovered"
                );
                return DiscoveryOutcome {
                    courses,
                    source: Some(DiscoverySource::Candidate(candidate)),
                };
            }
        }

        let path = progress_for_student(student_id);
        let result = self.try_progress_fallback(&path).await;
        diagnostics.record(
            Stage::DiscoveryFallback,
            &path,
            None,
            result.as_ref().map(Vec::len).map_err(CandidateMissReason::clone),
        );
        match result {
            Ok(courses) => {
                let courses = dedupe_courses(courses);
                tracing::info!(
                    student_id = student_id.as_str(),
                    courses = courses.len(),
                    "courses discovered from progress fallback"
                );
                DiscoveryOutcome {
                    courses,
                    source: Some(DiscoverySource::ProgressFallback),
                }
            }
            Err(_) => {
                tracing::warn!(
                    student_id = student_id.as_str(),
                    "no courses discovered"
                );
                DiscoveryOutcome {
                    courses: Vec::new(),
                    source: None,
                }
            }
        }
    }

    async fn try_candidate(&self, path: &str) -> Result<Vec<CourseRef>, CandidateMissReason> {
        let body = fetch_success(self.transport.as_ref(), path).await?;
        courses_from_body(&body)
    }

    async fn try_progress_fallback(
        &self,
        path: &str,
    ) -> Result<Vec<DiscoveredCourse>, CandidateMissReason> {
        let body = fetch_success(self.transport.as_ref(), path).await?;
        let items = match &body {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(CandidateMissReason::UnrecognizedShape),
        };
        let courses: Vec<DiscoveredCourse> = items
            .iter()
            .filter_map(|item| {
                course_ref_of(item).map(|course| DiscoveredCourse {
                    course,
                    prefetched: Some(normalize_progress(item)),
                })
            })
            .collect();
        if courses.is_empty() {
            return Err(CandidateMissReason::NoUsableItems);
        }
        Ok(courses)
    }
}
