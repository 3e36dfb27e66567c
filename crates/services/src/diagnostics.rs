//! Inspectable record of every candidate attempt made during a load.

use mentornet_core::model::CourseId;

use crate::error::CandidateMissReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Identity,
    Discovery,
    DiscoveryFallback,
    Hydration,
    HydrationFallback,
    EnrollmentCount,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Identity => "identity",
            Stage::Discovery => "discovery",
            Stage::DiscoveryFallback => "discovery-fallback",
            Stage::Hydration => "hydration",
            Stage::HydrationFallback => "hydration-fallback",
            Stage::EnrollmentCount => "enrollment-count",
        }
    }
}

/// One request and what came of it. `Ok` carries the number of usable items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub stage: Stage,
    pub path: String,
    pub course_id: Option<CourseId>,
    pub outcome: Result<usize, CandidateMissReason>,
}

impl CandidateAttempt {
    #[must_use]
    pub fn is_miss(&self) -> bool {
        self.outcome.is_err()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    attempts: Vec<CandidateAttempt>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        stage: Stage,
        path: impl Into<String>,
        course_id: Option<&CourseId>,
        outcome: Result<usize, CandidateMissReason>,
    ) {
        let path = path.into();
        match &outcome {
            Ok(items) => tracing::debug!(
                stage = stage.as_str(),
                %path,
                course_id = course_id.map(CourseId::as_str),
                items,
                "candidate accepted"
            ),
            Err(reason) => tracing::debug!(
                stage = stage.as_str(),
                %path,
                course_id = course_id.map(CourseId::as_str),
                %reason,
                "candidate missed"
            ),
        }
        self.attempts.push(CandidateAttempt {
            stage,
            path,
            course_id: course_id.cloned(),
            outcome,
        });
    }

    #[must_use]
    pub fn attempts(&self) -> &[CandidateAttempt] {
        &self.attempts
    }

    pub fn misses(&self) -> impl Iterator<Item = &CandidateAttempt> {
        self.attempts.iter().filter(|attempt| attempt.is_miss())
    }

    /// Paths requested in the given stage, in order.
    #[must_use]
    pub fn paths(&self, stage: Stage) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|attempt| attempt.stage == stage)
            .map(|attempt| attempt.path.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_and_filters_misses() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(
            Stage::Discovery,
            "/a",
            None,
            Err(CandidateMissReason::HttpStatus(404)),
        );
        diagnostics.record(Stage::Discovery, "/b", None, Ok(2));

        assert_eq!(diagnostics.paths(Stage::Discovery), vec!["/a", "/b"]);
        let misses: Vec<_> = diagnostics.misses().collect();
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].path, "/a");
    }
}
