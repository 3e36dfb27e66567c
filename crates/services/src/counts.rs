use std::sync::Arc;

use futures::future::join_all;
use mentornet_core::model::CourseId;
use serde_json::Value;

use crate::diagnostics::{Diagnostics, Stage};
use crate::endpoints::enrollment_count;
use crate::error::CandidateMissReason;
use crate::transport::{Transport, fetch_success};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCount {
    pub course_id: CourseId,
    pub count: Result<u64, CandidateMissReason>,
}

/// Read a count from `{count}`, `{total}`, `{enrollments: [...]}`, an array or a bare number.
#[must_use]
pub fn count_of(body: &Value) -> Option<u64> {
    match body {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => u64::try_from(items.len()).ok(),
        Value::Object(obj) => ["count", "total", "enrollments"]
            .iter()
            .find_map(|field| obj.get(*field).and_then(count_of)),
        _ => None,
    }
}

/// Per-course enrollment totals for the university dashboard.
#[derive(Clone)]
pub struct EnrollmentCounts {
    transport: Arc<dyn Transport>,
}

impl EnrollmentCounts {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch all counts concurrently. Each course settles on its own; the
    /// result keeps the input order.
    pub async fn fetch(
        &self,
        course_ids: &[CourseId],
        diagnostics: &mut Diagnostics,
    ) -> Vec<CourseCount> {
        let requests = course_ids.iter().map(|course_id| {
            let path = enrollment_count(course_id);
            let transport = Arc::clone(&self.transport);
            async move {
                let count = match fetch_success(transport.as_ref(), &path).await {
                    Ok(body) => count_of(&body).ok_or(CandidateMissReason::MissingCount),
                    Err(reason) => Err(reason),
                };
                (path, count)
            }
        });
        let settled = join_all(requests).await;

        course_ids
            .iter()
            .zip(settled)
            .map(|(course_id, (path, count))| {
                diagnostics.record(
                    Stage::EnrollmentCount,
                    path,
                    Some(course_id),
                    count
                        .as_ref()
                        .map(|_| 1)
                        .map_err(CandidateMissReason::clone),
                );
                CourseCount {
                    course_id: course_id.clone(),
                    count,
                }
            })
            .collect()
    }

    /// Sum of the counts that settled successfully.
    #[must_use]
    pub fn total(counts: &[CourseCount]) -> u64 {
        counts
            .iter()
            .filter_map(|entry| entry.count.as_ref().ok())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FixtureTransport;
    use serde_json::json;

    #[test]
    fn count_shapes() {
        assert_eq!(count_of(&json!(7)), Some(7));
        assert_eq!(count_of(&json!({ "count": 3 })), Some(3));
        assert_eq!(count_of(&json!({ "total": 4 })), Some(4));
        assert_eq!(count_of(&json!({ "enrollments": [{}, {}] })), Some(2));
        assert_eq!(count_of(&json!([1, 2, 3])), Some(3));
        assert_eq!(count_of(&json!({ "message": "x" })), None);
        assert_eq!(count_of(&json!(-1)), None);
    }

    #[tokio::test]
    async fn failures_settle_independently() {
        let transport = Arc::new(
            FixtureTransport::new()
                .with_json("/api/courses/c1/enrollments/count", 200, json!({ "count": 12 }))
                .with_status("/api/courses/c2/enrollments/count", 500)
                .with_json("/api/courses/c3/enrollments/count", 200, json!([{}, {}])),
        );
        let counts = EnrollmentCounts::new(transport);
        let ids: Vec<CourseId> = ["c1", "c2", "c3"]
            .iter()
            .map(|id| CourseId::new(*id).unwrap())
            .collect();

        let mut diagnostics = Diagnostics::new();
        let settled = counts.fetch(&ids, &mut diagnostics).await;

        assert_eq!(settled[0].count, Ok(12));
        assert_eq!(settled[1].count, Err(CandidateMissReason::HttpStatus(500)));
        assert_eq!(settled[2].count, Ok(2));
        assert_eq!(EnrollmentCounts::total(&settled), 14);
        assert_eq!(diagnostics.misses().count(), 1);
    }
}
