//! Candidate URL templates, in the order they are probed.

use mentornet_core::model::{CourseId, StudentId};
use url::form_urlencoded;

/// Identity lookup for the authenticated session.
pub const SESSION_LOOKUP: &str = "/api/auth/me";

fn encode(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Places the enrolled-course list may be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseCandidate {
    StudentScoped,
    UserScoped,
    EnrollmentScoped,
    QueryParam,
    Generic,
}

impl CourseCandidate {
    pub const ORDER: [Self; 5] = [
        Self::StudentScoped,
        Self::UserScoped,
        Self::EnrollmentScoped,
        Self::QueryParam,
        Self::Generic,
    ];

    #[must_use]
    pub fn path(self, student_id: &StudentId) -> String {
        let sid = encode(student_id.as_str());
        match self {
            Self::StudentScoped => format!("/api/students/{sid}/courses"),
            Self::UserScoped => format!("/api/users/{sid}/courses"),
            Self::EnrollmentScoped => format!("/api/enrollments/student/{sid}"),
            Self::QueryParam => format!("/api/courses?studentId={sid}"),
            Self::Generic => "/api/courses/enrolled".to_owned(),
        }
    }
}

/// Places a single course's progress may be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCandidate {
    StudentCourse,
    CourseStudent,
    CourseScoped,
    QueryParam,
}

impl ProgressCandidate {
    pub const ORDER: [Self; 4] = [
        Self::StudentCourse,
        Self::CourseStudent,
        Self::CourseScoped,
        Self::QueryParam,
    ];

    #[must_use]
    pub fn path(self, student_id: &StudentId, course_id: &CourseId) -> String {
        let sid = encode(student_id.as_str());
        let cid = encode(course_id.as_str());
        match self {
            Self::StudentCourse => format!("/api/progress/{sid}/{cid}"),
            Self::CourseStudent => format!("/api/progress/course/{cid}/student/{sid}"),
            Self::CourseScoped => format!("/api/courses/{cid}/progress"),
            Self::QueryParam => format!("/api/progress?studentId={sid}&courseId={cid}"),
        }
    }
}

/// Every progress record of one student. Shared fallback for discovery and hydration.
#[must_use]
pub fn progress_for_student(student_id: &StudentId) -> String {
    format!("/api/progress/student/{}", encode(student_id.as_str()))
}

#[must_use]
pub fn enrollment_count(course_id: &CourseId) -> String {
    format!("/api/courses/{}/enrollments/count", encode(course_id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_candidates_follow_priority_order() {
        let sid = StudentId::new("s1").unwrap();
        let paths: Vec<String> = CourseCandidate::ORDER.iter().map(|c| c.path(&sid)).collect();
        assert_eq!(
            paths,
            vec![
                "/api/students/s1/courses",
                "/api/users/s1/courses",
                "/api/enrollments/student/s1",
                "/api/courses?studentId=s1",
                "/api/courses/enrolled",
            ]
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let sid = StudentId::new("a b/c").unwrap();
        let cid = CourseId::new("x&y").unwrap();
        assert_eq!(
            ProgressCandidate::QueryParam.path(&sid, &cid),
            "/api/progress?studentId=a%20b%2Fc&courseId=x%26y"
        );
        assert_eq!(progress_for_student(&sid), "/api/progress/student/a%20b%2Fc");
    }
}
