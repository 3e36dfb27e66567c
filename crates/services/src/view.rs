use mentornet_core::model::{Enrollment, ProgressRecord};
use serde::Serialize;

/// Presentation-agnostic row for one enrolled course.
///
/// Completion stays numeric; the caller decides how to format it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRow {
    pub index: usize,
    pub course_id: String,
    pub title: String,
    /// `None` renders as a "no progress yet" placeholder.
    pub completion: Option<f64>,
    pub videos: usize,
    pub quizzes: usize,
    pub average_quiz_score: Option<f64>,
    pub projects_submitted: usize,
    pub selected: bool,
}

impl EnrollmentRow {
    #[must_use]
    pub fn completion_label(&self) -> String {
        match self.completion {
            Some(percent) => format!("{percent:.0}%"),
            None => "No progress yet".to_string(),
        }
    }
}

/// Ordered enrollments plus an index-based selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentView {
    entries: Vec<Enrollment>,
    selected: usize,
}

impl EnrollmentView {
    #[must_use]
    pub fn new(entries: Vec<Enrollment>) -> Self {
        Self {
            entries,
            selected: 0,
        }
    }

    /// Swap in a fresh list, keeping the selection index if it still fits.
    pub fn replace_entries(&mut self, entries: Vec<Enrollment>) {
        self.entries = entries;
        self.clamp_selection();
    }

    /// Select by position; out-of-range indices snap to the last entry.
    pub fn select(&mut self, index: usize) {
        self.selected = index;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.selected)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Enrollment> {
        self.entries.get(self.selected)
    }

    #[must_use]
    pub fn entries(&self) -> &[Enrollment] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> Vec<EnrollmentRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, enrollment)| {
                let progress = enrollment.progress.as_ref();
                EnrollmentRow {
                    index,
                    course_id: enrollment.course_id().to_string(),
                    title: enrollment.course.display_title().to_owned(),
                    completion: progress.map(ProgressRecord::overall_completion),
                    videos: progress.map_or(0, |p| p.videos_watched.len()),
                    quizzes: progress.map_or(0, |p| p.quizzes.len()),
                    average_quiz_score: progress.and_then(ProgressRecord::average_quiz_score),
                    projects_submitted: progress.map_or(0, |p| p.submitted_projects()),
                    selected: index == self.selected,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentornet_core::model::{CourseId, CourseRef, QuizResult};

    fn enrollment(id: &str, progress: Option<f64>) -> Enrollment {
        Enrollment::new(
            CourseRef::new(CourseId::new(id).unwrap(), None),
            progress.map(ProgressRecord::with_completion),
        )
    }

    #[test]
    fn selection_is_reclamped_when_list_shrinks() {
        let mut view = EnrollmentView::new(vec![
            enrollment("c1", None),
            enrollment("c2", None),
            enrollment("c3", None),
        ]);
        view.select(2);
        assert_eq!(view.selected_index(), Some(2));

        view.replace_entries(vec![enrollment("c1", None)]);
        assert_eq!(view.selected_index(), Some(0));
        assert_eq!(view.selected().unwrap().course_id().as_str(), "c1");

        view.replace_entries(Vec::new());
        assert_eq!(view.selected_index(), None);
        assert!(view.selected().is_none());
    }

    #[test]
    fn select_past_end_snaps_to_last() {
        let mut view = EnrollmentView::new(vec![enrollment("c1", None), enrollment("c2", None)]);
        view.select(10);
        assert_eq!(view.selected_index(), Some(1));
    }

    #[test]
    fn rows_fall_back_to_course_id_and_keep_missing_progress() {
        let view = EnrollmentView::new(vec![enrollment("c1", Some(40.0)), enrollment("c2", None)]);
        let rows = view.rows();
        assert_eq!(rows[0].title, "c1");
        assert_eq!(rows[0].completion, Some(40.0));
        assert!(rows[0].selected);
        assert_eq!(rows[1].completion, None);
        assert!(!rows[1].selected);
        assert_eq!(rows[0].completion_label(), "40%");
        assert_eq!(rows[1].completion_label(), "No progress yet");
        assert_eq!(rows[0].average_quiz_score, None);
    }

    #[test]
    fn rows_carry_average_quiz_score() {
        let progress = ProgressRecord::new(
            50.0,
            Vec::new(),
            vec![QuizResult::new("q1", 60.0), QuizResult::new("q2", 90.0)],
            Vec::new(),
        );
        let view = EnrollmentView::new(vec![Enrollment::new(
            CourseRef::new(CourseId::new("c1").unwrap(), None),
            Some(progress),
        )]);
        assert_eq!(view.rows()[0].average_quiz_score, Some(75.0));
    }
}
