use serde::{Deserialize, Serialize};

/// Clamp a percentage into `[0, 100]`. Non-finite input becomes `0`.
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProgress {
    pub id: String,
    percent: f64,
}

impl VideoProgress {
    #[must_use]
    pub fn new(id: impl Into<String>, percent: f64) -> Self {
        Self {
            id: id.into(),
            percent: clamp_percent(percent),
        }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }
}

/// Quiz scores are reported on the backend's own scale and are not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    pub score: f64,
}

impl QuizResult {
    #[must_use]
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        let score = if score.is_finite() { score } else { 0.0 };
        Self {
            id: id.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub id: String,
    pub submitted: bool,
    /// `None` until the project has been graded.
    pub score: Option<f64>,
}

impl ProjectProgress {
    #[must_use]
    pub fn new(id: impl Into<String>, submitted: bool, score: Option<f64>) -> Self {
        Self {
            id: id.into(),
            submitted,
            score: score.filter(|val| val.is_finite()),
        }
    }
}

/// Canonical per-course progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    overall_completion: f64,
    pub videos_watched: Vec<VideoProgress>,
    pub quizzes: Vec<QuizResult>,
    pub projects: Vec<ProjectProgress>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        overall_completion: f64,
        videos_watched: Vec<VideoProgress>,
        quizzes: Vec<QuizResult>,
        projects: Vec<ProjectProgress>,
    ) -> Self {
        Self {
            overall_completion: clamp_percent(overall_completion),
            videos_watched,
            quizzes,
            projects,
        }
    }

    #[must_use]
    pub fn with_completion(overall_completion: f64) -> Self {
        Self::new(overall_completion, Vec::new(), Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn overall_completion(&self) -> f64 {
        self.overall_completion
    }

    #[must_use]
    pub fn submitted_projects(&self) -> usize {
        self.projects.iter().filter(|p| p.submitted).count()
    }

    /// Mean quiz score, or `None` when no quizzes were taken.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_quiz_score(&self) -> Option<f64> {
        if self.quizzes.is_empty() {
            return None;
        }
        let sum: f64 = self.quizzes.iter().map(|q| q.score).sum();
        Some(sum / self.quizzes.len() as f64)
    }
}
