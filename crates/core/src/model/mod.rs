mod course;
mod ids;
mod progress;
mod settings;

pub use course::{CourseRef, Enrollment};
pub use ids::{CourseId, IdError, StudentId};
pub use progress::{
    ProgressRecord, ProjectProgress, QuizResult, VideoProgress, clamp_percent,
};
pub use settings::{BackendSettings, BackendSettingsDraft, BackendSettingsError, Credential};
