//! Progress bodies come in several dialects; this folds them into `ProgressRecord`.
//!
//! Lists may arrive as arrays of objects or as `{ id: value }` maps. Entries
//! without an id fall back to their position.

use mentornet_core::model::{ProgressRecord, ProjectProgress, QuizResult, VideoProgress};
use serde_json::{Map, Value};

use crate::shape::{first_id, id_text};

const COMPLETION_FIELDS: [&str; 3] = ["overallCompletion", "completion", "percent"];
const VIDEO_FIELDS: [&str; 3] = ["videosWatched", "videos", "watchProgress"];
const QUIZ_FIELDS: [&str; 2] = ["quizzes", "quizProgress"];
const PROJECT_FIELDS: [&str; 2] = ["projects", "projectProgress"];

const VIDEO_ID_FIELDS: [&str; 3] = ["id", "videoId", "_id"];
const VIDEO_PERCENT_FIELDS: [&str; 3] = ["percent", "progress", "watched"];
const QUIZ_ID_FIELDS: [&str; 3] = ["id", "quizId", "_id"];
const QUIZ_SCORE_FIELDS: [&str; 2] = ["score", "percent"];
const PROJECT_ID_FIELDS: [&str; 3] = ["id", "projectId", "_id"];
const PROJECT_SCORE_FIELDS: [&str; 2] = ["score", "grade"];

/// Numeric value of a JSON scalar; numeric strings are accepted.
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|field| obj.get(*field).filter(|value| !value.is_null()))
}

fn first_number(obj: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    first_present(obj, fields).and_then(number_of)
}

/// `(id, entry)` pairs from either an array or an id-keyed map.
fn entries<'a>(value: &'a Value, id_fields: &[&str]) -> Vec<(String, &'a Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let id = match item {
                    Value::Object(obj) => first_id(obj, id_fields),
                    other => id_text(other),
                };
                (id.unwrap_or_else(|| index.to_string()), item)
            })
            .collect(),
        Value::Object(map) => map.iter().map(|(key, item)| (key.clone(), item)).collect(),
        _ => Vec::new(),
    }
}

/// Watch percentage of a scalar; `true` / `false` mean fully watched / not watched.
fn watch_percent(value: &Value) -> f64 {
    match value {
        Value::Bool(true) => 100.0,
        other => number_of(other).unwrap_or(0.0),
    }
}

fn video_of(id: String, entry: &Value) -> VideoProgress {
    let percent = match entry {
        Value::Object(obj) => first_present(obj, &VIDEO_PERCENT_FIELDS).map_or(0.0, watch_percent),
        // A bare id in a watched list means the video was watched.
        Value::String(_) => 100.0,
        other => watch_percent(other),
    };
    VideoProgress::new(id, percent)
}

fn quiz_of(id: String, entry: &Value) -> QuizResult {
    let score = match entry {
        Value::Object(obj) => first_number(obj, &QUIZ_SCORE_FIELDS),
        other => number_of(other),
    };
    QuizResult::new(id, score.unwrap_or(0.0))
}

fn project_of(id: String, entry: &Value) -> ProjectProgress {
    let Value::Object(obj) = entry else {
        return ProjectProgress::new(id, entry.as_bool().unwrap_or(false), None);
    };
    let score = first_number(obj, &PROJECT_SCORE_FIELDS);
    let submitted = match obj.get("submitted") {
        Some(Value::Bool(flag)) => *flag,
        _ => matches!(
            obj.get("status").and_then(Value::as_str),
            Some("submitted" | "graded")
        ),
    };
    ProjectProgress::new(id, submitted || score.is_some(), score)
}

/// Normalize a progress body. Non-object bodies yield an all-zero record.
#[must_use]
pub fn normalize_progress(body: &Value) -> ProgressRecord {
    let Some(obj) = body.as_object() else {
        return ProgressRecord::default();
    };

    let overall = first_number(obj, &COMPLETION_FIELDS).unwrap_or(0.0);

    let videos = first_present(obj, &VIDEO_FIELDS)
        .map(|value| {
            entries(value, &VIDEO_ID_FIELDS)
                .into_iter()
                .map(|(id, entry)| video_of(id, entry))
                .collect()
        })
        .unwrap_or_default();

    let quizzes = first_present(obj, &QUIZ_FIELDS)
        .map(|value| {
            entries(value, &QUIZ_ID_FIELDS)
                .into_iter()
                .map(|(id, entry)| quiz_of(id, entry))
                .collect()
        })
        .unwrap_or_default();

    let projects = first_present(obj, &PROJECT_FIELDS)
        .map(|value| {
            entries(value, &PROJECT_ID_FIELDS)
                .into_iter()
                .map(|(id, entry)| project_of(id, entry))
                .collect()
        })
        .unwrap_or_default();

    ProgressRecord::new(overall, videos, quizzes, projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn completion_is_clamped() {
        assert!(approx(
            normalize_progress(&json!({ "overallCompletion": 150 })).overall_completion(),
            100.0
        ));
        assert!(approx(
            normalize_progress(&json!({ "completion": -5 })).overall_completion(),
            0.0
        ));
        assert!(approx(
            normalize_progress(&json!({})).overall_completion(),
            0.0
        ));
    }

    #[test]
    fn completion_alias_priority_and_numeric_strings() {
        let record = normalize_progress(&json!({ "percent": 10, "completion": "55.5" }));
        assert!(approx(record.overall_completion(), 55.5));

        let record = normalize_progress(&json!({ "overallCompletion": null, "percent": 30 }));
        assert!(approx(record.overall_completion(), 30.0));

        let record = normalize_progress(&json!({ "overallCompletion": "n/a" }));
        assert!(approx(record.overall_completion(), 0.0));
    }

    #[test]
    fn videos_from_array_and_map() {
        let record = normalize_progress(&json!({
            "videos": [
                { "videoId": "v1", "progress": 40 },
                { "percent": 250 },
                "v3"
            ]
        }));
        let videos = &record.videos_watched;
        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].id, "v1");
        assert!(approx(videos[0].percent(), 40.0));
        assert_eq!(videos[1].id, "1");
        assert!(approx(videos[1].percent(), 100.0));
        assert_eq!(videos[2].id, "v3");

        let record = normalize_progress(&json!({ "watchProgress": { "v9": -10 } }));
        assert_eq!(record.videos_watched[0].id, "v9");
        assert!(approx(record.videos_watched[0].percent(), 0.0));
    }

    #[test]
    fn watched_flags_inside_objects() {
        let record = normalize_progress(&json!({
            "videosWatched": [
                { "id": "v1", "watched": true },
                { "id": "v2", "watched": false },
                { "id": "v3", "percent": true }
            ]
        }));
        let percents: Vec<f64> = record.videos_watched.iter().map(|v| v.percent()).collect();
        assert_eq!(percents, vec![100.0, 0.0, 100.0]);
    }

    #[test]
    fn quizzes_and_projects() {
        let record = normalize_progress(&json!({
            "quizProgress": [{ "quizId": "q1", "score": 8 }, { "id": "q2" }],
            "projectProgress": [
                { "projectId": "p1", "submitted": true },
                { "id": "p2", "status": "graded", "grade": 92 },
                { "id": "p3" }
            ]
        }));
        assert_eq!(record.quizzes[0], QuizResult::new("q1", 8.0));
        assert_eq!(record.quizzes[1], QuizResult::new("q2", 0.0));

        assert_eq!(record.projects[0], ProjectProgress::new("p1", true, None));
        assert_eq!(record.projects[1], ProjectProgress::new("p2", true, Some(92.0)));
        assert_eq!(record.projects[2], ProjectProgress::new("p3", false, None));
    }

    #[test]
    fn non_object_body_is_all_zero() {
        assert_eq!(normalize_progress(&json!([1, 2])), ProgressRecord::default());
    }
}
