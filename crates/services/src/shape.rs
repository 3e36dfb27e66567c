//! Classification of untyped backend bodies into the shapes the resolver understands.
//!
//! All alias tables live here so the heuristics stay in one place.

use mentornet_core::model::{CourseId, CourseRef};
use serde_json::{Map, Value};

/// Container fields probed, in order, on object bodies.
pub const CONTAINER_FIELDS: [&str; 4] = ["courses", "enrolledCourses", "data", "items"];

const COURSE_ID_FIELDS: [&str; 3] = ["courseId", "_id", "id"];
const COURSE_TITLE_FIELDS: [&str; 2] = ["title", "name"];

/// Structural pattern of a course-list response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseShape<'a> {
    /// A non-empty top-level array.
    ArrayOfCourses(&'a [Value]),
    /// An object whose first usable container field holds at least one course.
    ContainerObject {
        field: &'static str,
        items: &'a [Value],
    },
    /// An object that is itself a course.
    SingleCourse(&'a Value),
    Unrecognized,
}

impl ResponseShape<'_> {
    /// Items to run through per-item mapping.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        match *self {
            ResponseShape::ArrayOfCourses(items) | ResponseShape::ContainerObject { items, .. } => {
                items
            }
            ResponseShape::SingleCourse(course) => std::slice::from_ref(course),
            ResponseShape::Unrecognized => &[],
        }
    }
}

#[must_use]
pub fn classify(body: &Value) -> ResponseShape<'_> {
    match body {
        Value::Array(items) if !items.is_empty() => ResponseShape::ArrayOfCourses(items),
        Value::Object(obj) => {
            for field in CONTAINER_FIELDS {
                if let Some(Value::Array(items)) = obj.get(field) {
                    if items.iter().any(|item| course_id_of(item).is_some()) {
                        return ResponseShape::ContainerObject { field, items };
                    }
                }
            }
            if course_id_of(body).is_some() {
                ResponseShape::SingleCourse(body)
            } else {
                ResponseShape::Unrecognized
            }
        }
        _ => ResponseShape::Unrecognized,
    }
}

/// Text form of a scalar id. Empty strings count as absent.
pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First of `fields` that is present with a usable scalar id.
pub(crate) fn first_id(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| obj.get(*field).and_then(id_text))
}

fn first_text(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match obj.get(*field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    })
}

fn nested_course(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
    obj.get("course").and_then(Value::as_object)
}

/// Course id by alias priority: `courseId`, `_id`, `id`, `course._id`.
#[must_use]
pub fn course_id_of(item: &Value) -> Option<CourseId> {
    let obj = item.as_object()?;
    first_id(obj, &COURSE_ID_FIELDS)
        .or_else(|| nested_course(obj).and_then(|course| first_id(course, &["_id"])))
        .and_then(|raw| CourseId::new(raw).ok())
}

/// Title by alias priority: `title`, `name`, `course.title`, `course.name`.
#[must_use]
pub fn course_title_of(item: &Value) -> Option<String> {
    let obj = item.as_object()?;
    first_text(obj, &COURSE_TITLE_FIELDS)
        .or_else(|| nested_course(obj).and_then(|course| first_text(course, &COURSE_TITLE_FIELDS)))
}

#[must_use]
pub fn course_ref_of(item: &Value) -> Option<CourseRef> {
    let course_id = course_id_of(item)?;
    Some(CourseRef::new(course_id, course_title_of(item)))
}

/// Map items to course refs, dropping items without an id.
#[must_use]
pub fn map_course_items(items: &[Value]) -> Vec<CourseRef> {
    items.iter().filter_map(course_ref_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_non_empty_array() {
        let body = json!([{ "courseId": "c1" }]);
        assert!(matches!(
            classify(&body),
            ResponseShape::ArrayOfCourses(items) if items.len() == 1
        ));
    }

    #[test]
    fn classify_empty_array_is_unrecognized() {
        assert_eq!(classify(&json!([])), ResponseShape::Unrecognized);
    }

    #[test]
    fn classify_container_in_field_order() {
        let body = json!({
            "courses": [],
            "data": [{ "_id": "c2" }],
            "items": [{ "_id": "c3" }],
        });
        match classify(&body) {
            ResponseShape::ContainerObject { field, items } => {
                assert_eq!(field, "data");
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn container_without_course_ids_is_skipped() {
        let body = json!({
            "courses": [{ "foo": 1 }],
            "enrolledCourses": [{ "_id": "c2" }],
        });
        assert!(matches!(
            classify(&body),
            ResponseShape::ContainerObject { field: "enrolledCourses", .. }
        ));
    }

    #[test]
    fn course_with_lesson_items_is_a_single_course() {
        let body = json!({ "_id": "c1", "title": "Algebra", "items": [{ "text": "lesson 1" }] });
        match classify(&body) {
            ResponseShape::SingleCourse(course) => {
                assert_eq!(course_id_of(course).unwrap().as_str(), "c1");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn classify_single_course_and_unrecognized() {
        let single = json!({ "_id": "c1", "title": "Algebra" });
        assert!(matches!(classify(&single), ResponseShape::SingleCourse(_)));

        assert_eq!(classify(&json!({ "message": "ok" })), ResponseShape::Unrecognized);
        assert_eq!(classify(&json!("courses")), ResponseShape::Unrecognized);
        assert_eq!(classify(&Value::Null), ResponseShape::Unrecognized);
    }

    #[test]
    fn id_alias_priority() {
        let item = json!({ "id": "third", "_id": "second", "courseId": "first" });
        assert_eq!(course_id_of(&item).unwrap().as_str(), "first");

        let item = json!({ "courseId": "", "_id": "second" });
        assert_eq!(course_id_of(&item).unwrap().as_str(), "second");

        let item = json!({ "course": { "_id": "nested", "title": "Geometry" } });
        assert_eq!(course_id_of(&item).unwrap().as_str(), "nested");
        assert_eq!(course_title_of(&item).as_deref(), Some("Geometry"));

        let item = json!({ "id": 17 });
        assert_eq!(course_id_of(&item).unwrap().as_str(), "17");
    }

    #[test]
    fn title_alias_priority() {
        let item = json!({ "_id": "c1", "name": "Second", "title": "First" });
        assert_eq!(course_title_of(&item).as_deref(), Some("First"));

        let item = json!({ "_id": "c1", "course": { "name": "Nested" } });
        assert_eq!(course_title_of(&item).as_deref(), Some("Nested"));

        assert_eq!(course_title_of(&json!({ "_id": "c1" })), None);
    }

    #[test]
    fn mapping_drops_items_without_id() {
        let items = vec![json!({ "title": "No id" }), json!("c1"), json!({ "_id": "c2" })];
        let mapped = map_course_items(&items);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].course_id.as_str(), "c2");
        assert_eq!(mapped[0].title, None);
    }
}
