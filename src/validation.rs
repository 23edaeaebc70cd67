//! Structural validation for lesson documents
//!
//! Checks run in a fixed order and the first violation is returned
//! immediately. Argument contents are left to the individual handlers.

use crate::constants::fields;
use crate::error::ValidationError;
use crate::models::LessonDefinition;
use serde_json::{Map, Value};

/// Validates an untyped lesson document
///
/// Order: the document is an object, `lesson_id`/`title`/`steps` are present,
/// `steps` is an array, then each step in order is an object carrying
/// `step_id`, `instruction_text` and `command`. Presence is checked before type
/// so a missing field is always reported as missing.
pub fn validate_lesson(lesson: &Value) -> Result<(), ValidationError> {
    let Value::Object(root) = lesson else {
        return Err(ValidationError::lesson(
            "",
            "lesson must be an object",
        ));
    };

    for field in fields::REQUIRED_LESSON_FIELDS {
        if !root.contains_key(field) {
            return Err(ValidationError::lesson(
                field,
                format!("missing required top-level field: {field}"),
            ));
        }
    }

    let Some(Value::Array(steps)) = root.get(fields::STEPS) else {
        return Err(ValidationError::lesson(
            fields::STEPS,
            "lesson.steps must be an array",
        ));
    };

    match root.get(fields::LESSON_ID) {
        Some(Value::String(id)) if !id.is_empty() => {}
        Some(Value::String(_)) => {
            return Err(ValidationError::lesson(
                fields::LESSON_ID,
                "lesson_id must not be empty",
            ))
        }
        _ => {
            return Err(ValidationError::lesson(
                fields::LESSON_ID,
                "lesson_id must be a string",
            ))
        }
    }
    if !matches!(root.get(fields::TITLE), Some(Value::String(_))) {
        return Err(ValidationError::lesson(fields::TITLE, "title must be a string"));
    }

    for (index, step) in steps.iter().enumerate() {
        validate_step(index, step)?;
    }

    Ok(())
}

fn validate_step(index: usize, step: &Value) -> Result<(), ValidationError> {
    let Value::Object(step) = step else {
        return Err(ValidationError::step(
            index,
            "",
            format!("step at index {index} must be an object"),
        ));
    };

    for field in fields::REQUIRED_STEP_FIELDS {
        if !step.contains_key(field) {
            return Err(ValidationError::step(
                index,
                field,
                format!("step {index} missing required field: {field}"),
            ));
        }
    }

    for field in fields::REQUIRED_STEP_FIELDS {
        if !matches!(step.get(field), Some(Value::String(_))) {
            return Err(ValidationError::step(
                index,
                field,
                format!("step {index} field {field} must be a string"),
            ));
        }
    }

    validate_args(index, step)
}

fn validate_args(index: usize, step: &Map<String, Value>) -> Result<(), ValidationError> {
    match step.get(fields::ARGS) {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ValidationError::step(
            index,
            fields::ARGS,
            format!("step {index} args must be an object when present"),
        )),
    }
}

/// Validates a lesson that is already typed
///
/// Presence and types are guaranteed by construction, so only the value
/// constraints remain.
pub fn validate_definition(lesson: &LessonDefinition) -> Result<(), ValidationError> {
    if lesson.lesson_id.is_empty() {
        return Err(ValidationError::lesson(
            fields::LESSON_ID,
            "lesson_id must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_lesson() -> Value {
        json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [
                {"step_id": "s1", "instruction_text": "say hi", "command": "SPEAK", "args": {"text": "hi"}},
                {"step_id": "s2", "instruction_text": "pause", "command": "WAIT"}
            ]
        })
    }

    #[test]
    fn test_accepts_valid_lesson() {
        assert!(validate_lesson(&valid_lesson()).is_ok());
    }

    #[test]
    fn test_accepts_empty_steps() {
        let lesson = json!({"lesson_id": "l1", "title": "Empty", "steps": []});
        assert!(validate_lesson(&lesson).is_ok());
    }

    #[test]
    fn test_rejects_non_object() {
        let err = validate_lesson(&json!(["not", "a", "lesson"])).unwrap_err();
        assert_eq!(err.step_index, None);
        assert_eq!(err.location(), "lesson");
    }

    #[test]
    fn test_reports_first_missing_top_level_field() {
        for field in ["lesson_id", "title", "steps"] {
            let mut lesson = valid_lesson();
            lesson.as_object_mut().unwrap().remove(field);
            let err = validate_lesson(&lesson).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.step_index, None);
        }
    }

    #[test]
    fn test_steps_must_be_array() {
        let lesson = json!({"lesson_id": "l1", "title": "Intro", "steps": {"s1": {}}});
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.field, "steps");
    }

    #[test]
    fn test_reports_step_index_and_field() {
        let mut lesson = valid_lesson();
        lesson["steps"][1].as_object_mut().unwrap().remove("command");
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.step_index, Some(1));
        assert_eq!(err.field, "command");
    }

    #[test]
    fn test_first_violation_wins() {
        let lesson = json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [
                {"step_id": "s1", "command": "SPEAK"},
                "not-a-step"
            ]
        });
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.step_index, Some(0));
        assert_eq!(err.field, "instruction_text");
    }

    #[test]
    fn test_rejects_non_object_step() {
        let lesson = json!({"lesson_id": "l1", "title": "Intro", "steps": [42]});
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.step_index, Some(0));
        assert_eq!(err.location(), "steps[0]");
    }

    #[test]
    fn test_rejects_empty_lesson_id() {
        let lesson = json!({"lesson_id": "", "title": "Intro", "steps": []});
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.field, "lesson_id");

        let typed = LessonDefinition::new("", "Intro", vec![]);
        assert!(validate_definition(&typed).is_err());
    }

    #[test]
    fn test_rejects_scalar_args() {
        let lesson = json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [{"step_id": "s1", "instruction_text": "x", "command": "WAIT", "args": 3}]
        });
        let err = validate_lesson(&lesson).unwrap_err();
        assert_eq!(err.field, "args");
        assert_eq!(err.step_index, Some(0));
    }

    #[test]
    fn test_extra_params_field_is_ignored() {
        let lesson = json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [{"step_id": "s1", "instruction_text": "x", "command": "WAIT", "params": "note"}]
        });
        assert!(validate_lesson(&lesson).is_ok());
    }

    #[test]
    fn test_params_beside_args_still_deserializes() {
        let lesson = json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [{
                "step_id": "s1",
                "instruction_text": "x",
                "command": "WAIT",
                "args": {"seconds": 1},
                "params": {"seconds": 9}
            }]
        });
        assert!(validate_lesson(&lesson).is_ok());

        let typed = LessonDefinition::from_value(lesson).unwrap();
        assert_eq!(typed.steps[0].args.get("seconds"), Some(&json!(1)));
    }

    #[test]
    fn test_params_is_not_read_as_args() {
        let lesson = json!({
            "lesson_id": "l1",
            "title": "Intro",
            "steps": [{"step_id": "s1", "instruction_text": "x", "command": "WAIT", "params": {"seconds": 5}}]
        });

        let typed = LessonDefinition::from_value(lesson).unwrap();
        assert!(typed.steps[0].args.is_empty());
    }
}
