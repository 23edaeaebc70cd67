use proptest::prelude::*;
use proptest::strategy::Just;
use serde_json::{json, Map, Value};

/// Strategy for generating identifiers
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Strategy for generating free-form instruction text
pub fn instruction_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?]{0,80}"
}

/// Strategy for generating command names, including unknown ones
pub fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SPEAK".to_string()),
        Just("WAIT".to_string()),
        Just("UI_HIGHLIGHT".to_string()),
        Just("RUN_OPERATOR".to_string()),
        "[A-Z_]{1,12}",
    ]
}

/// Strategy for generating optional args objects
pub fn args_strategy() -> impl Strategy<Value = Option<Value>> {
    prop::option::of(prop_oneof![
        Just(json!({})),
        Just(json!({"text": "hello"})),
        Just(json!({"seconds": 0})),
        Just(json!({"target": "VIEW3D_PT_tools"})),
        Just(json!({"operator": "mesh.primitive_cube_add", "params": {"size": 2}})),
        Just(Value::Null),
    ])
}

/// Strategy for generating a well-formed step document
pub fn step_document_strategy() -> impl Strategy<Value = Value> {
    (
        identifier_strategy(),
        instruction_strategy(),
        command_strategy(),
        args_strategy(),
    )
        .prop_map(|(step_id, instruction_text, command, args)| {
            let mut step = Map::new();
            step.insert("step_id".into(), Value::String(step_id));
            step.insert("instruction_text".into(), Value::String(instruction_text));
            step.insert("command".into(), Value::String(command));
            if let Some(args) = args {
                step.insert("args".into(), args);
            }
            Value::Object(step)
        })
}

/// Strategy for generating a well-formed lesson document
pub fn lesson_document_strategy() -> impl Strategy<Value = Value> {
    (
        identifier_strategy(),
        instruction_strategy(),
        prop::collection::vec(step_document_strategy(), 0..12),
    )
        .prop_map(|(lesson_id, title, steps)| {
            json!({ "lesson_id": lesson_id, "title": title, "steps": steps })
        })
}

/// Strategy for a lesson with one required lesson-level field removed
pub fn lesson_missing_field_strategy() -> impl Strategy<Value = (Value, &'static str)> {
    (
        lesson_document_strategy(),
        prop::sample::select(vec!["lesson_id", "title", "steps"]),
    )
        .prop_map(|(mut lesson, field)| {
            if let Some(object) = lesson.as_object_mut() {
                object.remove(field);
            }
            (lesson, field)
        })
}

/// Strategy for a lesson with one required step-level field removed from one step
pub fn step_missing_field_strategy() -> impl Strategy<Value = (Value, usize, &'static str)> {
    (
        identifier_strategy(),
        prop::collection::vec(step_document_strategy(), 1..8),
        any::<prop::sample::Index>(),
        prop::sample::select(vec!["step_id", "instruction_text", "command"]),
    )
        .prop_map(|(lesson_id, mut steps, index, field)| {
            let index = index.index(steps.len());
            if let Some(step) = steps[index].as_object_mut() {
                step.remove(field);
            }
            (
                json!({ "lesson_id": lesson_id, "title": "Generated", "steps": steps }),
                index,
                field,
            )
        })
}
