use crate::error::{LessonError, Result};
use crate::validation;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Command-specific arguments passed verbatim to a handler
pub type HandlerArgs = Map<String, Value>;

/// Treat an explicit `null` the same as an omitted `args` object
fn deserialize_args<'de, D>(deserializer: D) -> std::result::Result<HandlerArgs, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HandlerArgs>::deserialize(deserializer)?.unwrap_or_default())
}

/// An ordered, named sequence of instruction steps
///
/// Owned by the caller; the runner only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDefinition {
    pub lesson_id: String,
    pub title: String,
    pub steps: Vec<Step>,
}

/// One instruction in a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: String,
    pub instruction_text: String,
    pub command: String,
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: HandlerArgs,
}

impl Step {
    pub fn new(
        step_id: impl Into<String>,
        instruction_text: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            instruction_text: instruction_text.into(),
            command: command.into(),
            args: HandlerArgs::new(),
        }
    }

    /// Attach arguments from a JSON object; non-object values are ignored
    pub fn with_args(mut self, args: Value) -> Self {
        if let Value::Object(map) = args {
            self.args = map;
        }
        self
    }
}

impl LessonDefinition {
    pub fn new(lesson_id: impl Into<String>, title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            lesson_id: lesson_id.into(),
            title: title.into(),
            steps,
        }
    }

    /// Validate an untyped document and convert it into a typed lesson
    pub fn from_value(document: Value) -> Result<Self> {
        validation::validate_lesson(&document)?;
        Ok(serde_json::from_value(document)?)
    }

    /// Parse, validate and convert a JSON lesson document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_value(document)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Read a lesson document from disk
pub fn load_lesson(path: impl AsRef<Path>) -> Result<LessonDefinition> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| LessonError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    LessonDefinition::from_json_str(&contents)
}

/// Outcome status reported by every handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerStatus {
    Ok,
    Queued,
    Disabled,
    NoText,
    TooLong,
    Error,
}

impl std::fmt::Display for HandlerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Queued => write!(f, "queued"),
            Self::Disabled => write!(f, "disabled"),
            Self::NoText => write!(f, "no_text"),
            Self::TooLong => write!(f, "too_long"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result mapping returned by a handler: a mandatory `status` plus free-form details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResult {
    pub status: HandlerStatus,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HandlerResult {
    pub fn new(status: HandlerStatus) -> Self {
        Self {
            status,
            details: Map::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(HandlerStatus::Ok)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Render as the flat `{ "status": ..., ... }` mapping
    pub fn to_value(&self) -> Value {
        let mut map = self.details.clone();
        map.insert("status".to_string(), Value::String(self.status.to_string()));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_str_reads_args() {
        let lesson = LessonDefinition::from_json_str(
            r#"{
                "lesson_id": "l1",
                "title": "Intro",
                "steps": [
                    {"step_id": "s1", "instruction_text": "say hi", "command": "SPEAK", "args": {"text": "hi"}},
                    {"step_id": "s2", "instruction_text": "pause", "command": "WAIT", "args": {"seconds": 0.1}},
                    {"step_id": "s3", "instruction_text": "look", "command": "UI_HIGHLIGHT", "args": null}
                ]
            }"#,
        )
        .expect("lesson should parse");

        assert_eq!(lesson.step_count(), 3);
        assert_eq!(lesson.steps[0].args.get("text"), Some(&json!("hi")));
        assert_eq!(lesson.steps[1].args.get("seconds"), Some(&json!(0.1)));
        assert!(lesson.steps[2].args.is_empty());
    }

    #[test]
    fn test_from_json_str_rejects_malformed_json() {
        let err = LessonDefinition::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, LessonError::Parse(_)));
    }

    #[test]
    fn test_from_value_runs_validation_first() {
        let err = LessonDefinition::from_value(json!({"lesson_id": "l1", "steps": []})).unwrap_err();
        match err {
            LessonError::Validation(v) => assert_eq!(v.field, "title"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_handler_result_flattens_status() {
        let result = HandlerResult::new(HandlerStatus::TooLong).with_detail("length", 2001);
        assert_eq!(result.to_value(), json!({"status": "too_long", "length": 2001}));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"status": "too_long", "length": 2001})
        );
    }

    #[test]
    fn test_load_lesson_reports_missing_file() {
        let err = load_lesson("/nonexistent/lesson.json").unwrap_err();
        assert!(matches!(err, LessonError::Load { .. }));
    }
}
