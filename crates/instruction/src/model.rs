use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tree_store::{Attributes, DEFAULT_LABEL};

/// Wire shape of one instruction as assembled from the stream.
///
/// `arguments` is either a structured object or a JSON-encoded string (some
/// transports deliver tool-call arguments as raw text).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawInstruction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RawInstruction {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The closed set of tree operations. Routing is an exhaustive match, so a
/// new operation is a compile-time-checked enumeration change.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Create {
        parent_id: Option<String>,
        label: String,
        attributes: Attributes,
    },
    Update {
        target_id: String,
        attributes: Attributes,
    },
    SetText {
        target_id: String,
        text: String,
    },
    AppendText {
        target_id: String,
        text: String,
    },
    Remove {
        target_id: String,
    },
}

impl Instruction {
    /// Decode a raw instruction, parsing string-encoded arguments first.
    pub fn decode(raw: &RawInstruction) -> Result<Self, ValidationError> {
        let args = resolve_arguments(&raw.arguments)?;
        match raw.name.as_str() {
            "create" => Ok(Instruction::Create {
                parent_id: args
                    .get("parentId")
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
                label: decode_label(&args),
                attributes: optional_object(&args, "attributes"),
            }),
            "update" => Ok(Instruction::Update {
                target_id: required_str(&args, "update", "targetId")?,
                attributes: required_object(&args, "update", "attributes")?,
            }),
            "setText" => Ok(Instruction::SetText {
                target_id: required_str(&args, "setText", "targetId")?,
                text: required_str(&args, "setText", "text")?,
            }),
            "appendText" => Ok(Instruction::AppendText {
                target_id: required_str(&args, "appendText", "targetId")?,
                text: required_str(&args, "appendText", "text")?,
            }),
            "remove" => Ok(Instruction::Remove {
                target_id: required_str(&args, "remove", "targetId")?,
            }),
            _ => Err(ValidationError::UnknownOperation {
                name: raw.name.clone(),
            }),
        }
    }
}

fn resolve_arguments(arguments: &Value) -> Result<Attributes, ValidationError> {
    match arguments {
        Value::Object(map) => Ok(map.clone()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ValidationError::BadArguments {
                detail: format!("expected an object, got {other}"),
            }),
            Err(err) => Err(ValidationError::BadArguments {
                detail: format!("arguments string is not valid JSON: {err}"),
            }),
        },
        // Absent arguments decode as an empty object; per-operation field
        // checks decide whether that is acceptable.
        Value::Null => Ok(Attributes::new()),
        other => Err(ValidationError::BadArguments {
            detail: format!("expected an object or string, got {other}"),
        }),
    }
}

/// A missing, empty or non-string label degrades to the generic container
/// label instead of rejecting the instruction; the stream cannot be asked to
/// resend a correction.
fn decode_label(args: &Attributes) -> String {
    match args.get("label").and_then(Value::as_str) {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => DEFAULT_LABEL.to_string(),
    }
}

fn required_str(
    args: &Attributes,
    operation: &'static str,
    field: &'static str,
) -> Result<String, ValidationError> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::BadArguments {
            detail: format!("{operation}.{field} must be a string, got {other}"),
        }),
        None => Err(ValidationError::MissingField { operation, field }),
    }
}

fn required_object(
    args: &Attributes,
    operation: &'static str,
    field: &'static str,
) -> Result<Attributes, ValidationError> {
    match args.get(field) {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(ValidationError::BadArguments {
            detail: format!("{operation}.{field} must be an object, got {other}"),
        }),
        None => Err(ValidationError::MissingField { operation, field }),
    }
}

fn optional_object(args: &Attributes, field: &str) -> Attributes {
    match args.get(field) {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            log::debug!(target: "dispatch", "ignoring non-object {field}: {other}");
            Attributes::new()
        }
        None => Attributes::new(),
    }
}
