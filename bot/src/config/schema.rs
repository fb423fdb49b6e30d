//! JSON schema for the config file

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::{json, Value};

use crate::errors::BotError;

/// Schema applied after legacy normalization. Unknown properties are allowed.
pub fn config_schema() -> Value {
    let target_fields = json!({
        "task": {"type": "string"},
        "auto_merge": {"type": "boolean"},
        "payload": {},
        "environment": {"type": "string"},
        "description": {"type": "string"}
    });

    let mut properties = target_fields.clone();
    if let Some(map) = properties.as_object_mut() {
        map.insert("name".to_string(), json!({"type": "string"}));
        map.insert("auto_deploy_on".to_string(), json!({"type": "string"}));
        map.insert(
            "required_contexts".to_string(),
            json!({"type": "array", "items": {"type": "string"}}),
        );
        map.insert("transient_environment".to_string(), json!({"type": "boolean"}));
        map.insert("production_environment".to_string(), json!({"type": "boolean"}));
        map.insert(
            "deployments".to_string(),
            json!({"type": "array", "items": {"type": "object", "properties": target_fields}}),
        );
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": {
            "type": "object",
            "required": ["name"],
            "properties": properties
        }
    })
}

fn validator() -> Result<&'static Validator, BotError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| jsonschema::validator_for(&config_schema()).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| BotError::ConfigError(format!("invalid config schema: {e}")))
}

/// Validate a normalized config document, reporting the first violation
pub fn validate(config: &Value) -> Result<(), BotError> {
    let validator = validator()?;
    let mut errors = validator.iter_errors(config);
    match errors.next() {
        Some(first) => Err(BotError::ConfigInvalid {
            property: property_name(&first.instance_path.to_string()),
            message: first.to_string(),
        }),
        None => Ok(()),
    }
}

/// Turn a JSON pointer such as `/prod/task` into `prod.task`
fn property_name(pointer: &str) -> String {
    if pointer.is_empty() || pointer == "/" {
        return "config".to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
