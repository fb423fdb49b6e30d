//! Config file loading, legacy normalization and validation

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::config::schema;
use crate::config::target::Target;
use crate::context::EventContext;
use crate::errors::BotError;

/// Location of the config file in every repository
pub const CONFIG_PATH: &str = ".github/deploy.yml";

/// Fields of the legacy `deployments[0]` entry that seed unset target fields
const LEGACY_FIELDS: [&str; 5] = ["task", "auto_merge", "payload", "environment", "description"];

/// Validated targets keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    targets: BTreeMap<String, Target>,
}

impl Config {
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets whose `auto_deploy_on` matches the given ref
    pub fn auto_deploy_targets<'a>(&'a self, git_ref: &'a str) -> impl Iterator<Item = &'a Target> {
        self.targets().filter(move |target| target.deploys_on(git_ref))
    }
}

/// Fetch and resolve the config at `git_ref`, or at the default branch when
/// no ref is given
pub async fn resolve_config(ctx: &EventContext, git_ref: Option<&str>) -> Result<Config, BotError> {
    let source = ctx
        .github
        .get_file_content(&ctx.repo, CONFIG_PATH, git_ref)
        .await?
        .ok_or_else(|| {
            BotError::ConfigNotFound(format!(
                "{} in {} at {}",
                CONFIG_PATH,
                ctx.repo,
                git_ref.unwrap_or("default branch")
            ))
        })?;

    let config = parse_config(&source)?;
    debug!(
        "Resolved {} targets for {} at {}",
        config.len(),
        ctx.repo,
        git_ref.unwrap_or("default branch")
    );
    Ok(config)
}

/// Parse, normalize and validate config file text
pub fn parse_config(source: &str) -> Result<Config, BotError> {
    let raw = parse_yaml(source)?;
    let normalized = normalize_config(raw);
    schema::validate(&normalized)?;
    let targets: BTreeMap<String, Target> = serde_json::from_value(normalized)?;
    Ok(Config { targets })
}

fn parse_yaml(source: &str) -> Result<Value, BotError> {
    if source.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let value: Value = serde_yaml_ng::from_str(source).map_err(|e| BotError::ConfigInvalid {
        property: CONFIG_PATH.to_string(),
        message: e.to_string(),
    })?;
    match value {
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        other => Ok(other),
    }
}

/// Normalize every top-level entry. Non-mapping documents are returned as is
/// and rejected by the schema.
pub fn normalize_config(mut config: Value) -> Value {
    if let Some(entries) = config.as_object_mut() {
        for (name, entry) in entries.iter_mut() {
            normalize_entry(name, entry);
        }
    }
    config
}

/// Fold a legacy `deployments` list into the entry and set `name` to the key.
/// Applying this twice gives the same result as applying it once.
pub fn normalize_entry(name: &str, entry: &mut Value) {
    let Some(fields) = entry.as_object_mut() else {
        return;
    };

    if fields.get("deployments").is_some_and(Value::is_array) {
        if let Some(Value::Array(legacy)) = fields.remove("deployments") {
            if let Some(Value::Object(first)) = legacy.into_iter().next() {
                for field in LEGACY_FIELDS {
                    let unset = fields.get(field).is_none_or(Value::is_null);
                    if let (true, Some(value)) = (unset, first.get(field)) {
                        fields.insert(field.to_string(), value.clone());
                    }
                }
            }
        }
    }

    fields.insert("name".to_string(), Value::String(name.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_fields_fill_unset() {
        let mut entry = json!({
            "environment": "staging",
            "deployments": [
                {"task": "deploy:migrate", "environment": "legacy", "payload": {"a": 1}},
                {"task": "ignored"}
            ]
        });
        normalize_entry("web", &mut entry);
        assert_eq!(
            entry,
            json!({
                "name": "web",
                "environment": "staging",
                "task": "deploy:migrate",
                "payload": {"a": 1}
            })
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "web": {
                "auto_merge": null,
                "deployments": [{"auto_merge": true, "description": "from legacy"}]
            },
            "api": {"name": "wrong", "task": "deploy"},
            "broken": "not a mapping"
        });
        let once = normalize_config(raw);
        let twice = normalize_config(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once["web"]["auto_merge"], json!(true));
        assert_eq!(once["api"]["name"], json!("api"));
    }

    #[test]
    fn test_empty_legacy_list_is_discarded() {
        let mut entry = json!({"deployments": []});
        normalize_entry("web", &mut entry);
        assert_eq!(entry, json!({"name": "web"}));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_config("").unwrap().is_empty());
        assert!(parse_config("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_sets_names() {
        let config = parse_config(
            "prod:\n  environment: production\n  auto_deploy_on: refs/heads/main\nstaging:\n  name: other\n",
        )
        .unwrap();
        assert_eq!(config.len(), 2);
        for name in config.names() {
            assert_eq!(config.get(name).unwrap().name, name);
        }
    }

    #[test]
    fn test_parse_invalid_type() {
        let err = parse_config("prod:\n  required_contexts: ci\n").unwrap_err();
        match err {
            BotError::ConfigInvalid { property, .. } => assert_eq!(property, "prod.required_contexts"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_yaml_syntax_error() {
        let err = parse_config("prod: [unclosed\n").unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { property, .. } if property == CONFIG_PATH));
    }

    #[test]
    fn test_auto_deploy_targets() {
        let config = parse_config(
            "prod:\n  auto_deploy_on: refs/heads/main\nstaging:\n  auto_deploy_on: refs/heads/develop\nmanual: {}\n",
        )
        .unwrap();
        let matched: Vec<_> = config
            .auto_deploy_targets("refs/heads/main")
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(matched, vec!["prod"]);
    }
}
