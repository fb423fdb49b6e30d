//! Deployment targets

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::strip_refs_prefix;

/// A named deployment profile from `.github/deploy.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Key of the entry in the config file
    pub name: String,

    /// Ref that triggers an automatic deploy, e.g. `refs/heads/main`
    #[serde(default)]
    pub auto_deploy_on: Option<String>,

    #[serde(default)]
    pub auto_merge: bool,

    #[serde(default = "default_task")]
    pub task: String,

    /// Arbitrary payload; string leaves are templates
    #[serde(default = "default_payload")]
    pub payload: Value,

    /// Environment name template
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Description template
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required_contexts: Vec<String>,

    #[serde(default)]
    pub transient_environment: bool,

    #[serde(default)]
    pub production_environment: bool,
}

fn default_task() -> String {
    "deploy".to_string()
}

fn default_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_environment() -> String {
    "production".to_string()
}

impl Target {
    /// Whether a push or check on `git_ref` should auto-deploy this target.
    /// A leading `refs/` is ignored on both sides.
    pub fn deploys_on(&self, git_ref: &str) -> bool {
        self.auto_deploy_on
            .as_deref()
            .is_some_and(|on| strip_refs_prefix(on) == strip_refs_prefix(git_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let target: Target = serde_json::from_value(json!({"name": "prod"})).unwrap();
        assert_eq!(target.task, "deploy");
        assert_eq!(target.environment, "production");
        assert_eq!(target.payload, json!({}));
        assert!(!target.auto_merge);
        assert!(target.required_contexts.is_empty());
        assert!(!target.transient_environment);
        assert!(!target.production_environment);
        assert!(target.description.is_none());
    }

    #[test]
    fn test_deploys_on() {
        let target: Target = serde_json::from_value(json!({
            "name": "prod",
            "auto_deploy_on": "refs/heads/main"
        }))
        .unwrap();
        assert!(target.deploys_on("refs/heads/main"));
        assert!(target.deploys_on("heads/main"));
        assert!(!target.deploys_on("refs/heads/main-2"));
        assert!(!target.deploys_on("refs/heads/develop"));
    }

    #[test]
    fn test_no_auto_deploy_without_ref() {
        let target: Target = serde_json::from_value(json!({"name": "prod"})).unwrap();
        assert!(!target.deploys_on("refs/heads/main"));
    }
}
