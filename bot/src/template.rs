//! Template rendering for target fields
//!
//! Environment, description and payload strings in the config file may
//! reference the deploy parameters, e.g. `pr-{{ pr }}` or
//! `Deploying {{ short_sha }} to {{ target }}`.

use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;

use crate::errors::BotError;

/// Renders config templates against a parameter bag
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Templates written for PR deploys must still render on push deploys
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        Self { env }
    }

    /// Render a single template string
    pub fn render_str(&self, template: &str, params: &Value) -> Result<String, BotError> {
        if !template.contains("{{") && !template.contains("{%") {
            return Ok(template.to_string());
        }
        Ok(self.env.render_str(template, params)?)
    }

    /// Render every string leaf of a structured value, keeping its shape
    pub fn render_value(&self, value: &Value, params: &Value) -> Result<Value, BotError> {
        let rendered = match value {
            Value::String(s) => Value::String(self.render_str(s, params)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item, params))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.render_value(item, params)?);
                }
                Value::Object(out)
            }
            other => other.clone(),
        };
        Ok(rendered)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_str() {
        let renderer = TemplateRenderer::new();
        let params = json!({"pr": 12, "short_sha": "abcdef1"});
        assert_eq!(renderer.render_str("pr-{{ pr }}", &params).unwrap(), "pr-12");
        assert_eq!(renderer.render_str("plain", &params).unwrap(), "plain");
    }

    #[test]
    fn test_render_missing_pull_request_is_empty() {
        let renderer = TemplateRenderer::new();
        let params = json!({"ref": "refs/heads/main"});
        assert_eq!(
            renderer
                .render_str("env-{{ pull_request.number }}", &params)
                .unwrap(),
            "env-"
        );
    }

    #[test]
    fn test_render_value_keeps_shape() {
        let renderer = TemplateRenderer::new();
        let params = json!({"target": "prod", "pr": 3});
        let payload = json!({
            "name": "{{ target }}",
            "replicas": 2,
            "hosts": ["pr{{ pr }}.example.com", "static"],
            "nested": {"flag": true}
        });
        assert_eq!(
            renderer.render_value(&payload, &params).unwrap(),
            json!({
                "name": "prod",
                "replicas": 2,
                "hosts": ["pr3.example.com", "static"],
                "nested": {"flag": true}
            })
        );
    }

    #[test]
    fn test_render_syntax_error() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render_str("{{ unclosed", &json!({}));
        assert!(matches!(result, Err(BotError::TemplateError(_))));
    }
}
