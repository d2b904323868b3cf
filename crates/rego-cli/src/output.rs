//! JSON rendering of parse results.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{config::OutputConfig, error::CliError};

/// Collects parse results keyed by input name and renders them as one JSON
/// document.
#[derive(Debug, Default)]
pub struct JsonReport {
    entries: Map<String, Value>,
}

impl JsonReport {
    /// Add the result for one input.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: &impl Serialize,
    ) -> Result<(), CliError> {
        self.entries.insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Render the report as configured.
    pub fn render(self, config: &OutputConfig) -> Result<String, CliError> {
        render(Value::Object(self.entries), config)
    }
}

/// Render a single value as configured.
pub fn render(mut value: Value, config: &OutputConfig) -> Result<String, CliError> {
    if !config.locations {
        strip_locations(&mut value);
    }
    let text = if config.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

/// Remove every `location` member, at any depth.
fn strip_locations(value: &mut Value) {
    match value {
        Value::Object(members) => {
            members.remove("location");
            members.values_mut().for_each(strip_locations);
        }
        Value::Array(elements) => elements.iter_mut().for_each(strip_locations),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(pretty: bool, locations: bool) -> OutputConfig {
        OutputConfig { pretty, locations }
    }

    #[test]
    fn test_strip_locations_at_any_depth() {
        let value = json!({
            "type": "ref",
            "location": {"row": 1},
            "value": [{"type": "var", "value": "x", "location": {"row": 1}}]
        });
        let text = render(value, &config(false, false)).unwrap();
        assert_eq!(text, r#"{"type":"ref","value":[{"type":"var","value":"x"}]}"#);
    }

    #[test]
    fn test_locations_kept_by_default() {
        let value = json!({"location": {"row": 2}});
        let text = render(value, &OutputConfig::default()).unwrap();
        assert!(text.contains("\"row\": 2"));
    }

    #[test]
    fn test_report_is_keyed_by_name() {
        let mut report = JsonReport::default();
        report.insert("b.rego", &vec![1, 2]).unwrap();
        report.insert("a.rego", &Vec::<u8>::new()).unwrap();
        assert_eq!(report.len(), 2);

        let text = report.render(&config(false, true)).unwrap();
        assert_eq!(text, r#"{"a.rego":[],"b.rego":[1,2]}"#);
    }
}
