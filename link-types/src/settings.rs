//! The controller's interface settings document.
//!
//! The document is kept opaque so that a fetch-then-commit cycle sends back
//! everything the controller reported, including keys this crate does not
//! know about. Typed setters cover the realtime settings we negotiate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Interface settings as reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncSettings(Value);

impl SyncSettings {
    /// Wrap a raw settings document.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The raw settings document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the raw settings document.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Read a value by JSON pointer (e.g. `/if/live/timeout`).
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Apply gamma correction to realtime data.
    pub fn enable_realtime_gamma(&mut self) {
        self.set(&["if", "live", "no-gc"], Value::Bool(false));
    }

    /// Seconds after the last realtime packet before the controller resumes
    /// its own effects. Stored by the controller in tenths of a second.
    pub fn set_inactivity_timeout(&mut self, seconds: u8) {
        self.set(
            &["if", "live", "timeout"],
            Value::from(u32::from(seconds) * 10),
        );
    }

    /// Listen on the first E1.31 universe.
    pub fn first_universe(&mut self) {
        self.set(&["if", "live", "dmx", "uni"], Value::from(1));
    }

    /// Start at the first DMX address.
    pub fn first_dmx_address(&mut self) {
        self.set(&["if", "live", "dmx", "addr"], Value::from(0));
    }

    /// Map DMX channels as consecutive RGB triplets (multi-RGB mode).
    pub fn multirgb_dmx_mode(&mut self) {
        self.set(&["if", "live", "dmx", "mode"], Value::from(4));
    }

    fn set(&mut self, path: &[&str], value: Value) {
        let Some((leaf, parents)) = path.split_last() else {
            return;
        };
        let mut node = &mut self.0;
        for key in parents {
            node = object_mut(node)
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        object_mut(node).insert(leaf.to_string(), value);
    }
}

/// Coerce `value` into an object, replacing any non-object value.
fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setters_create_missing_sections() {
        let mut settings = SyncSettings::default();
        settings.enable_realtime_gamma();
        settings.set_inactivity_timeout(3);
        settings.first_universe();
        settings.first_dmx_address();
        settings.multirgb_dmx_mode();

        assert_eq!(settings.get("/if/live/no-gc"), Some(&json!(false)));
        assert_eq!(settings.get("/if/live/timeout"), Some(&json!(30)));
        assert_eq!(settings.get("/if/live/dmx/uni"), Some(&json!(1)));
        assert_eq!(settings.get("/if/live/dmx/addr"), Some(&json!(0)));
        assert_eq!(settings.get("/if/live/dmx/mode"), Some(&json!(4)));
    }

    #[test]
    fn setters_preserve_unrelated_keys() {
        let mut settings = SyncSettings::from_value(json!({
            "id": {"name": "WLED"},
            "if": {"live": {"en": true, "port": 5568}}
        }));
        settings.set_inactivity_timeout(1);

        assert_eq!(settings.get("/id/name"), Some(&json!("WLED")));
        assert_eq!(settings.get("/if/live/en"), Some(&json!(true)));
        assert_eq!(settings.get("/if/live/port"), Some(&json!(5568)));
        assert_eq!(settings.get("/if/live/timeout"), Some(&json!(10)));
    }

    #[test]
    fn serializes_transparently() {
        let settings = SyncSettings::from_value(json!({"if": {}}));
        assert_eq!(serde_json::to_string(&settings).unwrap(), r#"{"if":{}}"#);
    }
}
