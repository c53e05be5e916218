use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The external form-value store the publish wizard submits from. Field
/// editors push serialized snapshots here; nothing in the store points
/// back at live editor state.
#[derive(Debug, Default)]
pub struct FormValues {
    values: BTreeMap<String, JsonValue>,
}

impl FormValues {
    pub fn set(&mut self, name: impl Into<String>, value: JsonValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    /// The whole store as one JSON object, the shape read at submit time.
    pub fn to_json(&self) -> JsonValue {
        let map: serde_json::Map<String, JsonValue> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        JsonValue::Object(map)
    }
}

/// Single-threaded shared handle; every mutation happens synchronously
/// inside one event handler, so a plain `RefCell` is enough.
pub type SharedFormValues = Rc<RefCell<FormValues>>;

pub fn shared() -> SharedFormValues {
    Rc::new(RefCell::new(FormValues::default()))
}
