//! Per-type customization registries for JSON rendering and decoding.
//!
//! Both registries are keyed by the Rust type they customize. A node keeps
//! one of each and hands a snapshot to every forwarding run; registries are
//! cheap to clone (entries are `Arc`s).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Rewrites the default JSON of a `T`.
pub type CustomSerializer<T> = Arc<dyn Fn(&T, Value) -> Value + Send + Sync>;

/// Adjusts a freshly decoded `T`, given the raw payload it came from.
pub type CustomParser<T> = Arc<dyn Fn(&Value, T) -> T + Send + Sync>;

#[derive(Clone, Default)]
struct TypeMap {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl TypeMap {
    fn insert<T: 'static, V: Any + Send + Sync>(&mut self, value: V) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
    }

    fn get<T: 'static, V: Any>(&self) -> Option<&V> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<V>())
    }

    fn remove<T: 'static>(&mut self) -> bool {
        self.entries.remove(&TypeId::of::<T>()).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Serializer overrides, one per type.
#[derive(Clone, Default)]
pub struct CustomSerializers {
    map: TypeMap,
}

impl CustomSerializers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the override for `T`.
    pub fn with<T, F>(mut self, f: F) -> Self
    where
        T: 'static,
        F: Fn(&T, Value) -> Value + Send + Sync + 'static,
    {
        self.set::<T, F>(f);
        self
    }

    pub fn set<T, F>(&mut self, f: F)
    where
        T: 'static,
        F: Fn(&T, Value) -> Value + Send + Sync + 'static,
    {
        let f: CustomSerializer<T> = Arc::new(f);
        self.map.insert::<T, _>(f);
    }

    pub fn remove<T: 'static>(&mut self) -> bool {
        self.map.remove::<T>()
    }

    /// Run the override for `T` on `json`, or return `json` unchanged.
    pub fn apply<T: 'static>(&self, value: &T, json: Value) -> Value {
        match self.map.get::<T, CustomSerializer<T>>() {
            Some(f) => f(value, json),
            None => json,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }
}

/// Post-decode hooks, one per request type.
#[derive(Clone, Default)]
pub struct CustomParsers {
    map: TypeMap,
}

impl CustomParsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T, F>(mut self, f: F) -> Self
    where
        T: 'static,
        F: Fn(&Value, T) -> T + Send + Sync + 'static,
    {
        let f: CustomParser<T> = Arc::new(f);
        self.map.insert::<T, _>(f);
        self
    }

    pub fn remove<T: 'static>(&mut self) -> bool {
        self.map.remove::<T>()
    }

    pub fn apply<T: 'static>(&self, raw: &Value, value: T) -> T {
        match self.map.get::<T, CustomParser<T>>() {
            Some(f) => f(raw, value),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    struct Probe(u32);

    #[test]
    fn override_only_applies_to_its_type() {
        let s = CustomSerializers::new().with::<Probe, _>(|p, mut json| {
            json["probe"] = json!(p.0);
            json
        });

        assert_eq!(s.apply(&Probe(7), json!({})), json!({ "probe": 7 }));
        assert_eq!(s.apply(&"other", json!({})), json!({}));
    }

    #[test]
    fn parser_hook_sees_raw_payload() {
        let p = CustomParsers::new().with::<String, _>(|raw, v| {
            format!("{v}:{}", raw["tag"].as_str().unwrap())
        });
        assert_eq!(p.apply(&json!({ "tag": "x" }), "v".to_string()), "v:x");
    }
}
