use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use crate::parameter::{normalize_name, Parameter, ParameterValue, Validity};
use crate::{Error, Result};

/// Latest value of every known parameter, keyed by upper-case name.
///
/// All reads and writes go through one lock so a multi-parameter read is a consistent
/// snapshot.
#[derive(Debug, Default)]
pub struct ParameterStore {
    params: RwLock<HashMap<String, Parameter>>,
}

impl ParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Parameter> {
        let params = self.params.read().unwrap_or_else(PoisonError::into_inner);
        params.get(&normalize_name(name)).cloned()
    }

    /// Like [ParameterStore::get], but a missing parameter is an error.
    ///
    /// # Errors
    /// [Error::ParameterNotFound] if `name` is not known.
    pub fn require(&self, name: &str) -> Result<Parameter> {
        self.get(name)
            .ok_or_else(|| Error::ParameterNotFound(normalize_name(name)))
    }

    /// Insert or overwrite `name`. The stored parameter takes the normalized name.
    pub fn set(&self, name: &str, parameter: Parameter) {
        self.set_many(vec![(name.to_string(), parameter)]);
    }

    /// Insert or overwrite several parameters under a single lock acquisition.
    pub fn set_many(&self, parameters: Vec<(String, Parameter)>) {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        for (name, mut parameter) in parameters {
            let name = normalize_name(&name);
            parameter.name.clone_from(&name);
            params.insert(name, parameter);
        }
    }

    /// Snapshot of every parameter, ordered by name.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, Parameter> {
        let params = self.params.read().unwrap_or_else(PoisonError::into_inner);
        params
            .iter()
            .map(|(name, param)| (name.clone(), param.clone()))
            .collect()
    }

    /// Look up `names` in order, with one entry per requested name.
    #[must_use]
    pub fn get_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, Option<Parameter>)> {
        let params = self.params.read().unwrap_or_else(PoisonError::into_inner);
        names
            .iter()
            .map(|name| {
                let name = normalize_name(name.as_ref());
                let found = params.get(&name).cloned();
                (name, found)
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of parameters currently flagged valid.
    #[must_use]
    pub fn count_valid(&self) -> usize {
        let params = self.params.read().unwrap_or_else(PoisonError::into_inner);
        params
            .values()
            .filter(|p| p.validity == Validity::Valid)
            .count()
    }

    /// Populate the bus parameters a freshly started ground station advertises.
    pub fn seed_samples(&self) {
        let now = Utc::now();
        let samples: [(&str, ParameterValue, &str); 5] = [
            ("TEMPERATURE_BUS", 25.5.into(), "C"),
            ("VOLTAGE_BUS", 12.3.into(), "V"),
            ("CURRENT_BUS", 2.5.into(), "A"),
            ("MODE_SELECTION", "SAFE_MODE".into(), ""),
            ("BATTERY_CHARGE", ParameterValue::Integer(85), "%"),
        ];
        self.set_many(
            samples
                .into_iter()
                .map(|(name, value, units)| {
                    let mut param = Parameter::new(name, value, now).with_source("initial");
                    if !units.is_empty() {
                        param = param.with_units(units);
                    }
                    (name.to_string(), param)
                })
                .collect(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Quality;

    fn param(name: &str, value: f64) -> Parameter {
        Parameter::new(name, ParameterValue::Float(value), Utc::now())
    }

    #[test]
    fn names_are_case_insensitive() {
        let store = ParameterStore::new();
        store.set("temp_bus", param("temp_bus", 21.0));

        let found = store.get("TEMP_BUS").unwrap();
        assert_eq!(found.name, "TEMP_BUS");
        assert_eq!(found.value, Some(ParameterValue::Float(21.0)));
        assert_eq!(store.get("Temp_Bus"), Some(found));
    }

    #[test]
    fn set_overwrites() {
        let store = ParameterStore::new();
        store.set("A", param("A", 1.0));
        store.set("a", param("a", 2.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("A").unwrap().value, Some(ParameterValue::Float(2.0)));
    }

    #[test]
    fn get_many_preserves_order() {
        let store = ParameterStore::new();
        store.set("a", param("a", 1.0));
        store.set("b", param("b", 2.0));

        let got = store.get_many(&["b", "missing", "a"]);
        let names: Vec<&str> = got.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["B", "MISSING", "A"]);
        assert!(got[0].1.is_some());
        assert!(got[1].1.is_none());
        assert!(got[2].1.is_some());
    }

    #[test]
    fn require_missing() {
        let store = ParameterStore::new();
        let err = store.require("nope").unwrap_err();
        assert!(matches!(err, Error::ParameterNotFound(ref name) if name == "NOPE"), "got {err:?}");
    }

    #[test]
    fn seeded_samples() {
        let store = ParameterStore::new();
        store.seed_samples();

        assert_eq!(store.len(), 5);
        assert_eq!(store.count_valid(), 5);
        let mode = store.get("mode_selection").unwrap();
        assert_eq!(mode.value, Some(ParameterValue::String("SAFE_MODE".into())));
        assert_eq!(mode.units, None);
        let charge = store.get("BATTERY_CHARGE").unwrap();
        assert_eq!(charge.value, Some(ParameterValue::Integer(85)));
        assert_eq!(charge.units.as_deref(), Some("%"));
        assert_eq!(charge.quality, Quality::Good);
    }

    #[test]
    fn concurrent_writers() {
        let store = std::sync::Arc::new(ParameterStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(&format!("P{t}_{i}"), param("x", f64::from(i)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 400);
        assert_eq!(store.get_all().len(), 400);
    }
}
