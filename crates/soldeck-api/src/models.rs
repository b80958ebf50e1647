// Wire models for the Home Assistant REST API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// State value Home Assistant reports for an entity that exists but
/// currently has no reachable backing device.
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// State value for an entity whose value has never been set.
pub const STATE_UNKNOWN: &str = "unknown";

/// A single entity state as returned by `GET /api/states/{entity_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    /// The raw state value. Always a string on the wire, even for
    /// numeric sensors.
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntityState {
    /// The `unit_of_measurement` attribute, if the entity declares one.
    pub fn unit(&self) -> Option<&str> {
        self.attributes.get("unit_of_measurement").and_then(Value::as_str)
    }

    /// Whether the entity currently carries a usable value.
    ///
    /// `unavailable` and `unknown` are reserved state values, not data.
    pub fn is_available(&self) -> bool {
        self.state != STATE_UNAVAILABLE && self.state != STATE_UNKNOWN
    }
}

/// One domain's worth of registered services, as returned by
/// `GET /api/services`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDomain {
    pub domain: String,
    /// Service name → field description. Only the keys matter to us.
    #[serde(default)]
    pub services: Map<String, Value>,
}

impl ServiceDomain {
    /// The registered service names within this domain.
    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state(value: &str, unit: Option<&str>) -> EntityState {
        let mut attributes = Map::new();
        if let Some(u) = unit {
            attributes.insert("unit_of_measurement".into(), Value::String(u.into()));
        }
        EntityState {
            entity_id: "sensor.test".into(),
            state: value.into(),
            attributes,
            last_updated: None,
        }
    }

    #[test]
    fn unit_comes_from_attributes() {
        assert_eq!(state("42", Some("W")).unit(), Some("W"));
        assert_eq!(state("42", None).unit(), None);
    }

    #[test]
    fn reserved_states_are_unavailable() {
        assert!(state("1250.4", None).is_available());
        assert!(!state(STATE_UNAVAILABLE, None).is_available());
        assert!(!state(STATE_UNKNOWN, None).is_available());
    }
}
