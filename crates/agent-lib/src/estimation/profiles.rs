//! Instance power profiles
//!
//! Maps an instance class to its idle power draw and the multiplier that
//! yields its full-load power. Unknown classes resolve to a fallback profile.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Idle power of the fallback profile in watts
pub const FALLBACK_BASE_WATTS: f64 = 5.0;

/// Full-load multiplier applied when a class does not specify one
pub const DEFAULT_SCALE_MULTIPLIER: f64 = 2.5;

/// Power characteristics of an instance class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerProfile {
    /// Power draw at 0% CPU
    pub base_watts: f64,
    /// Full-load power is `base_watts * scale_multiplier`
    #[serde(default = "default_scale_multiplier")]
    pub scale_multiplier: f64,
}

fn default_scale_multiplier() -> f64 {
    DEFAULT_SCALE_MULTIPLIER
}

impl PowerProfile {
    pub const FALLBACK: PowerProfile = PowerProfile {
        base_watts: FALLBACK_BASE_WATTS,
        scale_multiplier: DEFAULT_SCALE_MULTIPLIER,
    };

    /// Profile with the default multiplier
    pub fn with_base(base_watts: f64) -> Self {
        Self {
            base_watts,
            scale_multiplier: DEFAULT_SCALE_MULTIPLIER,
        }
    }

    pub fn max_watts(&self) -> f64 {
        self.base_watts * self.scale_multiplier
    }
}

/// Lookup table of power profiles by instance class
#[derive(Debug, Clone)]
pub struct PowerProfileTable {
    profiles: HashMap<String, PowerProfile>,
    fallback: PowerProfile,
}

impl Default for PowerProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PowerProfileTable {
    /// Empty table; every lookup resolves to the fallback profile
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
            fallback: PowerProfile::FALLBACK,
        }
    }

    /// Table with the approximate figures for burstable classes
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (class, base) in [
            ("t2.micro", 2.0),
            ("t2.small", 4.0),
            ("t2.medium", 8.0),
            ("t3.micro", 2.0),
            ("t3.small", 4.0),
            ("t3.medium", 8.0),
        ] {
            table.insert(class, PowerProfile::with_base(base));
        }
        table
    }

    /// Add or replace a profile
    pub fn insert(&mut self, instance_class: impl Into<String>, profile: PowerProfile) {
        self.profiles.insert(instance_class.into(), profile);
    }

    /// Overlay configured profiles on top of this table
    pub fn with_overrides(mut self, overrides: HashMap<String, PowerProfile>) -> Self {
        self.profiles.extend(overrides);
        self
    }

    /// Exact-match lookup without fallback
    pub fn get(&self, instance_class: &str) -> Option<&PowerProfile> {
        self.profiles.get(instance_class)
    }

    /// Exact match, else the fallback profile
    pub fn resolve(&self, instance_class: &str) -> PowerProfile {
        self.get(instance_class).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> PowerProfile {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let table = PowerProfileTable::builtin();

        assert_eq!(table.len(), 6);
        assert_eq!(table.resolve("t3.medium").base_watts, 8.0);
        assert_eq!(table.resolve("t3.medium").max_watts(), 20.0);
        assert_eq!(table.resolve("t2.micro").base_watts, 2.0);
    }

    #[test]
    fn test_resolve_unknown_class_uses_fallback() {
        let table = PowerProfileTable::builtin();

        assert!(table.get("m5.large").is_none());
        let profile = table.resolve("m5.large");
        assert_eq!(profile, PowerProfile::FALLBACK);
        assert_eq!(profile.max_watts(), 12.5);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let table = PowerProfileTable::builtin();
        assert_eq!(table.resolve("T3.MEDIUM"), PowerProfile::FALLBACK);
        assert_eq!(table.resolve("t3.medium "), PowerProfile::FALLBACK);
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "t3.medium".to_string(),
            PowerProfile {
                base_watts: 10.0,
                scale_multiplier: 3.0,
            },
        );
        overrides.insert("m5.large".to_string(), PowerProfile::with_base(20.0));

        let table = PowerProfileTable::builtin().with_overrides(overrides);

        assert_eq!(table.resolve("t3.medium").max_watts(), 30.0);
        assert_eq!(table.resolve("m5.large").max_watts(), 50.0);
        assert_eq!(table.resolve("t2.small").base_watts, 4.0);
    }

    #[test]
    fn test_profile_deserializes_with_default_multiplier() {
        let profile: PowerProfile = serde_json::from_str(r#"{"base_watts": 12.0}"#).unwrap();
        assert_eq!(profile.scale_multiplier, DEFAULT_SCALE_MULTIPLIER);
    }
}
