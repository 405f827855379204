//! Regional carbon intensity and renewable share tables

use std::collections::HashMap;

/// Carbon intensity (gCO2/kWh) used for regions missing from the table
pub const FALLBACK_CARBON_FACTOR: f64 = 500.0;

/// Renewable share (percent) used for regions missing from the table
pub const FALLBACK_RENEWABLE_PERCENTAGE: f64 = 30.0;

/// Carbon intensity in grams CO2 per kWh, by region code
#[derive(Debug, Clone)]
pub struct CarbonFactorTable {
    factors: HashMap<String, f64>,
    fallback: f64,
}

impl Default for CarbonFactorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CarbonFactorTable {
    pub fn empty() -> Self {
        Self {
            factors: HashMap::new(),
            fallback: FALLBACK_CARBON_FACTOR,
        }
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("us-east-1", 400.0);
        table.insert("eu-west-1", 200.0);
        table.insert("ap-southeast-1", 600.0);
        table
    }

    pub fn insert(&mut self, region: impl Into<String>, grams_per_kwh: f64) {
        self.factors.insert(region.into(), grams_per_kwh);
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, f64>) -> Self {
        self.factors.extend(overrides);
        self
    }

    /// Exact-match lookup without fallback
    pub fn get(&self, region: &str) -> Option<f64> {
        self.factors.get(region).copied()
    }

    /// Exact match, else the fallback factor
    pub fn resolve(&self, region: &str) -> f64 {
        self.get(region).unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }
}

/// Share of renewable generation (percent) by region code
#[derive(Debug, Clone)]
pub struct RenewableShareTable {
    shares: HashMap<String, f64>,
    fallback: f64,
}

impl Default for RenewableShareTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RenewableShareTable {
    pub fn empty() -> Self {
        Self {
            shares: HashMap::new(),
            fallback: FALLBACK_RENEWABLE_PERCENTAGE,
        }
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("us-east-1", 35.0);
        table.insert("eu-west-1", 60.0);
        table.insert("ap-southeast-1", 25.0);
        table
    }

    pub fn insert(&mut self, region: impl Into<String>, percentage: f64) {
        self.shares.insert(region.into(), percentage);
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, f64>) -> Self {
        self.shares.extend(overrides);
        self
    }

    pub fn get(&self, region: &str) -> Option<f64> {
        self.shares.get(region).copied()
    }

    pub fn resolve(&self, region: &str) -> f64 {
        self.get(region).unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_factors() {
        let table = CarbonFactorTable::builtin();
        assert_eq!(table.resolve("us-east-1"), 400.0);
        assert_eq!(table.resolve("eu-west-1"), 200.0);
        assert_eq!(table.resolve("ap-southeast-1"), 600.0);
    }

    #[test]
    fn test_unknown_region_falls_back() {
        let table = CarbonFactorTable::builtin();
        assert!(table.get("sa-east-1").is_none());
        assert_eq!(table.resolve("sa-east-1"), FALLBACK_CARBON_FACTOR);

        let empty = CarbonFactorTable::empty();
        assert_eq!(empty.resolve("us-east-1"), FALLBACK_CARBON_FACTOR);
    }

    #[test]
    fn test_factor_overrides() {
        let overrides = HashMap::from([("us-east-1".to_string(), 380.0)]);
        let table = CarbonFactorTable::builtin().with_overrides(overrides);
        assert_eq!(table.resolve("us-east-1"), 380.0);
        assert_eq!(table.resolve("eu-west-1"), 200.0);
    }

    #[test]
    fn test_renewable_shares() {
        let table = RenewableShareTable::builtin();
        assert_eq!(table.resolve("eu-west-1"), 60.0);
        assert_eq!(table.resolve("unknown"), FALLBACK_RENEWABLE_PERCENTAGE);
    }
}
