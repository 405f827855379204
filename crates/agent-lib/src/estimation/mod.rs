//! Energy and carbon estimation
//!
//! Converts utilization into an approximate power draw using a linear model
//! between an instance class's idle and full-load power, and converts that
//! power into a carbon figure using the region's grid intensity.
//!
//! The carbon conversion treats the power figure as watt-hours over an
//! implicit one-hour interval and reports `watts / 1_000_000 * factor`
//! as kilograms. Dashboards are calibrated to that scale.

mod carbon;
mod error;
mod profiles;
mod selection;

#[cfg(test)]
mod tests;

pub use carbon::{
    CarbonFactorTable, RenewableShareTable, FALLBACK_CARBON_FACTOR,
    FALLBACK_RENEWABLE_PERCENTAGE,
};
pub use error::NoCandidatesError;
pub use profiles::{
    PowerProfile, PowerProfileTable, DEFAULT_SCALE_MULTIPLIER, FALLBACK_BASE_WATTS,
};
pub use selection::{min_energy_index, select_best};

use crate::models::{EstimationResult, RegionSustainability, UtilizationSample};

/// Stateless estimator over static lookup tables
///
/// Safe to share across tasks behind an `Arc`; nothing is mutated after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct EstimationEngine {
    power_profiles: PowerProfileTable,
    carbon_factors: CarbonFactorTable,
    renewable_shares: RenewableShareTable,
}

impl EstimationEngine {
    /// Engine over the built-in tables
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(power_profiles: PowerProfileTable, carbon_factors: CarbonFactorTable) -> Self {
        Self {
            power_profiles,
            carbon_factors,
            renewable_shares: RenewableShareTable::builtin(),
        }
    }

    pub fn with_renewable_shares(mut self, renewable_shares: RenewableShareTable) -> Self {
        self.renewable_shares = renewable_shares;
        self
    }

    pub fn power_profiles(&self) -> &PowerProfileTable {
        &self.power_profiles
    }

    pub fn carbon_factors(&self) -> &CarbonFactorTable {
        &self.carbon_factors
    }

    /// Power draw in watts for the given CPU utilization percent
    ///
    /// Utilization is clamped to [0, 100]; NaN counts as no load.
    pub fn estimate_energy(&self, cpu_utilization: f64, instance_class: &str) -> f64 {
        let profile = self.power_profiles.resolve(instance_class);
        let cpu = if cpu_utilization.is_nan() {
            0.0
        } else {
            cpu_utilization.clamp(0.0, 100.0)
        };

        let base = profile.base_watts;
        let max_power = profile.max_watts();
        base + (max_power - base) * (cpu / 100.0)
    }

    /// Carbon footprint in kilograms CO2 for the given power figure
    pub fn estimate_carbon(&self, energy_watts: f64, region: &str) -> f64 {
        let factor = self.carbon_factors.resolve(region);
        (energy_watts / 1_000_000.0) * factor
    }

    /// Estimate energy and carbon for one sample
    pub fn estimate(&self, sample: &UtilizationSample) -> EstimationResult {
        let energy = self.estimate_energy(sample.cpu_utilization, &sample.instance_class);
        let carbon = self.estimate_carbon(energy, &sample.region);

        EstimationResult {
            instance_id: sample.instance_id.clone(),
            instance_class: sample.instance_class.clone(),
            region: sample.region.clone(),
            energy_consumption_watts: energy,
            carbon_footprint_kg: carbon,
            cpu_utilization: sample.cpu_utilization,
            memory_utilization: sample.memory_utilization,
            timestamp: sample.timestamp,
        }
    }

    pub fn estimate_all(&self, samples: &[UtilizationSample]) -> Vec<EstimationResult> {
        samples.iter().map(|s| self.estimate(s)).collect()
    }

    /// Pick the instance with the lowest estimated energy
    pub fn select_best<'a>(
        &self,
        results: &'a [EstimationResult],
    ) -> Result<&'a EstimationResult, NoCandidatesError> {
        let idx = min_energy_index(results.iter().map(|r| r.energy_consumption_watts))?;
        Ok(&results[idx])
    }

    /// Renewable share and grid intensity for a region
    pub fn sustainability(&self, region: &str) -> RegionSustainability {
        RegionSustainability {
            region: region.to_string(),
            renewable_percentage: self.renewable_shares.resolve(region),
            carbon_intensity: self.carbon_factors.resolve(region),
        }
    }
}
