//! Allocation target selection.

use super::NoCandidatesError;

/// Pick the candidate with the lowest energy consumption.
///
/// Candidates are `(instance_id, energy_watts)` pairs. The scan keeps the
/// first minimum it sees, so equal energies resolve to the earliest entry.
/// A NaN energy never wins over a real value.
pub fn select_best<S: AsRef<str>>(candidates: &[(S, f64)]) -> Result<&str, NoCandidatesError> {
    let idx = min_energy_index(candidates.iter().map(|(_, energy)| *energy))?;
    Ok(candidates[idx].0.as_ref())
}

/// Position of the first minimum in a sequence of energies
pub fn min_energy_index<I>(energies: I) -> Result<usize, NoCandidatesError>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, energy) in energies.into_iter().enumerate() {
        let energy = if energy.is_nan() { f64::INFINITY } else { energy };
        match best {
            Some((_, best_energy)) if energy >= best_energy => {}
            _ => best = Some((idx, energy)),
        }
    }

    best.map(|(idx, _)| idx).ok_or(NoCandidatesError)
}
