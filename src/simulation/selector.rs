use crate::core::rng::next_unit;
use crate::data::behaviors::BehaviorCatalog;
use crate::rules::condition::eval_all;
use crate::rules::context::MascotSnapshot;

/// Hardcoded recovery behavior when nothing is eligible.
pub const FALLBACK_BEHAVIOR: &str = "Fall";

/// Frequency-weighted random selection over the behaviors whose conditions
/// all pass. Runs only at action-completion boundaries.
///
/// Zero-frequency behaviors contribute nothing to the wheel, so they are
/// never chosen here; they are placeholders reachable by other means.
pub fn select_next_behavior(
    catalog: &BehaviorCatalog,
    snap: &MascotSnapshot,
    rng: &mut u64,
    log: &mut Vec<String>,
) -> String {
    let eligible: Vec<_> = catalog
        .behaviors
        .iter()
        .filter(|behavior| eval_all(&behavior.conditions, snap, rng))
        .collect();

    if eligible.is_empty() {
        log.push(format!(
            "no eligible behavior, falling back to {}",
            FALLBACK_BEHAVIOR
        ));
        return FALLBACK_BEHAVIOR.to_string();
    }

    let total_frequency: u64 = eligible.iter().map(|behavior| behavior.frequency as u64).sum();
    if total_frequency == 0 {
        log.push(format!(
            "all eligible behaviors have zero frequency, falling back to {}",
            FALLBACK_BEHAVIOR
        ));
        return FALLBACK_BEHAVIOR.to_string();
    }

    let roll = (next_unit(rng) * total_frequency as f64) as u64;
    let mut acc = 0u64;
    for behavior in &eligible {
        acc += behavior.frequency as u64;
        if roll < acc {
            return behavior.name.clone();
        }
    }
    eligible
        .last()
        .map(|behavior| behavior.name.clone())
        .unwrap_or_else(|| FALLBACK_BEHAVIOR.to_string())
}
