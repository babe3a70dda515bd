use serde::{Deserialize, Serialize};

use crate::pricing::state::PhaseResult;

/// Digest of a run's complete audit trail. Two runs over identical resolved
/// inputs and the same snapshot must produce equal fingerprints; a drifting
/// fingerprint under a refactor means the pipeline's observable output
/// changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub hash_hex: String,
}

impl RunFingerprint {
    pub fn from_trails<'a>(trails: impl IntoIterator<Item = &'a [PhaseResult]>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for trail in trails {
            for result in trail {
                hasher.update(&[result.phase_index]);
                hasher.update(result.phase.as_bytes());
                hasher.update(b"\x1f");
                hasher.update(result.variable.as_bytes());
                hasher.update(b"\x1f");
                hasher.update(result.value.to_string().as_bytes());
                hasher.update(b"\x1f");
                hasher.update(result.currency.as_str().as_bytes());
                hasher.update(b"\x1e");
            }
        }
        Self { hash_hex: hasher.finalize().to_hex().to_string() }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::RunFingerprint;
    use crate::domain::money::Currency;
    use crate::pricing::state::PhaseResult;

    fn result(variable: &str, value: rust_decimal::Decimal) -> PhaseResult {
        PhaseResult {
            phase_index: 1,
            phase: "procurement_net".to_owned(),
            variable: variable.to_owned(),
            value,
            currency: Currency::reference(),
        }
    }

    #[test]
    fn identical_trails_hash_identically() {
        let trail = vec![result("goods_subtotal", dec!(1000))];
        let left = RunFingerprint::from_trails([trail.as_slice()]);
        let right = RunFingerprint::from_trails([trail.as_slice()]);
        assert_eq!(left, right);
    }

    #[test]
    fn value_changes_change_the_fingerprint() {
        let left = RunFingerprint::from_trails([vec![result("profit", dec!(300))].as_slice()]);
        let right = RunFingerprint::from_trails([vec![result("profit", dec!(300.01))].as_slice()]);
        assert_ne!(left, right);
    }

    #[test]
    fn trail_order_is_significant() {
        let a = result("goods_subtotal", dec!(1));
        let b = result("packaging_total", dec!(2));
        let left = RunFingerprint::from_trails([vec![a.clone(), b.clone()].as_slice()]);
        let right = RunFingerprint::from_trails([vec![b, a].as_slice()]);
        assert_ne!(left, right);
    }
}
