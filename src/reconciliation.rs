// ⚖️ Trade Leg Reconciliation - pair the two halves of an order execution
//
// The legacy export books one order execution as two rows: the currency that
// left the account (negative quantity) and the one that arrived (positive
// quantity), stamped within a couple of seconds of each other.
//
// Pairing is GREEDY and order-dependent: each unconsumed leg takes the first
// later unconsumed leg that qualifies. This is not a globally optimal
// matching and must stay that way; downstream files depend on these
// tie-breaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default maximum distance between two legs of the same execution
pub const DEFAULT_PAIR_WINDOW_SECS: f64 = 2.0;

// ============================================================================
// LEGS & PAIRS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TradeLeg {
    pub timestamp: DateTime<Utc>,
    /// Signed: negative left the account, positive arrived
    pub quantity: f64,
    pub currency: String,
}

/// Indices into the leg slice handed to `PairingEngine::pair`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegPair {
    pub sent: usize,
    pub received: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingOutcome {
    /// In the order they were formed
    pub pairs: Vec<LegPair>,
    /// Legs that found no partner, ascending
    pub unmatched: Vec<usize>,
}

// ============================================================================
// PAIRING ENGINE
// ============================================================================

pub struct PairingEngine {
    /// Legs must be strictly closer than this, in seconds
    pub window_secs: f64,
}

impl Default for PairingEngine {
    fn default() -> Self {
        PairingEngine::new()
    }
}

impl PairingEngine {
    pub fn new() -> Self {
        PairingEngine {
            window_secs: DEFAULT_PAIR_WINDOW_SECS,
        }
    }

    pub fn with_window(window_secs: f64) -> Self {
        PairingEngine { window_secs }
    }

    fn within_window(&self, a: &TradeLeg, b: &TradeLeg) -> bool {
        (b.timestamp - a.timestamp)
            .num_microseconds()
            .map(|us| (us.abs() as f64 / 1_000_000.0) < self.window_secs)
            .unwrap_or(false)
    }

    /// Two legs qualify when close in time and of opposite sign
    pub fn is_match(&self, a: &TradeLeg, b: &TradeLeg) -> bool {
        self.within_window(a, b) && a.quantity * b.quantity < 0.0
    }

    /// Greedy O(n²) scan over an index arena.
    ///
    /// `legs` must already be sorted by timestamp.
    pub fn pair(&self, legs: &[TradeLeg]) -> PairingOutcome {
        let mut consumed = vec![false; legs.len()];
        let mut outcome = PairingOutcome::default();

        for i in 0..legs.len() {
            if consumed[i] {
                continue;
            }

            let partner = (i + 1..legs.len())
                .filter(|&j| !consumed[j])
                .find(|&j| self.is_match(&legs[i], &legs[j]));

            if let Some(j) = partner {
                consumed[i] = true;
                consumed[j] = true;
                let pair = if legs[i].quantity < 0.0 {
                    LegPair { sent: i, received: j }
                } else {
                    LegPair { sent: j, received: i }
                };
                outcome.pairs.push(pair);
            }
        }

        outcome.unmatched = consumed
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(idx, _)| idx)
            .collect();

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn leg(offset_ms: i64, quantity: f64, currency: &str) -> TradeLeg {
        let base = NaiveDate::from_ymd_opt(2024, 1, 17)
            .unwrap()
            .and_hms_opt(9, 47, 30)
            .unwrap()
            .and_utc();
        TradeLeg {
            timestamp: base + Duration::milliseconds(offset_ms),
            quantity,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_pairs_opposite_legs() {
        let engine = PairingEngine::new();
        let legs = vec![leg(0, 0.01, "BTC"), leg(500, -1500.0, "BRL")];

        let outcome = engine.pair(&legs);

        assert_eq!(outcome.pairs, vec![LegPair { sent: 1, received: 0 }]);
        assert!(outcome.unmatched.is_empty());
    }

    #[test]
    fn test_third_leg_left_unmatched() {
        let engine = PairingEngine::new();
        let legs = vec![
            leg(0, -1500.0, "BRL"),
            leg(300, 0.01, "BTC"),
            leg(600, 0.02, "BTC"),
        ];

        let outcome = engine.pair(&legs);

        assert_eq!(outcome.pairs, vec![LegPair { sent: 0, received: 1 }]);
        assert_eq!(outcome.unmatched, vec![2]);
    }

    #[test]
    fn test_window_is_exclusive() {
        let engine = PairingEngine::new();
        let legs = vec![leg(0, -1.0, "BRL"), leg(2000, 1.0, "BTC")];

        let outcome = engine.pair(&legs);

        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.unmatched, vec![0, 1]);
    }

    #[test]
    fn test_same_sign_never_pairs() {
        let engine = PairingEngine::new();
        let legs = vec![leg(0, 1.0, "BTC"), leg(100, 2.0, "ETH")];

        assert!(engine.pair(&legs).pairs.is_empty());
    }

    #[test]
    fn test_greedy_first_partner_wins() {
        // 0 takes 1 (first eligible), so 3 ends up with 2
        let engine = PairingEngine::new();
        let legs = vec![
            leg(0, -10.0, "BRL"),
            leg(100, 1.0, "BTC"),
            leg(200, 2.0, "BTC"),
            leg(300, -20.0, "BRL"),
        ];

        let outcome = engine.pair(&legs);

        assert_eq!(
            outcome.pairs,
            vec![
                LegPair { sent: 0, received: 1 },
                LegPair { sent: 3, received: 2 },
            ]
        );
    }

    #[test]
    fn test_zero_quantity_never_pairs() {
        let engine = PairingEngine::new();
        let legs = vec![leg(0, 0.0, "BTC"), leg(100, -1.0, "BRL")];

        assert_eq!(engine.pair(&legs).unmatched, vec![0, 1]);
    }

    #[test]
    fn test_custom_window() {
        let engine = PairingEngine::with_window(5.0);
        let legs = vec![leg(0, -1.0, "BRL"), leg(4000, 1.0, "BTC")];

        assert_eq!(engine.pair(&legs).pairs.len(), 1);
    }
}
