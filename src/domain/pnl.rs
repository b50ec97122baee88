//! Profit-and-loss computation and outcome classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical result of a trade, derived from the sign of its PnL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Profit,
    Loss,
    Breakeven,
}

impl Outcome {
    pub fn from_pnl(pnl: f64) -> Self {
        if pnl > 0.0 {
            Outcome::Profit
        } else if pnl < 0.0 {
            Outcome::Loss
        } else {
            Outcome::Breakeven
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Profit => "Profit",
            Outcome::Loss => "Loss",
            Outcome::Breakeven => "Breakeven",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown outcome: {0}")]
pub struct UnknownOutcome(pub String);

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profit" => Ok(Outcome::Profit),
            "loss" => Ok(Outcome::Loss),
            "breakeven" => Ok(Outcome::Breakeven),
            _ => Err(UnknownOutcome(s.to_string())),
        }
    }
}

/// Computes `(exit - entry) * position_size` and its outcome.
///
/// An open position (no exit price) is always `(0.0, Breakeven)`. No rounding
/// is applied. Extreme finite inputs can overflow to a non-finite pnl; callers
/// that persist the result must check it.
pub fn compute(entry_price: f64, exit_price: Option<f64>, position_size: f64) -> (f64, Outcome) {
    let Some(exit_price) = exit_price else {
        return (0.0, Outcome::Breakeven);
    };
    let pnl = normalize_zero((exit_price - entry_price) * position_size);
    (pnl, Outcome::from_pnl(pnl))
}

/// Maps `-0.0` to `0.0` so a breakeven trade never serializes as negative.
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn profitable_trade() {
        let (pnl, outcome) = compute(100.0, Some(150.0), 2.0);
        assert_relative_eq!(pnl, 100.0);
        assert_eq!(outcome, Outcome::Profit);
    }

    #[test]
    fn losing_trade() {
        let (pnl, outcome) = compute(100.0, Some(50.0), 2.0);
        assert_relative_eq!(pnl, -100.0);
        assert_eq!(outcome, Outcome::Loss);
    }

    #[test]
    fn flat_trade_is_breakeven() {
        let (pnl, outcome) = compute(100.0, Some(100.0), 5.0);
        assert_eq!(pnl, 0.0);
        assert_eq!(outcome, Outcome::Breakeven);
    }

    #[test]
    fn open_position_is_breakeven() {
        assert_eq!(compute(42_000.0, None, 0.5), (0.0, Outcome::Breakeven));
    }

    #[test]
    fn fractional_pnl_not_rounded() {
        let (pnl, outcome) = compute(0.0012, Some(0.0015), 1000.0);
        assert_relative_eq!(pnl, 0.3, epsilon = 1e-9);
        assert_eq!(outcome, Outcome::Profit);
    }

    #[test]
    fn negative_zero_normalized() {
        let (pnl, outcome) = compute(10.0, Some(10.0), -3.0);
        assert!(pnl.is_sign_positive());
        assert_eq!(outcome, Outcome::Breakeven);
    }

    #[test]
    fn outcome_parses_case_insensitively() {
        assert_eq!("profit".parse::<Outcome>().unwrap(), Outcome::Profit);
        assert_eq!(" LOSS ".parse::<Outcome>().unwrap(), Outcome::Loss);
        assert_eq!("Breakeven".parse::<Outcome>().unwrap(), Outcome::Breakeven);
        assert!("win".parse::<Outcome>().is_err());
    }

    #[test]
    fn outcome_serializes_as_variant_name() {
        let json = serde_json::to_string(&Outcome::Breakeven).unwrap();
        assert_eq!(json, "\"Breakeven\"");
    }

    proptest! {
        #[test]
        fn pnl_sign_follows_price_move(
            entry in 0.0001f64..1_000_000.0,
            exit in 0.0001f64..1_000_000.0,
            size in 0.0001f64..10_000.0,
        ) {
            let (pnl, outcome) = compute(entry, Some(exit), size);
            let diff = exit - entry;
            prop_assert_eq!(pnl > 0.0, diff > 0.0);
            prop_assert_eq!(pnl < 0.0, diff < 0.0);
            prop_assert_eq!(outcome, Outcome::from_pnl(pnl));
        }

        #[test]
        fn open_positions_never_carry_pnl(
            entry in -1e9f64..1e9,
            size in -1e6f64..1e6,
        ) {
            prop_assert_eq!(compute(entry, None, size), (0.0, Outcome::Breakeven));
        }
    }
}
