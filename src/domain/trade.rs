//! The journal's trade record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pnl::Outcome;
use super::validation::ValidatedTrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub user_id: String,
    pub crypto_name: String,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub pnl: f64,
    pub outcome: Outcome,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Builds a new record owned by `user_id` with a fresh identifier.
    pub fn create(validated: ValidatedTrade, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            crypto_name: validated.crypto_name,
            entry_date: validated.entry_date,
            exit_date: validated.exit_date,
            entry_price: validated.entry_price,
            exit_price: validated.exit_price,
            position_size: validated.position_size,
            pnl: validated.pnl,
            outcome: validated.outcome,
            reason: validated.reason,
            notes: validated.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    pub fn holding_days(&self) -> Option<i64> {
        self.exit_date.map(|exit| (exit - self.entry_date).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn validated() -> ValidatedTrade {
        ValidatedTrade {
            crypto_name: "SOL".into(),
            entry_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            exit_date: Some(Utc.with_ymd_and_hms(2024, 5, 11, 12, 0, 0).unwrap()),
            entry_price: 140.0,
            exit_price: Some(120.0),
            position_size: 10.0,
            pnl: -200.0,
            outcome: Outcome::Loss,
            reason: "Support retest".into(),
            notes: None,
        }
    }

    #[test]
    fn create_assigns_identity_and_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let trade = Trade::create(validated(), "user-1", now);
        assert!(Uuid::parse_str(&trade.id).is_ok());
        assert_eq!(trade.user_id, "user-1");
        assert_eq!(trade.created_at, now);
        assert_eq!(trade.updated_at, now);
        assert_eq!(trade.outcome, Outcome::Loss);
        assert_eq!(trade.holding_days(), Some(10));
    }

    #[test]
    fn create_generates_distinct_ids() {
        let now = Utc::now();
        let a = Trade::create(validated(), "u", now);
        let b = Trade::create(validated(), "u", now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let trade = Trade::create(validated(), "user-1", now);
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["cryptoName"], "SOL");
        assert_eq!(json["positionSize"], 10.0);
        assert_eq!(json["outcome"], "Loss");
        assert_eq!(json["userId"], "user-1");
        assert!(json["notes"].is_null());
    }
}
