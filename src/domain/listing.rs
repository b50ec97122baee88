//! Filtering and sorting of a user's trade list.

use serde::Deserialize;
use std::cmp::Ordering;

use super::error::JournalError;
use super::pnl::Outcome;
use super::trade::Trade;

/// Raw query-string parameters for the trade list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub outcome: Option<String>,
    pub asset: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    EntryDate,
    ExitDate,
    CryptoName,
    EntryPrice,
    ExitPrice,
    PositionSize,
    Pnl,
}

impl SortKey {
    fn parse(value: &str) -> Option<Self> {
        let key = match value {
            "createdAt" => SortKey::CreatedAt,
            "entryDate" => SortKey::EntryDate,
            "exitDate" => SortKey::ExitDate,
            "cryptoName" => SortKey::CryptoName,
            "entryPrice" => SortKey::EntryPrice,
            "exitPrice" => SortKey::ExitPrice,
            "positionSize" => SortKey::PositionSize,
            "pnl" => SortKey::Pnl,
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeQuery {
    pub outcome: Option<Outcome>,
    /// Lower-cased substring matched against `crypto_name`.
    pub asset: Option<String>,
    pub status: Option<StatusFilter>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl TradeQuery {
    pub fn from_params(params: &ListParams) -> Result<Self, JournalError> {
        let outcome = non_blank(&params.outcome)
            .map(|v| {
                v.parse::<Outcome>()
                    .map_err(|e| invalid_query("outcome", e.to_string()))
            })
            .transpose()?;

        let status = non_blank(&params.status)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "open" => Ok(StatusFilter::Open),
                "closed" => Ok(StatusFilter::Closed),
                _ => Err(invalid_query("status", format!("unknown status: {v}"))),
            })
            .transpose()?;

        let sort = match non_blank(&params.sort) {
            Some(v) => SortKey::parse(v)
                .ok_or_else(|| invalid_query("sort", format!("unknown sort key: {v}")))?,
            None => SortKey::default(),
        };

        let order = match non_blank(&params.order).map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "asc" => SortOrder::Asc,
            Some(v) if v == "desc" => SortOrder::Desc,
            Some(v) => return Err(invalid_query("order", format!("unknown order: {v}"))),
            None => SortOrder::default(),
        };

        Ok(Self {
            outcome,
            asset: non_blank(&params.asset).map(str::to_lowercase),
            status,
            sort,
            order,
        })
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(outcome) = self.outcome {
            if trade.outcome != outcome {
                return false;
            }
        }
        if let Some(asset) = &self.asset {
            if !trade.crypto_name.to_lowercase().contains(asset.as_str()) {
                return false;
            }
        }
        match self.status {
            Some(StatusFilter::Open) => !trade.is_closed(),
            Some(StatusFilter::Closed) => trade.is_closed(),
            None => true,
        }
    }

    /// Filters then sorts. The sort is stable, so ties keep store order.
    pub fn apply(&self, trades: Vec<Trade>) -> Vec<Trade> {
        let mut selected: Vec<Trade> = trades.into_iter().filter(|t| self.matches(t)).collect();
        selected.sort_by(|a, b| compare(a, b, self.sort, self.order));
        selected
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn invalid_query(param: &str, reason: String) -> JournalError {
    JournalError::InvalidQuery {
        param: param.to_string(),
        reason,
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Absent values sort after present ones in either direction.
fn optional<T>(
    a: Option<T>,
    b: Option<T>,
    order: SortOrder,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(&x, &y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Trade, b: &Trade, key: SortKey, order: SortOrder) -> Ordering {
    match key {
        SortKey::CreatedAt => directed(a.created_at.cmp(&b.created_at), order),
        SortKey::EntryDate => directed(a.entry_date.cmp(&b.entry_date), order),
        SortKey::ExitDate => optional(a.exit_date, b.exit_date, order, |x, y| x.cmp(y)),
        SortKey::CryptoName => directed(
            a.crypto_name
                .to_lowercase()
                .cmp(&b.crypto_name.to_lowercase()),
            order,
        ),
        SortKey::EntryPrice => directed(a.entry_price.total_cmp(&b.entry_price), order),
        SortKey::ExitPrice => optional(a.exit_price, b.exit_price, order, f64::total_cmp),
        SortKey::PositionSize => directed(a.position_size.total_cmp(&b.position_size), order),
        SortKey::Pnl => directed(a.pnl.total_cmp(&b.pnl), order),
    }
}
