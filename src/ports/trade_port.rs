//! Trade storage port trait.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;

pub trait TradePort {
    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError>;

    /// All trades owned by `user_id`, newest first.
    fn list_trades(&self, user_id: &str) -> Result<Vec<Trade>, JournalError>;

    /// `None` when the trade does not exist or belongs to someone else.
    fn get_trade(&self, user_id: &str, id: &str) -> Result<Option<Trade>, JournalError>;
}
