//! User account port trait.

use crate::domain::error::JournalError;
use crate::domain::user::User;

pub trait UserPort {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User, JournalError>;

    fn find_by_username(&self, username: &str) -> Result<Option<User>, JournalError>;

    fn find_by_id(&self, id: &str) -> Result<Option<User>, JournalError>;
}
