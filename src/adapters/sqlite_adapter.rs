//! SQLite storage adapter for trades and users.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ErrorCode, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::domain::error::JournalError;
use crate::domain::pnl::Outcome;
use crate::domain::trade::Trade;
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::TradePort;
use crate::ports::user_port::UserPort;

const TRADE_COLUMNS: &str = "id, user_id, crypto_name, entry_date, exit_date, entry_price,
     exit_price, position_size, pnl, outcome, reason, notes, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, password_hash, created_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path = config.require_string("database", "path")?;
        let pool_size = config.get_int("database", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        tracing::info!(path = %db_path, pool_size, "opened sqlite database");
        Ok(Self { pool })
    }

    /// Single-connection pool so every checkout sees the same in-memory database.
    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                crypto_name TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                exit_date TEXT,
                entry_price REAL NOT NULL,
                exit_price REAL,
                position_size REAL NOT NULL,
                pnl REAL NOT NULL,
                outcome TEXT NOT NULL,
                reason TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_user_created ON trades(user_id, created_at);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool.get().map_err(pool_err)
    }
}

fn pool_err(e: r2d2::Error) -> JournalError {
    JournalError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn optional_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let outcome: String = row.get(9)?;
    let outcome = outcome
        .parse::<Outcome>()
        .map_err(|e| conversion_err(9, e))?;
    Ok(Trade {
        id: row.get(0)?,
        user_id: row.get(1)?,
        crypto_name: row.get(2)?,
        entry_date: timestamp_at(row, 3)?,
        exit_date: optional_timestamp_at(row, 4)?,
        entry_price: row.get(5)?,
        exit_price: row.get(6)?,
        position_size: row.get(7)?,
        pnl: row.get(8)?,
        outcome,
        reason: row.get(10)?,
        notes: row.get(11)?,
        created_at: timestamp_at(row, 12)?,
        updated_at: timestamp_at(row, 13)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

impl TradePort for SqliteAdapter {
    fn create_trade(&self, trade: &Trade) -> Result<(), JournalError> {
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO trades ({TRADE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                trade.id,
                trade.user_id,
                trade.crypto_name,
                format_timestamp(&trade.entry_date),
                trade.exit_date.as_ref().map(format_timestamp),
                trade.entry_price,
                trade.exit_price,
                trade.position_size,
                trade.pnl,
                trade.outcome.as_str(),
                trade.reason,
                trade.notes,
                format_timestamp(&trade.created_at),
                format_timestamp(&trade.updated_at),
            ],
        )
        .map_err(query_err)?;

        tracing::debug!(trade_id = %trade.id, user_id = %trade.user_id, "trade inserted");
        Ok(())
    }

    fn list_trades(&self, user_id: &str) -> Result<Vec<Trade>, JournalError> {
        let conn = self.conn()?;

        let query = format!(
            "SELECT {TRADE_COLUMNS}
             FROM trades
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );

        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![user_id], trade_from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }

        Ok(trades)
    }

    fn get_trade(&self, user_id: &str, id: &str) -> Result<Option<Trade>, JournalError> {
        let conn = self.conn()?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1 AND user_id = ?2");

        conn.query_row(&query, params![id, user_id], trade_from_row)
            .optional()
            .map_err(query_err)
    }
}

impl UserPort for SqliteAdapter {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User, JournalError> {
        let conn = self.conn()?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        let result = conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"),
            params![
                user.id,
                user.username,
                user.password_hash,
                format_timestamp(&user.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(user),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(JournalError::DuplicateUser {
                    username: username.to_string(),
                })
            }
            Err(e) => Err(query_err(e)),
        }
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, JournalError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>, JournalError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pnl;
    use chrono::{Duration, TimeZone};

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn trade(user_id: &str, name: &str, exit: Option<f64>, created_offset: i64) -> Trade {
        let created =
            Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap() + Duration::minutes(created_offset);
        let (pnl, outcome) = pnl::compute(100.0, exit, 2.0);
        Trade {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            crypto_name: name.to_string(),
            entry_date: Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
            exit_date: exit.map(|_| Utc.with_ymd_and_hms(2024, 1, 20, 17, 0, 0).unwrap()),
            entry_price: 100.0,
            exit_price: exit,
            position_size: 2.0,
            pnl,
            outcome,
            reason: "Range breakout".to_string(),
            notes: exit.map(|_| "took profit early".to_string()),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(JournalError::ConfigMissing { section, key }) => {
                assert_eq!(section, "database");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn in_memory_initialization_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn trade_round_trips_all_fields() {
        let adapter = adapter();
        let closed = trade("alice", "BTC", Some(150.0), 0);
        adapter.create_trade(&closed).unwrap();

        let fetched = adapter.get_trade("alice", &closed.id).unwrap().unwrap();
        assert_eq!(fetched, closed);
    }

    #[test]
    fn open_trade_keeps_absent_exit() {
        let adapter = adapter();
        let open = trade("alice", "ETH", None, 0);
        adapter.create_trade(&open).unwrap();

        let fetched = adapter.get_trade("alice", &open.id).unwrap().unwrap();
        assert_eq!(fetched.exit_date, None);
        assert_eq!(fetched.exit_price, None);
        assert_eq!(fetched.notes, None);
        assert_eq!(fetched.outcome, Outcome::Breakeven);
    }

    #[test]
    fn list_is_scoped_and_newest_first() {
        let adapter = adapter();
        adapter.create_trade(&trade("alice", "BTC", Some(150.0), 0)).unwrap();
        adapter.create_trade(&trade("bob", "DOGE", Some(50.0), 1)).unwrap();
        adapter.create_trade(&trade("alice", "ETH", None, 2)).unwrap();

        let trades = adapter.list_trades("alice").unwrap();
        let names: Vec<&str> = trades.iter().map(|t| t.crypto_name.as_str()).collect();
        assert_eq!(names, vec!["ETH", "BTC"]);
        assert!(adapter.list_trades("carol").unwrap().is_empty());
    }

    #[test]
    fn equal_timestamps_fall_back_to_insertion_order() {
        let adapter = adapter();
        adapter.create_trade(&trade("alice", "FIRST", None, 0)).unwrap();
        adapter.create_trade(&trade("alice", "SECOND", None, 0)).unwrap();

        let trades = adapter.list_trades("alice").unwrap();
        assert_eq!(trades[0].crypto_name, "SECOND");
    }

    #[test]
    fn get_trade_owned_by_someone_else_is_none() {
        let adapter = adapter();
        let theirs = trade("bob", "DOGE", Some(50.0), 0);
        adapter.create_trade(&theirs).unwrap();

        assert!(adapter.get_trade("alice", &theirs.id).unwrap().is_none());
        assert!(adapter.get_trade("alice", "missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_trade_id_is_query_error() {
        let adapter = adapter();
        let t = trade("alice", "BTC", None, 0);
        adapter.create_trade(&t).unwrap();
        assert!(matches!(
            adapter.create_trade(&t),
            Err(JournalError::DatabaseQuery { .. })
        ));
    }

    #[test]
    fn user_create_and_lookup() {
        let adapter = adapter();
        let user = adapter.create_user("alice", "$argon2id$fake").unwrap();

        let by_name = adapter.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.password_hash, "$argon2id$fake");

        let by_id = adapter.find_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(adapter.find_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_rejected() {
        let adapter = adapter();
        adapter.create_user("alice", "h1").unwrap();
        match adapter.create_user("alice", "h2") {
            Err(JournalError::DuplicateUser { username }) => assert_eq!(username, "alice"),
            other => panic!("expected DuplicateUser, got {other:?}"),
        }
    }
}
