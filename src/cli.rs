//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::web::{AppState, build_router, hash_password};
use crate::domain::config_validation::{log_filter, validate_server_config};
use crate::domain::error::JournalError;
use crate::domain::listing::{ListParams, TradeQuery};
use crate::domain::summary::JournalSummary;
use crate::domain::trade::Trade;
use crate::domain::user::User;
use crate::ports::trade_port::TradePort;
use crate::ports::user_port::UserPort;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Personal crypto trade journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create a journal account; the password is read from stdin
    AddUser {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        username: String,
    },
    /// Print a user's trades and summary
    List {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        order: Option<String>,
    },
    /// Output an argon2 hash for a password read from stdin
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::AddUser { config, username } => run_add_user(&config, &username),
        Command::List {
            config,
            username,
            outcome,
            asset,
            status,
            sort,
            order,
        } => {
            let params = ListParams {
                outcome,
                asset,
                status,
                sort,
                order,
            };
            run_list(&config, &username, &params)
        }
        Command::HashPassword => run_hash_password(),
    }
}

fn fail(err: &JournalError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(filter: &str) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

pub fn open_store(config: &FileConfigAdapter) -> Result<Arc<SqliteAdapter>, JournalError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

/// Reads the first line of `reader`, without its line terminator.
pub fn read_password(reader: impl BufRead) -> Result<String, JournalError> {
    let line = reader.lines().next().transpose()?.unwrap_or_default();
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(JournalError::missing("password"));
    }
    Ok(password)
}

pub fn register_user(
    users: &dyn UserPort,
    username: &str,
    password: &str,
) -> Result<User, JournalError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(JournalError::missing("username"));
    }
    let hash = hash_password(password)?;
    users.create_user(username, &hash)
}

pub fn user_trades(
    users: &dyn UserPort,
    trades: &dyn TradePort,
    username: &str,
    params: &ListParams,
) -> Result<Vec<Trade>, JournalError> {
    let query = TradeQuery::from_params(params)?;
    let user = users
        .find_by_username(username)?
        .ok_or_else(|| JournalError::UserNotFound {
            username: username.to_string(),
        })?;
    Ok(query.apply(trades.list_trades(&user.id)?))
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

pub fn format_trade_table(trades: &[Trade]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<10} {:<10} {:>5} {:>14} {:>14} {:>12} {:>14} {:<9}",
        "ASSET", "ENTRY", "EXIT", "DAYS", "ENTRY PRICE", "EXIT PRICE", "SIZE", "PNL", "OUTCOME"
    );
    for trade in trades {
        let exit_date = trade
            .exit_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "open".to_string());
        let held = trade
            .holding_days()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<12} {:<10} {:<10} {:>5} {:>14.4} {:>14} {:>12.4} {:>14.2} {:<9}",
            trade.crypto_name,
            trade.entry_date.format("%Y-%m-%d").to_string(),
            exit_date,
            held,
            trade.entry_price,
            fmt_optional(trade.exit_price),
            trade.position_size,
            trade.pnl,
            trade.outcome,
        );
    }
    out
}

pub fn format_summary(summary: &JournalSummary) -> String {
    let profit_factor = if summary.profit_factor.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", summary.profit_factor)
    };
    format!(
        "{} trades ({} open, {} closed): {} won, {} lost, {} breakeven\n\
         win rate {:.1}%, total pnl {:.2}, profit factor {}",
        summary.total_trades,
        summary.open_trades,
        summary.closed_trades,
        summary.trades_won,
        summary.trades_lost,
        summary.trades_breakeven,
        summary.win_rate * 100.0,
        summary.total_pnl,
        profit_factor,
    )
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_tracing(&log_filter(&config));
    tracing::info!(path = %config_path.display(), "loaded config");

    let settings = match validate_server_config(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let state = AppState {
        trades: store.clone(),
        users: store,
        config: Arc::new(config),
    };

    let router = match build_router(state) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => return fail(&JournalError::Io(e)),
    };

    let result = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(settings.listen).await?;
        tracing::info!(addr = %settings.listen, "web server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    match result {
        Ok(()) => {
            tracing::info!("web server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&JournalError::Io(e)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn run_add_user(config_path: &PathBuf, username: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_tracing(&log_filter(&config));

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Enter password for {username}:");
    let result = read_password(io::stdin().lock())
        .and_then(|password| register_user(&*store, username, &password));

    match result {
        Ok(user) => {
            println!("created user {} ({})", user.username, user.id);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_list(config_path: &PathBuf, username: &str, params: &ListParams) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_tracing(&log_filter(&config));

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match user_trades(&*store, &*store, username, params) {
        Ok(trades) => {
            print!("{}", format_trade_table(&trades));
            println!();
            println!("{}", format_summary(&JournalSummary::compute(&trades)));
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_hash_password() -> ExitCode {
    eprintln!("Enter password to hash:");
    match read_password(io::stdin().lock()).and_then(|password| hash_password(&password)) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
