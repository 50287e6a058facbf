//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `stocktake_core` linkage and schema bootstrap from a shell.
//! - Optionally run one item name search against a database file.
//!
//! Usage: `stocktake_cli [DB_PATH] [SEARCH_TEXT]`. Without a path an
//! in-memory database is used. Logs go to `STOCKTAKE_LOG_DIR`, or a
//! `stocktake-logs` directory under the system temp dir.

use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use stocktake_core::{
    default_log_level, init_logging, open_db, open_db_in_memory, IdFormat, Inventory,
    SearchConfig,
};

fn log_dir() -> PathBuf {
    std::env::var_os("STOCKTAKE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("stocktake-logs"))
}

fn main() -> ExitCode {
    let dir = log_dir();
    if let Err(err) = init_logging(default_log_level(), &dir.to_string_lossy()) {
        eprintln!("stocktake_cli logging disabled: {err}");
    }

    println!("stocktake_core ping={}", stocktake_core::ping());
    println!("stocktake_core version={}", stocktake_core::core_version());

    let mut args = std::env::args().skip(1);
    let db_path = args.next();
    let text = args.next().unwrap_or_default();

    info!(
        "event=cli_run module=cli status=start mode={}",
        if db_path.is_some() { "file" } else { "memory" }
    );
    match run(db_path.as_deref(), &text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error");
            eprintln!("stocktake_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<&str>, text: &str) -> Result<(), String> {
    let conn = match db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;

    let mut inventory =
        Inventory::new(&conn, IdFormat::default()).map_err(|err| err.to_string())?;
    let outcome = inventory
        .search(&SearchConfig::default(), text)
        .map_err(|err| err.to_string())?;

    for id in &outcome.ids {
        let item = inventory.item(*id).map_err(|err| err.to_string())?;
        let item = item.borrow();
        println!("{}\t{}", inventory.display_id(*id), item.name());
    }
    println!("matches={}", outcome.ids.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::log_dir;

    #[test]
    fn default_log_dir_is_absolute_for_init_logging() {
        if std::env::var_os("STOCKTAKE_LOG_DIR").is_none() {
            let dir = log_dir();
            assert!(dir.is_absolute());
            assert!(dir.ends_with("stocktake-logs"));
        }
    }
}
