//! Database types and global state

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::{SerdeJson, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn};

use crate::config::Config;
use crate::error::{err, Result, RolegateError};
use crate::store::UserRecord;

// Database type aliases
pub type UserDb = Database<Str, SerdeJson<UserRecord>>;
pub type CounterDb = Database<Str, U64<byteorder::BigEndian>>;

/// Counter keys in the meta database
pub const EPOCH: &str = "epoch";
pub const BOOT: &str = "boot";

/// All database handles
pub struct Dbs {
    pub users: UserDb,
    pub meta: CounterDb,
}

// Global state
pub static ENV: OnceLock<Env> = OnceLock::new();
pub static DBS: OnceLock<Dbs> = OnceLock::new();
pub static TEST_LOCK: Mutex<()> = Mutex::new(());
pub static INIT_PATH: OnceLock<String> = OnceLock::new();

/// Get the database handles, or error if not initialized
#[inline]
pub fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or(RolegateError::NotInitialized)
}

/// Get the environment, or error if not initialized
#[inline]
pub fn env() -> Result<&'static Env> {
    ENV.get().ok_or(RolegateError::NotInitialized)
}

/// Execute a read-only operation
#[inline]
pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(dbs()?, &env()?.read_txn().map_err(err)?)
}

/// Initialize the store at `path` with the default map size
pub fn init(path: &str) -> Result<()> {
    init_with(&Config { db_path: path.to_string(), ..Config::default() })
}

/// Initialize the store. Re-initializing with the same path is a no-op.
pub fn init_with(config: &Config) -> Result<()> {
    let path = config.db_path.as_str();
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(RolegateError::AlreadyInitialized(p.clone()))
        };
    }
    std::fs::create_dir_all(path).map_err(err)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(config.map_size)
            .max_dbs(2)
            .open(Path::new(path))
            .map_err(err)?
    };
    let mut tx = e.write_txn().map_err(err)?;
    let d = Dbs {
        users: e.create_database(&mut tx, Some("users")).map_err(err)?,
        meta: e.create_database(&mut tx, Some("meta")).map_err(err)?,
    };
    tx.commit().map_err(err)?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    tracing::info!(path, "store initialized");
    Ok(())
}

/// Clear all databases (for testing)
pub fn clear_all() -> Result<()> {
    crate::tx::transact(|tx| {
        let d = tx.dbs();
        d.users.clear(tx.tx()).map_err(err)?;
        d.meta.clear(tx.tx()).map_err(err)
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}
