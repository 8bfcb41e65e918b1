//! Bootstrap and system initialization

use crate::db::{read, BOOT};
use crate::error::{err, Result, RolegateError};
use crate::role::Role;
use crate::store::UserRecord;
use crate::tx::transact;

/// Check if the first system owner has been created
pub fn is_bootstrapped() -> Result<bool> {
    read(|d, tx| Ok(d.meta.get(tx, BOOT).map_err(err)?.is_some()))
}

/// Create the first system owner. Returns its claims version.
pub fn bootstrap(root_uid: &str) -> Result<u64> {
    let v = transact(|tx| {
        if tx.is_bootstrapped()? {
            return Err(RolegateError::AlreadyBootstrapped);
        }
        let v = tx.put_user(UserRecord::system(root_uid, Role::SystemOwner))?;
        tx.mark_bootstrapped()?;
        Ok(v)
    })?;
    tracing::info!(root_uid, "bootstrapped system owner");
    Ok(v)
}
