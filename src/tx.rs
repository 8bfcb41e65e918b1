//! Transaction wrapper for batched writes

use heed::RwTxn;

use crate::db::{dbs, env, Dbs, BOOT, EPOCH};
use crate::error::{err, Result, RolegateError};
use crate::permission::PermissionSet;
use crate::role::Role;
use crate::store::{now_millis, UserRecord};

/// Transaction wrapper for batched writes
pub struct Tx {
    txn: Option<RwTxn<'static>>,
    dbs: &'static Dbs,
}

impl Tx {
    #[inline]
    pub(crate) fn new() -> Result<Self> {
        Ok(Tx {
            txn: Some(env()?.write_txn().map_err(err)?),
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        self.txn.as_mut().expect("transaction used after commit")
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(mut self) -> Result<()> {
        match self.txn.take() {
            Some(t) => t.commit().map_err(err),
            None => Ok(()),
        }
    }

    /// Current claims epoch (0 before the first write)
    pub fn epoch(&mut self) -> Result<u64> {
        Ok(self.dbs.meta.get(self.tx(), EPOCH).map_err(err)?.unwrap_or(0))
    }

    /// Advance the epoch; every record write is stamped with the new value
    fn bump_epoch(&mut self) -> Result<u64> {
        let next = self.epoch()? + 1;
        self.dbs.meta.put(self.tx(), EPOCH, &next).map_err(err)?;
        Ok(next)
    }

    pub fn get_user(&mut self, uid: &str) -> Result<Option<UserRecord>> {
        self.dbs.users.get(self.tx(), uid).map_err(err)
    }

    fn require_user(&mut self, uid: &str) -> Result<UserRecord> {
        self.get_user(uid)?.ok_or_else(|| RolegateError::UserNotFound(uid.to_string()))
    }

    /// Store a record as given, stamping a fresh claims version
    pub fn put_user(&mut self, mut rec: UserRecord) -> Result<u64> {
        rec.claims_version = self.bump_epoch()?;
        rec.updated_at = now_millis();
        self.dbs.users.put(self.tx(), &rec.uid, &rec).map_err(err)?;
        Ok(rec.claims_version)
    }

    /// Load, modify and store a record
    pub fn update_user<F: FnOnce(&mut UserRecord)>(&mut self, uid: &str, f: F) -> Result<u64> {
        let mut rec = self.require_user(uid)?;
        f(&mut rec);
        self.put_user(rec)
    }

    pub fn set_role(&mut self, uid: &str, role: Role) -> Result<u64> {
        self.update_user(uid, |r| r.role = role.claim_id().to_string())
    }

    /// Replace the override list. All keys must decode; nothing is written otherwise.
    pub fn set_custom_permissions<S: AsRef<str>>(&mut self, uid: &str, keys: &[S]) -> Result<u64> {
        let set = PermissionSet::parse_strict(keys)?;
        self.update_user(uid, |r| r.custom_permissions = set.to_keys())
    }

    /// Drop the override so the role defaults apply again
    pub fn reset_custom_permissions(&mut self, uid: &str) -> Result<u64> {
        self.update_user(uid, |r| r.custom_permissions.clear())
    }

    pub fn set_disabled(&mut self, uid: &str, disabled: bool) -> Result<u64> {
        self.update_user(uid, |r| r.disabled = disabled)
    }

    pub fn delete_user(&mut self, uid: &str) -> Result<bool> {
        let removed = self.dbs.users.delete(self.tx(), uid).map_err(err)?;
        if removed {
            self.bump_epoch()?;
        }
        Ok(removed)
    }

    /// Snapshot of every record (for batch jobs inside this transaction)
    pub fn all_users(&mut self) -> Result<Vec<UserRecord>> {
        let mut r = Vec::new();
        for item in self.dbs.users.iter(self.tx()).map_err(err)? {
            let (_, rec) = item.map_err(err)?;
            r.push(rec);
        }
        Ok(r)
    }

    pub(crate) fn is_bootstrapped(&mut self) -> Result<bool> {
        Ok(self.dbs.meta.get(self.tx(), BOOT).map_err(err)?.is_some())
    }

    pub(crate) fn mark_bootstrapped(&mut self) -> Result<()> {
        self.dbs.meta.put(self.tx(), BOOT, &1).map_err(err)
    }
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::new()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
