//! Permission areas, actions, the key codec and bitmask permission sets
//!
//! A permission is an `(Area, Action)` pair. Its canonical string form is
//! `"{area}.{action}"`, produced only at the storage/transport boundary.
//! Internally sets of permissions are a `u64` mask with one bit per pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Component, Result, RolegateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Users,
    Tasks,
    Reports,
    Settings,
    Tools,
    Dashboard,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Assign,
}

impl Area {
    pub const ALL: [Area; 7] = [
        Area::Users,
        Area::Tasks,
        Area::Reports,
        Area::Settings,
        Area::Tools,
        Area::Dashboard,
        Area::Data,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Area::Users => "users",
            Area::Tasks => "tasks",
            Area::Reports => "reports",
            Area::Settings => "settings",
            Area::Tools => "tools",
            Area::Dashboard => "dashboard",
            Area::Data => "data",
        }
    }
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Approve,
        Action::Assign,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Assign => "assign",
        }
    }
}

impl FromStr for Area {
    type Err = RolegateError;

    fn from_str(s: &str) -> Result<Self> {
        Area::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RolegateError::InvalidPermissionComponent {
                component: Component::Area,
                value: s.to_string(),
            })
    }
}

impl FromStr for Action {
    type Err = RolegateError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RolegateError::InvalidPermissionComponent {
                component: Component::Action,
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protected operation: an action on an area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub area: Area,
    pub action: Action,
}

impl Permission {
    pub const fn new(area: Area, action: Action) -> Self {
        Permission { area, action }
    }

    /// Canonical `"area.action"` key
    pub fn key(self) -> String {
        format!("{}.{}", self.area.as_str(), self.action.as_str())
    }

    /// Bit position inside a [`PermissionSet`]
    #[inline]
    pub const fn bit(self) -> u64 {
        1u64 << (self.area as u32 * Action::ALL.len() as u32 + self.action as u32)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.area, self.action)
    }
}

impl FromStr for Permission {
    type Err = RolegateError;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        decode(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Key codec
// ============================================================================

/// Encode an area and action into `"area.action"`.
/// Fails with `InvalidPermissionComponent` if either is not an enum member.
pub fn encode(area: &str, action: &str) -> Result<String> {
    Ok(Permission::new(area.parse()?, action.parse()?).key())
}

/// Decode `"area.action"`, splitting on the first `.`
pub fn decode(key: &str) -> Result<Permission> {
    split_with(key, '.')
}

/// Like [`decode`] but also accepts the older `"area:action"` form
pub fn decode_legacy(key: &str) -> Result<Permission> {
    decode(key).or_else(|_| split_with(key, ':'))
}

fn split_with(key: &str, sep: char) -> Result<Permission> {
    let malformed = || RolegateError::MalformedPermissionKey(key.to_string());
    let (area, action) = key.split_once(sep).ok_or_else(malformed)?;
    let area = area.parse::<Area>().map_err(|_| malformed())?;
    let action = action.parse::<Action>().map_err(|_| malformed())?;
    Ok(Permission::new(area, action))
}

/// Every valid permission, area-major
pub fn all_permissions() -> impl Iterator<Item = Permission> {
    Area::ALL
        .into_iter()
        .flat_map(|area| Action::ALL.into_iter().map(move |action| Permission::new(area, action)))
}

// ============================================================================
// Permission sets
// ============================================================================

/// Set of permissions as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(u64);

impl PermissionSet {
    pub const EMPTY: PermissionSet = PermissionSet(0);

    pub const fn from_mask(mask: u64) -> Self {
        PermissionSet(mask)
    }

    pub const fn mask(self) -> u64 {
        self.0
    }

    /// Set granting every action on each of `areas`
    pub const fn full(areas: &[Area]) -> Self {
        let mut set = PermissionSet(0);
        let mut i = 0;
        while i < areas.len() {
            set = set.with_actions(areas[i], &Action::ALL);
            i += 1;
        }
        set
    }

    /// Add `actions` on `area`. Usable in const tables.
    pub const fn with_actions(self, area: Area, actions: &[Action]) -> Self {
        let mut mask = self.0;
        let mut i = 0;
        while i < actions.len() {
            mask |= Permission::new(area, actions[i]).bit();
            i += 1;
        }
        PermissionSet(mask)
    }

    #[inline]
    pub fn contains(self, p: Permission) -> bool {
        self.0 & p.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, p: Permission) {
        self.0 |= p.bit();
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_superset(self, other: PermissionSet) -> bool {
        other.0 & !self.0 == 0
    }

    /// Permissions in `self` that are missing from `other`
    pub fn difference(self, other: PermissionSet) -> PermissionSet {
        PermissionSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Permission> {
        all_permissions().filter(move |p| self.contains(*p))
    }

    /// Boundary form: sorted `"area.action"` strings
    pub fn to_keys(self) -> Vec<String> {
        self.iter().map(Permission::key).collect()
    }

    /// Parse keys, failing on the first malformed one
    pub fn parse_strict<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        let mut set = PermissionSet::EMPTY;
        for k in keys {
            set.insert(decode(k.as_ref())?);
        }
        Ok(set)
    }

    /// Parse keys, skipping malformed ones. Returns the set and the rejected keys.
    pub fn parse_lenient<S: AsRef<str>>(keys: &[S]) -> (Self, Vec<String>) {
        let mut set = PermissionSet::EMPTY;
        let mut rejected = Vec::new();
        for k in keys {
            match decode(k.as_ref()) {
                Ok(p) => set.insert(p),
                Err(_) => rejected.push(k.as_ref().to_string()),
            }
        }
        (set, rejected)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = PermissionSet::EMPTY;
        for p in iter {
            set.insert(p);
        }
        set
    }
}
