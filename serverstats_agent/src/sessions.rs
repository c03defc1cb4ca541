//! Open-session ledger and the per-tick roster diff.
//!
//! The ledger holds the authoritative open set in memory; the store only
//! mirrors the transitions it emits. One successful snapshot per tick is
//! diffed against the open set: new identities open, vanished ones close,
//! everything else continues untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::RosterMember;

/// Case-insensitive composite key: trim each part, join with `|`, upper-case.
/// Used for session identities and (with a single part) drive-name grouping,
/// so both reconciliation passes agree on what "the same name" means.
pub fn ident_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join("|")
        .to_uppercase()
}

/// One currently-open session interval.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSession {
    pub user_name: String,
    pub employee_number: Option<String>,
    pub opened_at: DateTime<Utc>,
}

/// A session closed by a snapshot that no longer lists its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub user_name: String,
    pub employee_number: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

/// Transitions produced by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDelta {
    pub opens: Vec<OpenSession>,
    pub closes: Vec<ClosedSession>,
}

impl SessionDelta {
    pub fn is_empty(&self) -> bool {
        self.opens.is_empty() && self.closes.is_empty()
    }
}

/// Open sessions keyed by identity; at most one open entry per key.
#[derive(Debug, Default)]
pub struct SessionLedger {
    open: BTreeMap<String, OpenSession>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Diff a roster snapshot against the open set. Duplicates in the
    /// snapshot collapse onto one key; members with an empty user name are
    /// dropped before diffing. A genuinely empty snapshot closes everything.
    pub fn reconcile(&mut self, snapshot: &[RosterMember], now: DateTime<Utc>) -> SessionDelta {
        let mut current: BTreeMap<String, &RosterMember> = BTreeMap::new();
        for member in snapshot {
            let user = member.user_name.trim();
            if user.is_empty() {
                continue;
            }
            let emp = member.employee_number.as_deref().unwrap_or("");
            let key = ident_key(&[user, emp]);
            current.entry(key).or_insert(member);
        }

        let mut delta = SessionDelta::default();

        for (key, member) in &current {
            if self.open.contains_key(key) {
                continue;
            }
            let session = OpenSession {
                user_name: member.user_name.trim().to_string(),
                employee_number: member
                    .employee_number
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
                opened_at: now,
            };
            self.open.insert(key.clone(), session.clone());
            delta.opens.push(session);
        }

        let gone: Vec<String> = self
            .open
            .keys()
            .filter(|k| !current.contains_key(*k))
            .cloned()
            .collect();
        for key in gone {
            if let Some(session) = self.open.remove(&key) {
                delta.closes.push(ClosedSession {
                    user_name: session.user_name,
                    employee_number: session.employee_number,
                    opened_at: session.opened_at,
                    closed_at: now,
                });
            }
        }

        delta
    }
}
