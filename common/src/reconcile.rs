use std::collections::{HashMap, HashSet};

pub const EDIT_LOCK_MS: u64 = 10_000;
pub const POST_SUBMIT_LOCK_MS: u64 = 3_000;
pub const POLL_INTERVAL_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Editing,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditLock {
    pub kind: LockKind,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct EditLocks {
    edit_ms: u64,
    post_submit_ms: u64,
    locks: HashMap<String, EditLock>,
    focused: HashSet<String>,
}

impl Default for EditLocks {
    fn default() -> Self {
        Self::new(EDIT_LOCK_MS, POST_SUBMIT_LOCK_MS)
    }
}

impl EditLocks {
    pub fn new(edit_ms: u64, post_submit_ms: u64) -> Self {
        Self {
            edit_ms,
            post_submit_ms,
            locks: HashMap::new(),
            focused: HashSet::new(),
        }
    }

    pub fn on_input(&mut self, key: &str, now_ms: u64) {
        self.locks.insert(
            key.to_string(),
            EditLock {
                kind: LockKind::Editing,
                expires_at_ms: now_ms + self.edit_ms,
            },
        );
    }

    /// Replaces any edit lock with the shorter post-submit lock.
    pub fn on_submit(&mut self, key: &str, now_ms: u64) {
        self.locks.insert(
            key.to_string(),
            EditLock {
                kind: LockKind::Submitted,
                expires_at_ms: now_ms + self.post_submit_ms,
            },
        );
    }

    pub fn on_focus(&mut self, key: &str) {
        self.focused.insert(key.to_string());
    }

    pub fn on_blur(&mut self, key: &str) {
        self.focused.remove(key);
    }

    pub fn lock(&self, key: &str, now_ms: u64) -> Option<EditLock> {
        self.locks
            .get(key)
            .copied()
            .filter(|lock| now_ms < lock.expires_at_ms)
    }

    pub fn may_refresh(&self, key: &str, now_ms: u64) -> bool {
        !self.focused.contains(key) && self.lock(key, now_ms).is_none()
    }

    pub fn refreshable<'a, V>(
        &mut self,
        polled: impl IntoIterator<Item = (&'a str, V)>,
        now_ms: u64,
    ) -> Vec<(&'a str, V)> {
        self.locks.retain(|_, lock| now_ms < lock.expires_at_ms);
        polled
            .into_iter()
            .filter(|(key, _)| self.may_refresh(key, now_ms))
            .collect()
    }
}
