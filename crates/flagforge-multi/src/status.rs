use std::collections::HashMap;
use std::sync::RwLock;

use flagforge_core::Status;

/// Tracks each sub-provider's last-observed status and folds them into one
/// overall status via [`Status::worse_of`]. Config-change events never touch
/// this: callers only feed `record` a `Status`, and `Status::Ready` is what a
/// `ConfigurationChanged` event maps to anyway, so a configuration change
/// never makes the aggregate worse.
pub struct StatusTracker {
    per_sub: RwLock<HashMap<String, Status>>,
}

impl StatusTracker {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let per_sub = names.into_iter().map(|n| (n, Status::NotReady)).collect();
        Self { per_sub: RwLock::new(per_sub) }
    }

    /// Records `status` for `name` and returns the new overall status.
    pub fn record(&self, name: &str, status: Status) -> Status {
        let mut guard = self.per_sub.write().unwrap();
        guard.insert(name.to_string(), status);
        Self::fold(&guard)
    }

    pub fn overall(&self) -> Status {
        Self::fold(&self.per_sub.read().unwrap())
    }

    fn fold(guard: &HashMap<String, Status>) -> Status {
        guard.values().copied().fold(Status::Ready, Status::worse_of)
    }
}
