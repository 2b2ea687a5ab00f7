use ahash::AHashSet;
use std::sync::Mutex;

/// Remembers which warning keys were already reported.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: Mutex<AHashSet<String>>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `key` is seen.
    pub fn first(&self, key: &str) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seen.contains(key) {
            return false;
        }
        seen.insert(key.to_string())
    }
}
