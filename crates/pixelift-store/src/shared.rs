//! Process-wide shared store handle.
//!
//! Opening `RocksDB` takes an exclusive lock on the data directory, so the
//! process must hold exactly one handle. [`shared`] memoizes the first
//! successful open for the life of the process; concurrent first-time callers
//! coalesce onto one open instead of racing.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::rocks::RocksStore;

static SHARED: Mutex<Option<Arc<RocksStore>>> = Mutex::new(None);

/// Get the process-wide store, opening it at `path` on first call.
///
/// Later calls return the memoized handle and ignore `path`. The lock is held
/// across the open, so concurrent initial calls wait for the first open
/// rather than opening duplicates.
///
/// # Errors
///
/// Returns an error if the database cannot be opened. A failed open is not
/// memoized; the next call retries.
pub fn shared<P: AsRef<Path>>(path: P) -> Result<Arc<RocksStore>> {
    let mut guard = SHARED.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(store) = guard.as_ref() {
        return Ok(Arc::clone(store));
    }

    tracing::info!(path = %path.as_ref().display(), "Opening shared RocksDB store");
    let store = Arc::new(RocksStore::open(path)?);
    *guard = Some(Arc::clone(&store));
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repeated_calls_return_the_same_handle() {
        let dir = TempDir::new().unwrap();

        let first = shared(dir.path()).unwrap();
        // The second path is ignored; the memoized handle wins.
        let second = shared("/nonexistent/ignored").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }
}
