//! Durable key/value storage - the local-storage analog.
//!
//! Both stores treat the vault as overwrite-only: no read-modify-write, no
//! locking. It is the only resource shared across reloads of the process,
//! and everything in it is a convenience cache except the two token keys,
//! which are the sole source of truth for "is a session claimed".

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Well-known vault keys.
pub mod keys {
    /// Raw access token string.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Raw refresh token string.
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Serialized `{user, is_authenticated}` session snapshot.
    pub const AUTH_SNAPSHOT: &str = "auth-storage";
    /// Serialized `{items, subtotal}` cart snapshot.
    pub const CART_SNAPSHOT: &str = "cart-storage";
}

/// Durable string storage.
///
/// Implementations must tolerate failure silently: a vault write failing is
/// a lost cache entry, not an operation failure, matching browser storage
/// semantics. Implementations log and carry on.
pub trait Vault {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write (or overwrite) a value.
    fn set(&self, key: &str, value: &str);

    /// Delete a value. Deleting an absent key is a no-op.
    fn remove(&self, key: &str);
}

// =============================================================================
// MemoryVault
// =============================================================================

/// In-memory vault. Cloning shares the underlying map, so a session store
/// and a cart store (or a test and its store) can observe each other's
/// writes the way two readers of browser storage would.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Vault for MemoryVault {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

// =============================================================================
// FileVault
// =============================================================================

/// File-backed vault: one file per key under a state directory.
///
/// I/O failures are logged and swallowed - the vault is a cache, and the
/// stores revalidate everything read from it against the backend anyway.
#[derive(Debug, Clone)]
pub struct FileVault {
    dir: PathBuf,
}

impl FileVault {
    /// Open (creating if needed) a vault rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Vault for FileVault {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "vault read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = fs::write(self.path(key), value) {
            tracing::warn!(key, error = %e, "vault write failed");
        }
    }

    fn remove(&self, key: &str) {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(key, error = %e, "vault remove failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_vault_roundtrip() {
        let vault = MemoryVault::new();
        assert!(vault.get(keys::ACCESS_TOKEN).is_none());

        vault.set(keys::ACCESS_TOKEN, "tok-123");
        assert_eq!(vault.get(keys::ACCESS_TOKEN).as_deref(), Some("tok-123"));

        vault.set(keys::ACCESS_TOKEN, "tok-456");
        assert_eq!(vault.get(keys::ACCESS_TOKEN).as_deref(), Some("tok-456"));

        vault.remove(keys::ACCESS_TOKEN);
        assert!(vault.get(keys::ACCESS_TOKEN).is_none());
    }

    #[test]
    fn test_memory_vault_clone_shares_entries() {
        let vault = MemoryVault::new();
        let other = vault.clone();
        vault.set("k", "v");
        assert_eq!(other.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_vault_remove_absent_is_noop() {
        MemoryVault::new().remove("never-set");
    }

    #[test]
    fn test_file_vault_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = FileVault::open(dir.path()).expect("open vault");

        assert!(vault.get(keys::CART_SNAPSHOT).is_none());
        vault.set(keys::CART_SNAPSHOT, r#"{"items":[]}"#);
        assert_eq!(
            vault.get(keys::CART_SNAPSHOT).as_deref(),
            Some(r#"{"items":[]}"#)
        );

        vault.remove(keys::CART_SNAPSHOT);
        assert!(vault.get(keys::CART_SNAPSHOT).is_none());
        // removing again is fine
        vault.remove(keys::CART_SNAPSHOT);
    }

    #[test]
    fn test_file_vault_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let vault = FileVault::open(dir.path()).expect("open vault");
            vault.set(keys::REFRESH_TOKEN, "refresh-1");
        }
        let vault = FileVault::open(dir.path()).expect("reopen vault");
        assert_eq!(vault.get(keys::REFRESH_TOKEN).as_deref(), Some("refresh-1"));
    }
}
