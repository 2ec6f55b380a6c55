//! Durable credential storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Holds the two credential slots independently of the in-memory session so a
//! restarted process (the equivalent of a page reload) can hydrate itself.
//! Only the session store and the request interceptor touch this module.
//!
//! Every credential is kept as a cookie carrying `Secure` and
//! `SameSite=Strict`. File-backed jars drop any persisted cookie that lost
//! those attributes instead of trusting it.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use cookie::{Cookie, CookieJar, SameSite};

/// Slot holding the short-lived bearer credential.
pub const ACCESS_TOKEN_SLOT: &str = "access_token";
/// Slot holding the long-lived refresh credential.
pub const REFRESH_TOKEN_SLOT: &str = "refresh_token";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key/value credential storage. Writes complete before the call returns.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, name: &str) -> Result<(), PersistenceError>;

    /// Write two slots together. Durable stores either keep both new values
    /// or neither.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    fn set_pair(&self, entries: [(&str, &str); 2]) -> Result<(), PersistenceError> {
        for (name, value) in entries {
            self.set(name, value)?;
        }
        Ok(())
    }
}

/// Build the cookie used for a credential slot.
#[must_use]
pub fn credential_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::build((name.to_owned(), value.to_owned()))
        .path("/")
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

fn meets_policy(cookie: &Cookie<'_>) -> bool {
    cookie.secure() == Some(true) && cookie.same_site() == Some(SameSite::Strict)
}

fn lock_jar(jar: &Mutex<CookieJar>) -> MutexGuard<'_, CookieJar> {
    jar.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-lifetime jar. Used by tests and by embedders that persist
/// elsewhere.
#[derive(Default)]
pub struct MemoryCredentialStore {
    jar: Mutex<CookieJar>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored cookie for `name`, attributes included.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        lock_jar(&self.jar).get(name).cloned()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        lock_jar(&self.jar).get(name).map(|c| c.value().to_owned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError> {
        lock_jar(&self.jar).add(credential_cookie(name, value));
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), PersistenceError> {
        lock_jar(&self.jar).remove(Cookie::from(name.to_owned()));
        Ok(())
    }
}

// =============================================================================
// FILE-BACKED
// =============================================================================

/// Jar written through to a JSON file (one serialized cookie per entry) on
/// every mutation.
pub struct FileCredentialStore {
    path: PathBuf,
    jar: Mutex<CookieJar>,
}

impl FileCredentialStore {
    /// Open the jar at `path`, creating nothing until the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON array of strings. Individual unparseable or insecure cookies are
    /// skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let mut jar = CookieJar::new();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let entries: Vec<String> = if raw.trim().is_empty() { Vec::new() } else { serde_json::from_str(&raw)? };
            for entry in entries {
                match Cookie::parse(entry) {
                    Ok(cookie) if meets_policy(&cookie) => jar.add_original(cookie),
                    Ok(cookie) => {
                        tracing::warn!(name = cookie.name(), path = %path.display(), "discarding credential without secure/strict attributes");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, path = %path.display(), "discarding unparseable credential entry");
                    }
                }
            }
        }
        Ok(Self { path, jar: Mutex::new(jar) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, jar: &CookieJar) -> Result<(), PersistenceError> {
        let entries: Vec<String> = jar.iter().map(ToString::to_string).collect();
        let bytes = serde_json::to_vec_pretty(&entries)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        let mut file = open_private(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy of the jar and keep it only once the file
    /// holds it.
    fn update(&self, change: impl FnOnce(&mut CookieJar)) -> Result<(), PersistenceError> {
        let mut jar = lock_jar(&self.jar);
        let mut next = jar.clone();
        change(&mut next);
        self.flush(&next)?;
        *jar = next;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        lock_jar(&self.jar).get(name).map(|c| c.value().to_owned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PersistenceError> {
        self.update(|jar| jar.add(credential_cookie(name, value)))
    }

    fn remove(&self, name: &str) -> Result<(), PersistenceError> {
        self.update(|jar| jar.remove(Cookie::from(name.to_owned())))
    }

    fn set_pair(&self, entries: [(&str, &str); 2]) -> Result<(), PersistenceError> {
        self.update(|jar| {
            for (name, value) in entries {
                jar.add(credential_cookie(name, value));
            }
        })
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt as _;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
