//! Single-slot API key persistence.
//!
//! The key is kept in a plain-text file with no format of its own. Both
//! operations are best-effort: failures are logged and otherwise ignored, so a
//! broken home directory never stops the user from working.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// File name used under the home directory
pub const CREDENTIAL_FILE_NAME: &str = ".news_summarizer_config";

/// Storage for the one credential the application remembers
pub trait CredentialStore: Send + Sync {
    /// Returns the stored key, or an empty string if there is none or it cannot be read
    fn load(&self) -> String;

    /// Overwrites the stored key. Errors are logged, never returned.
    fn save(&self, credential: &str);
}

/// `<home>/.news_summarizer_config`, with `$HOME`, then `$USERPROFILE`, then `.` as home
pub fn default_credential_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(CREDENTIAL_FILE_NAME)
}

/// Credential store backed by a single file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(default_credential_path())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                debug!(path = %self.path.display(), "credential loaded");
                content.trim().to_string()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored credential");
                String::new()
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to load credential");
                String::new()
            }
        }
    }

    fn save(&self, credential: &str) {
        match std::fs::write(&self.path, credential) {
            Ok(()) => info!(path = %self.path.display(), "credential saved"),
            Err(e) => error!(path = %self.path.display(), error = %e, "failed to save credential"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::new(dir.path().join(CREDENTIAL_FILE_NAME));

        store.save("abc");
        assert_eq!(store.load(), "abc");
    }

    #[test]
    fn save_overwrites_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CREDENTIAL_FILE_NAME);
        let store = FileCredentialStore::new(&path);

        store.save("a-much-longer-previous-key");
        store.save("short");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "short");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::new(dir.path().join("absent"));

        assert_eq!(store.load(), "");
    }

    #[test]
    fn load_trims_trailing_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CREDENTIAL_FILE_NAME);
        std::fs::write(&path, "sk-test\n").expect("write");

        assert_eq!(FileCredentialStore::new(&path).load(), "sk-test");
    }

    #[test]
    fn io_errors_are_swallowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a directory cannot be read or written as a file
        let store = FileCredentialStore::new(dir.path());

        store.save("ignored");
        assert_eq!(store.load(), "");
    }
}
