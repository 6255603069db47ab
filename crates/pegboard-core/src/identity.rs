//! Stable per-client author identity.
//!
//! The id is generated once and kept in a small file so that the same client
//! can delete its own notes across restarts.

use crate::note::AuthorId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// File holding the author id inside the data directory.
pub const AUTHOR_FILE: &str = "author_id";

/// Identity errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not determine a data directory")]
    NoDataDir,
}

/// Generate a fresh author id.
pub fn generate() -> AuthorId {
    AuthorId::new(Uuid::new_v4().simple().to_string())
}

/// Load the author id stored in `dir`, creating it on first use.
pub fn load_or_create_in(dir: &Path) -> Result<AuthorId, IdentityError> {
    let path = dir.join(AUTHOR_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => {
            let id = contents.trim();
            if !id.is_empty() {
                return Ok(AuthorId::new(id));
            }
            log::warn!("{} is empty, generating a new author id", path.display());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    fs::create_dir_all(dir)?;
    let id = generate();
    fs::write(&path, id.as_str())?;
    log::info!("created author id {id} in {}", path.display());
    Ok(id)
}

/// Default directory for the author id.
///
/// On Unix: `~/.local/share/pegboard/`
/// On Windows: `%LOCALAPPDATA%\pegboard\`
#[cfg(not(target_arch = "wasm32"))]
pub fn default_dir() -> Result<PathBuf, IdentityError> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or(IdentityError::NoDataDir)?;
    Ok(base.join("pegboard"))
}

/// Load or create the author id in [`default_dir`].
#[cfg(not(target_arch = "wasm32"))]
pub fn load_or_create() -> Result<AuthorId, IdentityError> {
    load_or_create_in(&default_dir()?)
}
