//! Transient executable scripts.
//!
//! [`ScriptMaterializer::materialize`] writes a script body into a private
//! temporary directory and marks it executable. The directory lives exactly as
//! long as the returned [`MaterializedScript`].

pub mod template;

pub use template::{render_install_script, ScriptParams};

use log::debug;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

/// File name of the script inside its temporary directory.
pub const SCRIPT_FILE_NAME: &str = "install.sh";

const TEMP_DIR_PREFIX: &str = "memoryone-";

/// What to write and where to allocate the private directory.
#[derive(Debug, Clone)]
pub struct ScriptSpec {
    pub body: String,
    pub working_directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum MaterializationError {
    #[error("creating script directory under '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("writing '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("setting executable permissions on '{}': {source}", .path.display())]
    Permissions { path: PathBuf, source: io::Error },

    #[error("removing script directory '{}': {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
}

/// An executable script on disk. Removed, with its directory, on drop.
#[derive(Debug)]
pub struct MaterializedScript {
    dir: TempDir,
    path: PathBuf,
    digest: String,
}

impl MaterializedScript {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Hex sha256 of the script body.
    pub fn sha256(&self) -> &str {
        &self.digest
    }

    /// Place an extra file next to the script.
    pub fn write_companion(&self, name: &str, contents: &[u8]) -> Result<PathBuf, MaterializationError> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).map_err(|source| MaterializationError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<(), MaterializationError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| MaterializationError::Remove { path, source })
    }
}

/// Writes scripts to private temporary directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptMaterializer;

impl ScriptMaterializer {
    pub fn materialize(&self, spec: &ScriptSpec) -> Result<MaterializedScript, MaterializationError> {
        fs::create_dir_all(&spec.working_directory).map_err(|source| {
            MaterializationError::CreateDir {
                path: spec.working_directory.clone(),
                source,
            }
        })?;

        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(&spec.working_directory)
            .map_err(|source| MaterializationError::CreateDir {
                path: spec.working_directory.clone(),
                source,
            })?;

        let path = dir.path().join(SCRIPT_FILE_NAME);
        fs::write(&path, &spec.body).map_err(|source| MaterializationError::Write {
            path: path.clone(),
            source,
        })?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(|source| {
            MaterializationError::Permissions {
                path: path.clone(),
                source,
            }
        })?;

        let digest = hex_sha256(spec.body.as_bytes());
        debug!("materialized {} (sha256 {})", path.display(), digest);

        Ok(MaterializedScript { dir, path, digest })
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
