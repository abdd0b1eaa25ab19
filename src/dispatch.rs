//! Glue between the agent command framework and the orchestrator.
//!
//! The agent expects a flat status map: `{"status": ...}` plus a compact log
//! on success. The log travels as base64 of a gzip'd tar archive holding a
//! single `log` member, the same shape the agent uses for other command logs.

use crate::orchestrator::InstallResult;
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default lock serializing invocations on one node.
pub const DEFAULT_LOCK_PATH: &str = "/run/memoryone-install.lock";

const LOG_MEMBER: &str = "log";

/// Status map returned to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn from_result(result: &InstallResult) -> Result<Self> {
        let response = match result {
            InstallResult::RequirementNotMet { reason } => Self {
                status: reason.clone(),
                log: None,
                error_kind: None,
                message: None,
            },
            InstallResult::Success { log } => Self {
                status: "success".to_string(),
                log: Some(encode_compact_log(log).context("encoding install log")?),
                error_kind: None,
                message: None,
            },
            InstallResult::Failure {
                error_kind,
                message,
            } => Self {
                status: "failure".to_string(),
                log: None,
                error_kind: Some(error_kind.to_string()),
                message: Some(message.clone()),
            },
        };
        Ok(response)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serializing command response")
    }
}

/// base64(gzip(tar{"log": log})).
pub fn encode_compact_log(log: &str) -> Result<String> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(log.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_cksum();
    builder.append_data(&mut header, LOG_MEMBER, log.as_bytes())?;

    let gz = builder.into_inner()?.finish()?;
    Ok(STANDARD.encode(gz))
}

/// Inverse of [`encode_compact_log`].
pub fn decode_compact_log(compact: &str) -> Result<String> {
    let gz = STANDARD
        .decode(compact.trim())
        .context("decoding base64 log")?;
    let mut archive = tar::Archive::new(GzDecoder::new(gz.as_slice()));

    for entry in archive.entries().context("reading log archive")? {
        let mut entry = entry.context("reading log archive entry")?;
        if &*entry.path()? != Path::new(LOG_MEMBER) {
            continue;
        }
        let mut log = String::new();
        entry
            .read_to_string(&mut log)
            .context("reading log member")?;
        return Ok(log);
    }
    bail!("log archive has no '{}' member", LOG_MEMBER)
}

/// Exclusive per-node lock held for the duration of one invocation.
///
/// The lock file is left in place on release; unlinking a lock file another
/// process may already hold would let a third process lock a fresh inode.
#[derive(Debug)]
pub struct InvocationLock {
    _file: File,
    path: PathBuf,
}

impl InvocationLock {
    /// Take the lock without waiting. A held lock is an error.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating lock directory '{}'", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("opening lock file '{}'", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            bail!(
                "another install is already running on this node (lock '{}')",
                path.display()
            );
        }

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
