//! [`Mounter`] backed by the host's `mount(8)` and `umount(8)`.

use super::mountinfo::mount_points;
use super::{MountError, MountSpec, Mounter};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Mounts through the util-linux command line tools.
#[derive(Debug, Clone)]
pub struct SystemMounter {
    mount_bin: PathBuf,
    umount_bin: PathBuf,
}

impl Default for SystemMounter {
    fn default() -> Self {
        Self {
            mount_bin: PathBuf::from("mount"),
            umount_bin: PathBuf::from("umount"),
        }
    }
}

impl SystemMounter {
    pub fn with_binaries(mount_bin: impl Into<PathBuf>, umount_bin: impl Into<PathBuf>) -> Self {
        Self {
            mount_bin: mount_bin.into(),
            umount_bin: umount_bin.into(),
        }
    }

    fn mount_command(&self, spec: &MountSpec) -> Command {
        let mut cmd = Command::new(&self.mount_bin);
        if let Some(fs_type) = spec.fs_type() {
            cmd.arg("-t").arg(fs_type);
        }
        if !spec.options().is_empty() {
            cmd.arg("-o").arg(spec.options().join(","));
        }
        cmd.arg(spec.source()).arg(spec.target());
        cmd
    }
}

/// Whether a `mount(8)` diagnostic says the target is already mounted.
///
/// util-linux reports both "already mounted on" and "already mounted or mount
/// point busy"; both mean the requested state already holds.
pub fn is_already_mounted_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("already mounted")
}

impl Mounter for SystemMounter {
    fn is_mounted(&self, target: &Path) -> bool {
        if let Some(points) = mount_points() {
            return points.iter().any(|point| point == target);
        }
        is_mount_point_by_device(target)
    }

    fn mount(&self, spec: &MountSpec) -> Result<(), MountError> {
        if !spec.target().exists() {
            fs::create_dir_all(spec.target()).map_err(|e| MountError::Mount {
                spec: spec.clone(),
                cause: format!("creating mount point: {}", e),
            })?;
        }

        let output = self
            .mount_command(spec)
            .output()
            .map_err(|e| MountError::Mount {
                spec: spec.clone(),
                cause: format!("running {}: {}", self.mount_bin.display(), e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_already_mounted_message(&stderr) {
            return Err(MountError::AlreadyMounted {
                target: spec.target().to_path_buf(),
            });
        }
        Err(MountError::Mount {
            spec: spec.clone(),
            cause: format!("{} ({})", stderr.trim(), output.status),
        })
    }

    fn unmount(&self, target: &Path) -> Result<(), MountError> {
        let output = Command::new(&self.umount_bin)
            .arg(target)
            .output()
            .map_err(|e| MountError::Unmount {
                target: target.to_path_buf(),
                cause: format!("running {}: {}", self.umount_bin.display(), e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(MountError::Unmount {
            target: target.to_path_buf(),
            cause: format!("{} ({})", stderr.trim(), output.status),
        })
    }
}

/// A path is a mount point when it sits on a different device than its
/// parent, or is the same inode as its parent (`/`). Misses bind mounts of a
/// directory onto the same device.
fn is_mount_point_by_device(target: &Path) -> bool {
    let Ok(meta) = fs::symlink_metadata(target) else {
        return false;
    };
    if meta.file_type().is_symlink() {
        return false;
    }
    let parent = target.join("..");
    let Ok(parent_meta) = fs::metadata(&parent) else {
        return false;
    };
    meta.dev() != parent_meta.dev() || meta.ino() == parent_meta.ino()
}
