//! Filesystem mounts acquired for the duration of one install.
//!
//! A [`MountSpec`] describes one desired mount, a [`MountHandle`] records that
//! it is held, and a [`MountStack`] holds an ordered group of handles and
//! releases them in reverse. All OS interaction goes through the [`Mounter`]
//! trait so the stacking logic can be exercised without root privileges.
//!
//! # Example
//!
//! ```rust,ignore
//! use memoryone_installer::mount::{scoped, MountSpec, SystemMounter};
//!
//! let specs = vec![
//!     MountSpec::new("LABEL=img-rootfs", "/mnt/root"),
//!     MountSpec::pseudo("proc", "/mnt/root/proc"),
//! ];
//! scoped(&SystemMounter::default(), &specs, |stack| {
//!     println!("{} mounts held", stack.len());
//!     Ok::<(), std::convert::Infallible>(())
//! })?;
//! ```

mod mountinfo;
mod stack;
mod system;

pub use mountinfo::{mount_points, parse_mountinfo};
pub use stack::{scoped, MountStack, ScopeError};
pub use system::{is_already_mounted_message, SystemMounter};

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One desired mount. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    source: String,
    target: PathBuf,
    fs_type: Option<String>,
    options: Vec<String>,
}

impl MountSpec {
    /// Mount `source` (a device, `LABEL=...` or `UUID=...`) at `target`.
    pub fn new(source: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            fs_type: None,
            options: Vec::new(),
        }
    }

    /// Bind mount the host path `source` at `target`.
    pub fn bind(source: impl AsRef<Path>, target: impl Into<PathBuf>) -> Self {
        Self::new(source.as_ref().to_string_lossy(), target).with_options(["bind"])
    }

    /// Mount a pseudo-filesystem such as `proc`, `sysfs` or `efivarfs`.
    pub fn pseudo(fs_type: &str, target: impl Into<PathBuf>) -> Self {
        Self {
            source: fs_type.to_string(),
            target: target.into(),
            fs_type: Some(fs_type.to_string()),
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn fs_type(&self) -> Option<&str> {
        self.fs_type.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target.display())?;
        if let Some(fs_type) = &self.fs_type {
            write!(f, " ({})", fs_type)?;
        }
        if !self.options.is_empty() {
            write!(f, " [{}]", self.options.join(","))?;
        }
        Ok(())
    }
}

/// Errors raised while acquiring or releasing mounts.
#[derive(Debug, Error)]
pub enum MountError {
    /// The mount operation refused because the target is already mounted.
    ///
    /// Acquisition treats this as success: the is-mounted probe is known to
    /// report false negatives inside minimal roots.
    #[error("'{}' is already mounted", .target.display())]
    AlreadyMounted { target: PathBuf },

    #[error("mounting {spec} failed: {cause}")]
    Mount { spec: MountSpec, cause: String },

    #[error("unmounting '{}' failed: {cause}", .target.display())]
    Unmount { target: PathBuf, cause: String },

    #[error("{} unmounts failed during teardown: {}", .failures.len(), join_failures(.failures))]
    Teardown { failures: Vec<MountError> },
}

fn join_failures(failures: &[MountError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// OS seam for mounting.
pub trait Mounter {
    /// Best-effort probe; may report false negatives.
    fn is_mounted(&self, target: &Path) -> bool;

    /// Perform the mount. Implementations report an "already mounted"
    /// refusal as [`MountError::AlreadyMounted`].
    fn mount(&self, spec: &MountSpec) -> Result<(), MountError>;

    fn unmount(&self, target: &Path) -> Result<(), MountError>;
}

impl<M: Mounter + ?Sized> Mounter for &M {
    fn is_mounted(&self, target: &Path) -> bool {
        (**self).is_mounted(target)
    }

    fn mount(&self, spec: &MountSpec) -> Result<(), MountError> {
        (**self).mount(spec)
    }

    fn unmount(&self, target: &Path) -> Result<(), MountError> {
        (**self).unmount(target)
    }
}

/// A held mount. Owns the obligation to unmount its target.
#[derive(Debug)]
pub struct MountHandle {
    spec: MountSpec,
    acquired: bool,
    /// False when the target was found mounted before acquisition.
    owned: bool,
}

impl MountHandle {
    /// Mount `spec` unless its target is already mounted.
    ///
    /// A target the probe reports as mounted belongs to someone else and is
    /// left mounted on release. A target only the mount call reports as
    /// already mounted is released like any other.
    pub fn acquire(mounter: &dyn Mounter, spec: MountSpec) -> Result<Self, MountError> {
        if mounter.is_mounted(spec.target()) {
            debug!("{} already mounted, not remounting", spec.target().display());
            return Ok(Self {
                spec,
                acquired: true,
                owned: false,
            });
        }

        match mounter.mount(&spec) {
            Ok(()) => debug!("mounted {}", spec),
            Err(MountError::AlreadyMounted { target }) => {
                debug!(
                    "{} reported as already mounted by mount, treating as held",
                    target.display()
                );
            }
            Err(MountError::Mount { cause, .. }) => return Err(MountError::Mount { spec, cause }),
            Err(other) => {
                return Err(MountError::Mount {
                    spec,
                    cause: other.to_string(),
                })
            }
        }

        Ok(Self {
            spec,
            acquired: true,
            owned: true,
        })
    }

    pub fn spec(&self) -> &MountSpec {
        &self.spec
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Whether release unmounts the target.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Unmount the target. A second call, or a call on a handle that never
    /// completed acquisition, does nothing.
    pub fn release(&mut self, mounter: &dyn Mounter) -> Result<(), MountError> {
        if !self.acquired {
            return Ok(());
        }
        self.acquired = false;
        if !self.owned {
            debug!("leaving pre-existing mount {} in place", self.spec.target().display());
            return Ok(());
        }

        match mounter.unmount(self.spec.target()) {
            Ok(()) => {
                debug!("unmounted {}", self.spec.target().display());
                Ok(())
            }
            Err(err @ MountError::Unmount { .. }) => Err(err),
            Err(other) => Err(MountError::Unmount {
                target: self.spec.target().to_path_buf(),
                cause: other.to_string(),
            }),
        }
    }
}
