//! Ordered groups of mounts with reverse-order teardown.

use super::{MountError, MountHandle, MountSpec, Mounter};
use log::{info, warn};
use std::fmt;
use std::path::Path;

/// Mounts acquired together, released in exact reverse order of acquisition.
///
/// Dropping a stack that still holds mounts unwinds it, so an early return or
/// a panic inside a [`scoped`] body never leaks a mount.
pub struct MountStack<'m> {
    mounter: &'m dyn Mounter,
    handles: Vec<MountHandle>,
}

impl<'m> MountStack<'m> {
    pub fn new(mounter: &'m dyn Mounter) -> Self {
        Self {
            mounter,
            handles: Vec::new(),
        }
    }

    /// Acquire `spec` and record it on top of the stack.
    ///
    /// If acquisition fails, everything already held is released (newest
    /// first) before the acquisition error is returned.
    pub fn push(&mut self, spec: MountSpec) -> Result<(), MountError> {
        match MountHandle::acquire(self.mounter, spec) {
            Ok(handle) => {
                self.handles.push(handle);
                Ok(())
            }
            Err(err) => {
                if let Err(unwind_err) = self.unwind() {
                    warn!("unwinding after failed mount: {}", unwind_err);
                }
                Err(err)
            }
        }
    }

    /// Release every held mount, newest first.
    ///
    /// Every release is attempted even if an earlier one fails. One failure is
    /// returned as-is; several are aggregated into [`MountError::Teardown`].
    pub fn unwind(&mut self) -> Result<(), MountError> {
        let mut failures = Vec::new();
        while let Some(mut handle) = self.handles.pop() {
            if let Err(err) = handle.release(self.mounter) {
                warn!("{}", err);
                failures.push(err);
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(MountError::Teardown { failures }),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Targets in acquisition order.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.handles.iter().map(|handle| handle.spec().target())
    }
}

impl Drop for MountStack<'_> {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        if let Err(err) = self.unwind() {
            warn!("teardown on drop incomplete: {}", err);
        }
    }
}

/// Failure of a [`scoped`] block.
#[derive(Debug)]
pub enum ScopeError<T, E> {
    /// Acquiring a mount failed; the body never ran.
    Mount(MountError),
    /// The body itself failed. Takes precedence over a teardown failure.
    Body(E),
    /// The body succeeded but releasing the mounts failed. The body's value
    /// is handed back so its output is not lost.
    Teardown { value: T, error: MountError },
}

impl<T, E: fmt::Display> fmt::Display for ScopeError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Mount(err) => write!(f, "{}", err),
            ScopeError::Body(err) => write!(f, "{}", err),
            ScopeError::Teardown { error, .. } => write!(f, "{}", error),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug + fmt::Display> std::error::Error for ScopeError<T, E> {}

/// Acquire `specs` in order, run `body`, then release everything in reverse.
///
/// Teardown happens on every exit path, including a panic in `body`.
pub fn scoped<T, E>(
    mounter: &dyn Mounter,
    specs: &[MountSpec],
    body: impl FnOnce(&MountStack<'_>) -> Result<T, E>,
) -> Result<T, ScopeError<T, E>> {
    let mut stack = MountStack::new(mounter);
    for spec in specs {
        info!("mounting {}", spec);
        stack.push(spec.clone()).map_err(ScopeError::Mount)?;
    }

    let outcome = body(&stack);
    let teardown = stack.unwind();

    match (outcome, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(error)) => Err(ScopeError::Teardown { value, error }),
        (Err(err), Ok(())) => Err(ScopeError::Body(err)),
        (Err(err), Err(teardown_err)) => {
            warn!("teardown after failed body also failed: {}", teardown_err);
            Err(ScopeError::Body(err))
        }
    }
}
