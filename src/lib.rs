//! Install the MemoryONE (vSMP) package into an offline OS image.
//!
//! The image's root partition is mounted on the host, the pseudo-filesystems a
//! chroot needs are layered on top, and a generated bootstrap script runs
//! inside the image. Its combined output is returned for auditing.
//!
//! # Architecture
//!
//! ```text
//! dispatch (status map, compact log, invocation lock)
//!     │
//!     └── orchestrator::InstallOrchestrator
//!             ├── node + installer_url   qualify the node, derive the download URL
//!             ├── script                 materialize the bootstrap script
//!             ├── mount::scoped          root, proc, sys, dev, dev/pts, tmp, efivars
//!             └── chroot::Executor       run the script inside the image
//! ```
//!
//! Mount acquisition is a stack: a failure part-way unwinds what is already
//! mounted, newest first, and a finished run releases everything in reverse.
//!
//! # Example
//!
//! ```rust,ignore
//! use memoryone_installer::{
//!     ChrootExecutor, InstallOrchestrator, InstallerConfig, NodeDescription, SystemMounter,
//! };
//!
//! let node = NodeDescription::load("node.json".as_ref())?;
//! let orchestrator = InstallOrchestrator::new(
//!     InstallerConfig::default(),
//!     SystemMounter::default(),
//!     ChrootExecutor::default(),
//! );
//! println!("{:?}", orchestrator.run(&node));
//! ```

pub mod chroot;
pub mod config;
pub mod dispatch;
pub mod installer_url;
pub mod logging;
pub mod mount;
pub mod node;
pub mod orchestrator;
pub mod preflight;
pub mod script;

pub use chroot::{ChrootExecutor, ExecutionError, ExecutionResult, Executor};
pub use config::{InstallerConfig, VersionSource};
pub use dispatch::{CommandResponse, InvocationLock};
pub use mount::{scoped, MountError, MountHandle, MountSpec, MountStack, Mounter, SystemMounter};
pub use node::NodeDescription;
pub use orchestrator::{ErrorKind, InstallOrchestrator, InstallPlan, InstallResult};
pub use script::{MaterializationError, MaterializedScript, ScriptMaterializer, ScriptSpec};
