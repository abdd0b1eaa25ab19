//! Single-pass install pipeline.
//!
//! ```text
//! precondition -> image properties -> installer URL -> materialize script
//!     -> mount stack -> chroot exec -> teardown -> result
//! ```
//!
//! Every step either hands its output to the next or ends the run with an
//! [`InstallResult`]. Nothing is retried here; the download retries live in
//! the generated script.
//!
//! Invocations must be serialized by the caller: the mount points are fixed
//! paths and two concurrent runs would fight over them.

use crate::chroot::{ExecutionError, ExecutionResult, Executor};
use crate::config::{InstallerConfig, TargetConfig, VersionSource};
use crate::installer_url::{
    installer_download_url, installer_name, network_location_host, parent_domain,
};
use crate::mount::{scoped, MountError, MountSpec, Mounter, ScopeError};
use crate::node::{read_config_drive_value, string_property, NodeDescription};
use crate::script::template::RESOLV_CONF_COMPANION;
use crate::script::{
    render_install_script, MaterializedScript, ScriptMaterializer, ScriptParams, ScriptSpec,
};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Terminal outcome of one install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum InstallResult {
    /// The node does not qualify; nothing was touched.
    RequirementNotMet { reason: String },
    /// The installer ran. Its exit status is in the log, not here.
    Success { log: String },
    Failure { error_kind: ErrorKind, message: String },
}

impl InstallResult {
    fn not_met(reason: impl Into<String>) -> Self {
        InstallResult::RequirementNotMet {
            reason: reason.into(),
        }
    }

    fn failure(error_kind: ErrorKind, message: impl fmt::Display) -> Self {
        InstallResult::Failure {
            error_kind,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Materialization,
    Mount,
    Execution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Materialization => "materialization",
            ErrorKind::Mount => "mount",
            ErrorKind::Execution => "execution",
        };
        f.write_str(name)
    }
}

/// Everything derived from the node before anything is written or mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub domain: String,
    pub version: String,
    pub installer_name: String,
    pub download_url: String,
}

/// Mounts needed to run a command chrooted into the image at `target`,
/// in acquisition order.
pub fn mount_plan(target: &TargetConfig) -> Vec<MountSpec> {
    let root = &target.mount_point;
    let mut specs = vec![
        MountSpec::new(target.root_device.clone(), root.clone()),
        MountSpec::pseudo("proc", root.join("proc")),
        MountSpec::pseudo("sysfs", root.join("sys")),
        MountSpec::bind("/dev", root.join("dev")),
        MountSpec::bind("/dev/pts", root.join("dev/pts")),
        MountSpec::bind("/tmp", root.join("tmp")),
    ];
    if target.include_efi_mount {
        specs.push(MountSpec::pseudo(
            "efivarfs",
            root.join("sys/firmware/efi/efivars"),
        ));
    }
    specs
}

pub struct InstallOrchestrator<M, X> {
    config: InstallerConfig,
    mounter: M,
    executor: X,
    materializer: ScriptMaterializer,
}

impl<M: Mounter, X: Executor> InstallOrchestrator<M, X> {
    pub fn new(config: InstallerConfig, mounter: M, executor: X) -> Self {
        Self {
            config,
            mounter,
            executor,
            materializer: ScriptMaterializer,
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn run(&self, node: &NodeDescription) -> InstallResult {
        match self.try_run(node) {
            Ok(result) | Err(result) => result,
        }
    }

    fn try_run(&self, node: &NodeDescription) -> Result<InstallResult, InstallResult> {
        let plan = self.plan(node)?;
        info!(
            "installing {} from {} (domain {})",
            plan.installer_name, plan.download_url, plan.domain
        );

        let script = self.materialize(&plan)?;
        let root = self.config.target.mount_point.clone();
        let argv = vec![
            "/bin/bash".to_string(),
            script.path().to_string_lossy().into_owned(),
        ];

        let specs = mount_plan(&self.config.target);
        let outcome = scoped(&self.mounter, &specs, |_| self.executor.run(&root, &argv));

        let result = match outcome {
            Ok(execution) => {
                log_exit_status(&execution);
                InstallResult::Success {
                    log: execution.combined_output,
                }
            }
            Err(ScopeError::Mount(err)) => InstallResult::failure(ErrorKind::Mount, err),
            Err(ScopeError::Body(err)) => execution_failure(err),
            Err(ScopeError::Teardown {
                value: execution,
                error,
            }) => teardown_failure(&execution, error),
        };

        if let Err(err) = script.close() {
            warn!("{}", err);
        }
        Ok(result)
    }

    /// Steps 1-3: qualify the node and derive the installer location.
    pub fn plan(&self, node: &NodeDescription) -> Result<InstallPlan, InstallResult> {
        let node_config = &self.config.node;
        if !node.has_trait(&node_config.required_trait) {
            return Err(InstallResult::not_met("required trait missing"));
        }

        let props = node
            .image_properties()
            .ok_or_else(|| InstallResult::not_met("image property missing"))?;
        let image_url = string_property(props, &node_config.image_url_property)
            .ok_or_else(|| InstallResult::not_met("image url missing"))?;
        let host = network_location_host(image_url)
            .ok_or_else(|| InstallResult::not_met("image url has no network location"))?;
        let domain = parent_domain(&host)
            .ok_or_else(|| InstallResult::not_met("image url host has no parent domain"))?
            .to_string();
        if !is_shell_safe(&domain, &['-', '.']) {
            return Err(InstallResult::not_met(format!(
                "image url host '{}' is not a DNS name",
                host
            )));
        }

        let version = match self.config.version.source {
            VersionSource::ImageProperty => {
                string_property(props, &node_config.version_property).map(str::to_string)
            }
            VersionSource::ConfigDrive => self.config_drive_version()?,
        }
        .unwrap_or_else(|| self.config.version.default.clone());
        if !is_shell_safe(&version, &['-', '.', '_', '+']) {
            return Err(InstallResult::not_met(format!(
                "installer version '{}' contains unsupported characters",
                version
            )));
        }

        let repository = &self.config.repository;
        Ok(InstallPlan {
            download_url: installer_download_url(
                &repository.host_prefix,
                &domain,
                &repository.path,
                &version,
                &repository.license_name,
            ),
            installer_name: installer_name(&version),
            domain,
            version,
        })
    }

    fn config_drive_version(&self) -> Result<Option<String>, InstallResult> {
        let drive = &self.config.config_drive;
        let spec = MountSpec::new(drive.device.clone(), drive.mount_point.clone()).with_options(["ro"]);

        scoped(&self.mounter, &[spec], |_| {
            read_config_drive_value(&drive.mount_point, &drive.metadata_version, &drive.version_key)
        })
        .map_err(|err| match err {
            ScopeError::Mount(err) | ScopeError::Teardown { error: err, .. } => {
                InstallResult::failure(ErrorKind::Mount, err)
            }
            ScopeError::Body(err) => {
                InstallResult::not_met(format!("config drive metadata unreadable: {:#}", err))
            }
        })
    }

    fn materialize(&self, plan: &InstallPlan) -> Result<MaterializedScript, InstallResult> {
        let body = render_install_script(&ScriptParams {
            download_url: plan.download_url.clone(),
            installer_name: plan.installer_name.clone(),
            download_retries: self.config.script.download_retries,
            cleanup_resolver_symlink: self.config.script.cleanup_resolver_symlink,
        });
        let spec = ScriptSpec {
            body,
            working_directory: self.config.script.parent_dir.clone(),
        };

        let script = self
            .materializer
            .materialize(&spec)
            .map_err(|err| InstallResult::failure(ErrorKind::Materialization, err))?;
        info!(
            "materialized {} (sha256 {})",
            script.path().display(),
            script.sha256()
        );

        if let Some(contents) = read_host_resolv_conf(&self.config.script.host_resolv_conf) {
            script
                .write_companion(RESOLV_CONF_COMPANION, &contents)
                .map_err(|err| InstallResult::failure(ErrorKind::Materialization, err))?;
        }
        Ok(script)
    }
}

/// Values spliced into the generated script must not need quoting.
fn is_shell_safe(value: &str, extra: &[char]) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
}

fn read_host_resolv_conf(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(contents) => Some(contents),
        Err(err) => {
            warn!(
                "host resolver config '{}' unavailable, name resolution in the image may fail: {}",
                path.display(),
                err
            );
            None
        }
    }
}

fn log_exit_status(execution: &ExecutionResult) {
    if execution.success() {
        info!("installer finished successfully");
    } else {
        warn!(
            "installer exited with status {}; see the returned log",
            execution.exit_status
        );
    }
}

fn execution_failure(err: ExecutionError) -> InstallResult {
    InstallResult::failure(ErrorKind::Execution, err)
}

/// The installer ran but the image could not be released. Its output rides
/// along in the message.
fn teardown_failure(execution: &ExecutionResult, err: MountError) -> InstallResult {
    log_exit_status(execution);
    warn!("installer output:\n{}", execution.combined_output);
    InstallResult::failure(
        ErrorKind::Mount,
        format!(
            "{}; installer exited with status {}, output:\n{}",
            err, execution.exit_status, execution.combined_output
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::testing::FakeMounter;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Records calls and returns a canned outcome.
    struct FakeExecutor {
        calls: RefCell<Vec<(PathBuf, Vec<String>, String)>>,
        outcome: fn() -> Result<ExecutionResult, ExecutionError>,
    }

    impl FakeExecutor {
        fn returning(outcome: fn() -> Result<ExecutionResult, ExecutionError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome,
            }
        }
    }

    impl Executor for FakeExecutor {
        fn run(&self, root: &Path, argv: &[String]) -> Result<ExecutionResult, ExecutionError> {
            let script = fs::read_to_string(&argv[1]).unwrap_or_default();
            self.calls
                .borrow_mut()
                .push((root.to_path_buf(), argv.to_vec(), script));
            (self.outcome)()
        }
    }

    fn done() -> Result<ExecutionResult, ExecutionError> {
        Ok(ExecutionResult {
            combined_output: "Done\n".to_string(),
            exit_status: 0,
        })
    }

    fn spawn_failure() -> Result<ExecutionResult, ExecutionError> {
        Err(ExecutionError::Spawn {
            program: PathBuf::from("chroot"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        })
    }

    fn test_config(temp: &TempDir) -> InstallerConfig {
        let mut config = InstallerConfig::default();
        config.script.parent_dir = temp.path().join("scripts");
        config.script.host_resolv_conf = temp.path().join("resolv.conf");
        config
    }

    fn node(traits: serde_json::Value, props: serde_json::Value) -> NodeDescription {
        NodeDescription::new(json!({
            "instance_info": {"traits": traits, "image_properties": props}
        }))
    }

    fn qualifying_node() -> NodeDescription {
        node(
            json!(["CUSTOM_VSMP_MEMORYONE"]),
            json!({"direct_url": "https://img.example.com/v2/images/abc"}),
        )
    }

    fn scripts_left(temp: &TempDir) -> usize {
        fs::read_dir(temp.path().join("scripts"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_missing_trait_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        for traits in [json!([]), json!(["CUSTOM_OTHER"]), json!(null)] {
            let result = orchestrator.run(&node(
                traits,
                json!({"direct_url": "https://img.example.com/v2/images/abc"}),
            ));
            assert_eq!(
                result,
                InstallResult::RequirementNotMet {
                    reason: "required trait missing".to_string()
                }
            );
        }
        assert_eq!(mounter.mount_count(), 0);
        assert!(executor.calls.borrow().is_empty());
        assert!(!temp.path().join("scripts").exists());
    }

    #[test]
    fn test_image_url_without_network_location() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        for url in ["/v2/images/abc", "img.example.com/v2/images/abc", "file:///images/abc"] {
            let result = orchestrator.run(&node(
                json!(["CUSTOM_VSMP_MEMORYONE"]),
                json!({"direct_url": url}),
            ));
            assert_eq!(
                result,
                InstallResult::RequirementNotMet {
                    reason: "image url has no network location".to_string()
                }
            );
        }
        assert!(!temp.path().join("scripts").exists());
        assert_eq!(mounter.mount_count(), 0);
    }

    #[test]
    fn test_missing_image_properties() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&node(json!(["CUSTOM_VSMP_MEMORYONE"]), json!({})));
        assert_eq!(
            result,
            InstallResult::RequirementNotMet {
                reason: "image property missing".to_string()
            }
        );
        let result = orchestrator.run(&node(
            json!(["CUSTOM_VSMP_MEMORYONE"]),
            json!({"os_distro": "sles"}),
        ));
        assert_eq!(
            result,
            InstallResult::RequirementNotMet {
                reason: "image url missing".to_string()
            }
        );
    }

    #[test]
    fn test_end_to_end_success() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("resolv.conf"), "nameserver 10.0.0.53\n").unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let plan = orchestrator.plan(&qualifying_node()).unwrap();
        assert_eq!(plan.domain, "example.com");
        assert_eq!(plan.version, "latest");
        assert!(plan.download_url.contains("repo.example.com/memoryone/"));
        assert!(plan.download_url.contains("vsmp_installer-latest.sh"));

        let result = orchestrator.run(&qualifying_node());
        assert_eq!(
            result,
            InstallResult::Success {
                log: "Done\n".to_string()
            }
        );

        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (root, argv, script) = &calls[0];
        assert_eq!(root, Path::new("/mnt/memoryone-root"));
        assert_eq!(argv[0], "/bin/bash");
        assert!(script.contains("repo.example.com/memoryone/{vsmp_installer-latest.sh,license.txt}"));

        let mut mounted = mounter.mounted();
        assert_eq!(mounted.len(), 7);
        assert_eq!(mounted[0], PathBuf::from("/mnt/memoryone-root"));
        assert_eq!(
            mounted[6],
            PathBuf::from("/mnt/memoryone-root/sys/firmware/efi/efivars")
        );
        mounted.reverse();
        assert_eq!(mounter.unmounted(), mounted);
        assert!(mounter.active.borrow().is_empty());
        assert_eq!(scripts_left(&temp), 0);
    }

    #[test]
    fn test_version_from_image_property_and_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(|| {
            Ok(ExecutionResult {
                combined_output: "license rejected\n".to_string(),
                exit_status: 2,
            })
        });
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&node(
            json!(["CUSTOM_VSMP_MEMORYONE"]),
            json!({
                "direct_url": "https://glance.region1.cloud.example.net/v2/images/abc",
                "memoryone_version": "11.2"
            }),
        ));
        assert_eq!(
            result,
            InstallResult::Success {
                log: "license rejected\n".to_string()
            }
        );
        let calls = executor.calls.borrow();
        assert!(calls[0]
            .2
            .contains("https://repo.region1.cloud.example.net/memoryone/{vsmp_installer-11.2.sh,license.txt}"));
    }

    #[test]
    fn test_spawn_failure_still_releases_mounts() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(spawn_failure);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&qualifying_node());
        match result {
            InstallResult::Failure { error_kind, message } => {
                assert_eq!(error_kind, ErrorKind::Execution);
                assert!(message.contains("spawning"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(mounter.mount_count(), 7);
        assert_eq!(mounter.unmounted().len(), 7);
        assert!(mounter.active.borrow().is_empty());
        assert_eq!(scripts_left(&temp), 0);
    }

    #[test]
    fn test_mount_failure_unwinds_and_skips_execution() {
        let temp = TempDir::new().unwrap();
        let mut mounter = FakeMounter::default();
        mounter
            .fail_mount
            .insert(PathBuf::from("/mnt/memoryone-root/tmp"));
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&qualifying_node());
        assert!(matches!(
            result,
            InstallResult::Failure {
                error_kind: ErrorKind::Mount,
                ..
            }
        ));
        assert!(executor.calls.borrow().is_empty());
        assert_eq!(
            mounter.unmounted(),
            vec![
                PathBuf::from("/mnt/memoryone-root/dev/pts"),
                PathBuf::from("/mnt/memoryone-root/dev"),
                PathBuf::from("/mnt/memoryone-root/sys"),
                PathBuf::from("/mnt/memoryone-root/proc"),
                PathBuf::from("/mnt/memoryone-root"),
            ]
        );
        assert_eq!(scripts_left(&temp), 0);
    }

    #[test]
    fn test_teardown_failure_reported_as_mount_failure() {
        let temp = TempDir::new().unwrap();
        let mut mounter = FakeMounter::default();
        mounter
            .fail_unmount
            .insert(PathBuf::from("/mnt/memoryone-root/dev"));
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&qualifying_node());
        match result {
            InstallResult::Failure { error_kind, message } => {
                assert_eq!(error_kind, ErrorKind::Mount);
                assert!(message.contains("/mnt/memoryone-root/dev"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(mounter.unmounted().len(), 7);
    }

    #[test]
    fn test_teardown_failure_keeps_installer_output() {
        let temp = TempDir::new().unwrap();
        let mut mounter = FakeMounter::default();
        mounter
            .fail_unmount
            .insert(PathBuf::from("/mnt/memoryone-root/dev"));
        let executor = FakeExecutor::returning(|| {
            Ok(ExecutionResult {
                combined_output: "vsmp installed\nreboot required\n".to_string(),
                exit_status: 0,
            })
        });
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        match orchestrator.run(&qualifying_node()) {
            InstallResult::Failure { error_kind, message } => {
                assert_eq!(error_kind, ErrorKind::Mount);
                assert!(message.starts_with("unmounting '/mnt/memoryone-root/dev' failed"));
                assert!(message.contains("status 0"));
                assert!(message.ends_with("vsmp installed\nreboot required\n"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(scripts_left(&temp), 0);
    }

    #[test]
    fn test_materialization_failure_before_any_mount() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("scripts"), "not a directory").unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&qualifying_node());
        assert!(matches!(
            result,
            InstallResult::Failure {
                error_kind: ErrorKind::Materialization,
                ..
            }
        ));
        assert_eq!(mounter.mount_count(), 0);
    }

    #[test]
    fn test_version_with_shell_metacharacters_rejected() {
        let temp = TempDir::new().unwrap();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(test_config(&temp), &mounter, &executor);

        let result = orchestrator.run(&node(
            json!(["CUSTOM_VSMP_MEMORYONE"]),
            json!({
                "direct_url": "https://img.example.com/v2/images/abc",
                "memoryone_version": "1.0'; rm -rf /; '"
            }),
        ));
        assert!(matches!(result, InstallResult::RequirementNotMet { .. }));
        assert_eq!(mounter.mount_count(), 0);
        assert!(!temp.path().join("scripts").exists());
    }

    #[test]
    fn test_efi_mount_is_optional() {
        let mut target = TargetConfig::default();
        target.include_efi_mount = false;
        let specs = mount_plan(&target);
        assert_eq!(specs.len(), 6);
        assert!(specs.iter().all(|spec| spec.fs_type() != Some("efivarfs")));
        assert_eq!(specs[5].target(), Path::new("/mnt/memoryone-root/tmp"));
    }

    #[test]
    fn test_version_from_config_drive() {
        let temp = TempDir::new().unwrap();
        let drive = temp.path().join("config-drive");
        let metadata = crate::node::config_drive_metadata_path(&drive, "latest");
        fs::create_dir_all(metadata.parent().unwrap()).unwrap();
        fs::write(&metadata, r#"{"meta": {"memoryone_version": "9.9"}}"#).unwrap();

        let mut config = test_config(&temp);
        config.version.source = VersionSource::ConfigDrive;
        config.config_drive.mount_point = drive.clone();
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(config, &mounter, &executor);

        let plan = orchestrator.plan(&qualifying_node()).unwrap();
        assert_eq!(plan.version, "9.9");
        assert_eq!(plan.installer_name, "vsmp_installer-9.9.sh");
        assert_eq!(mounter.mounted(), vec![drive.clone()]);
        assert_eq!(mounter.unmounted(), vec![drive]);
    }

    #[test]
    fn test_malformed_config_drive_metadata() {
        let temp = TempDir::new().unwrap();
        let drive = temp.path().join("config-drive");
        let metadata = crate::node::config_drive_metadata_path(&drive, "latest");
        fs::create_dir_all(metadata.parent().unwrap()).unwrap();
        fs::write(&metadata, "{").unwrap();

        let mut config = test_config(&temp);
        config.version.source = VersionSource::ConfigDrive;
        config.config_drive.mount_point = drive;
        let mounter = FakeMounter::default();
        let executor = FakeExecutor::returning(done);
        let orchestrator = InstallOrchestrator::new(config, &mounter, &executor);

        match orchestrator.run(&qualifying_node()) {
            InstallResult::RequirementNotMet { reason } => {
                assert!(reason.starts_with("config drive metadata unreadable"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(mounter.active.borrow().is_empty());
        assert!(executor.calls.borrow().is_empty());
    }

    #[test]
    fn test_install_result_serialization() {
        let value = serde_json::to_value(InstallResult::Failure {
            error_kind: ErrorKind::Mount,
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"result": "failure", "error_kind": "mount", "message": "boom"})
        );
        assert_eq!(ErrorKind::Materialization.to_string(), "materialization");
    }
}
