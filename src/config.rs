//! Deployment-variant configuration.
//!
//! Every field has a default, so an empty (or absent) file selects the full
//! variant: version from the image properties, EFI variables mounted, resolver
//! stub removed after the install.
//!
//! ```toml
//! [version]
//! source = "config_drive"
//!
//! [target]
//! include_efi_mount = false
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    pub node: NodeConfig,
    pub version: VersionConfig,
    pub config_drive: ConfigDriveConfig,
    pub target: TargetConfig,
    pub script: ScriptConfig,
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub required_trait: String,
    pub image_url_property: String,
    pub version_property: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            required_trait: "CUSTOM_VSMP_MEMORYONE".to_string(),
            image_url_property: "direct_url".to_string(),
            version_property: "memoryone_version".to_string(),
        }
    }
}

/// Where the installer version comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    #[default]
    ImageProperty,
    ConfigDrive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    pub source: VersionSource,
    pub default: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            source: VersionSource::ImageProperty,
            default: "latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDriveConfig {
    pub device: String,
    pub mount_point: PathBuf,
    pub metadata_version: String,
    pub version_key: Vec<String>,
}

impl Default for ConfigDriveConfig {
    fn default() -> Self {
        Self {
            device: "LABEL=config-2".to_string(),
            mount_point: PathBuf::from("/mnt/config"),
            metadata_version: "latest".to_string(),
            version_key: vec!["meta".to_string(), "memoryone_version".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub root_device: String,
    pub mount_point: PathBuf,
    pub include_efi_mount: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            root_device: "LABEL=img-rootfs".to_string(),
            mount_point: PathBuf::from("/mnt/memoryone-root"),
            include_efi_mount: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptConfig {
    /// Parent of the private script directory. Must be `/tmp` or below, the
    /// only host path bind-mounted into the chroot.
    pub parent_dir: PathBuf,
    pub download_retries: u32,
    pub cleanup_resolver_symlink: bool,
    pub host_resolv_conf: PathBuf,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            parent_dir: PathBuf::from("/tmp"),
            download_retries: 5,
            cleanup_resolver_symlink: true,
            host_resolv_conf: PathBuf::from("/etc/resolv.conf"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    pub host_prefix: String,
    pub path: String,
    pub license_name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            host_prefix: "repo".to_string(),
            path: "memoryone".to_string(),
            license_name: "license.txt".to_string(),
        }
    }
}

impl InstallerConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading installer config '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("loading installer config '{}'", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parsing installer config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.required_trait.trim().is_empty() {
            bail!("invalid installer config: node.required_trait must not be empty");
        }
        if self.node.image_url_property.trim().is_empty() {
            bail!("invalid installer config: node.image_url_property must not be empty");
        }
        if self.version.default.trim().is_empty() {
            bail!("invalid installer config: version.default must not be empty");
        }
        if self.version.source == VersionSource::ConfigDrive && self.config_drive.version_key.is_empty() {
            bail!("invalid installer config: config_drive.version_key must name at least one key");
        }
        if !self.target.mount_point.is_absolute() || self.target.mount_point == Path::new("/") {
            bail!(
                "invalid installer config: target.mount_point '{}' must be an absolute path other than '/'",
                self.target.mount_point.display()
            );
        }
        if self.target.mount_point.starts_with("/tmp") {
            bail!(
                "invalid installer config: target.mount_point '{}' must not be /tmp or below (/tmp is bind-mounted into it)",
                self.target.mount_point.display()
            );
        }
        if !self.script.parent_dir.starts_with("/tmp") {
            bail!(
                "invalid installer config: script.parent_dir '{}' must be /tmp or below (only /tmp is bind-mounted into the image)",
                self.script.parent_dir.display()
            );
        }
        if self.repository.host_prefix.trim().is_empty() {
            bail!("invalid installer config: repository.host_prefix must not be empty");
        }
        Ok(())
    }
}
