//! Node description as handed over by the provisioning service.
//!
//! The description is an opaque JSON document; only a handful of nested keys
//! are read from it.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct NodeDescription {
    raw: Value,
}

impl NodeDescription {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw = serde_json::from_str(text).context("parsing node description")?;
        Ok(Self { raw })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading node description '{}'", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("loading node description '{}'", path.display()))
    }

    /// Follow `path` through nested objects.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.raw, path)
    }

    /// `instance_info.traits`. Non-string entries are ignored.
    pub fn traits(&self) -> Vec<&str> {
        self.lookup(&["instance_info", "traits"])
            .and_then(Value::as_array)
            .map(|traits| traits.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits().contains(&name)
    }

    /// `instance_info.image_properties`, when present and non-empty.
    pub fn image_properties(&self) -> Option<&Map<String, Value>> {
        self.lookup(&["instance_info", "image_properties"])
            .and_then(Value::as_object)
            .filter(|props| !props.is_empty())
    }
}

pub(crate) fn lookup<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Non-empty string property, trimmed.
pub(crate) fn string_property<'v>(props: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Path of the config-drive metadata file below `mount_point`.
pub fn config_drive_metadata_path(mount_point: &Path, metadata_version: &str) -> std::path::PathBuf {
    mount_point
        .join("openstack")
        .join(metadata_version)
        .join("meta_data.json")
}

/// Read a string at `key_path` from the config-drive metadata file.
///
/// A missing file or key is `Ok(None)`; an unreadable or malformed file is an
/// error.
pub fn read_config_drive_value(
    mount_point: &Path,
    metadata_version: &str,
    key_path: &[String],
) -> Result<Option<String>> {
    let path = config_drive_metadata_path(mount_point, metadata_version);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path)
        .with_context(|| format!("reading config drive metadata '{}'", path.display()))?;
    let parsed: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing config drive metadata '{}'", path.display()))?;

    let keys: Vec<&str> = key_path.iter().map(String::as_str).collect();
    Ok(lookup(&parsed, &keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_traits_and_image_properties() {
        let node = NodeDescription::new(json!({
            "instance_info": {
                "traits": ["CUSTOM_VSMP_MEMORYONE", 7, "CUSTOM_OTHER"],
                "image_properties": {"direct_url": "https://img.example.com/v2/images/abc"}
            }
        }));

        assert_eq!(node.traits(), vec!["CUSTOM_VSMP_MEMORYONE", "CUSTOM_OTHER"]);
        assert!(node.has_trait("CUSTOM_VSMP_MEMORYONE"));
        assert!(!node.has_trait("CUSTOM_MISSING"));
        let props = node.image_properties().unwrap();
        assert_eq!(
            string_property(props, "direct_url"),
            Some("https://img.example.com/v2/images/abc")
        );
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let node = NodeDescription::from_json(r#"{"instance_info": {"image_properties": {}}}"#).unwrap();
        assert!(node.traits().is_empty());
        assert!(node.image_properties().is_none());
        assert!(NodeDescription::default().lookup(&["instance_info"]).is_none());
    }

    #[test]
    fn test_string_property_rejects_blank() {
        let props = json!({"memoryone_version": "  ", "other": 3});
        let props = props.as_object().unwrap();
        assert_eq!(string_property(props, "memoryone_version"), None);
        assert_eq!(string_property(props, "other"), None);
    }

    #[test]
    fn test_read_config_drive_value() {
        let temp = TempDir::new().unwrap();
        let keys = vec!["meta".to_string(), "memoryone_version".to_string()];
        assert_eq!(read_config_drive_value(temp.path(), "latest", &keys).unwrap(), None);

        let path = config_drive_metadata_path(temp.path(), "latest");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"uuid": "n1", "meta": {"memoryone_version": "4.2.1"}}"#).unwrap();
        assert_eq!(
            read_config_drive_value(temp.path(), "latest", &keys).unwrap(),
            Some("4.2.1".to_string())
        );

        fs::write(&path, "{not json").unwrap();
        assert!(read_config_drive_value(temp.path(), "latest", &keys).is_err());
    }
}
