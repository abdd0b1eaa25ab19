//! Bootstrap script that downloads and runs the MemoryONE installer.

/// Resolver stub that `/etc/resolv.conf` points at on systemd-resolved images.
pub const RESOLVER_STUB: &str = "/run/systemd/resolve/stub-resolv.conf";

/// Companion file, next to the script, holding the host's resolver config.
pub const RESOLV_CONF_COMPANION: &str = "resolv.conf";

pub const LICENSE_FILE_NAME: &str = "license.txt";

#[derive(Debug, Clone)]
pub struct ScriptParams {
    /// curl URL with a `{installer,license}` brace set.
    pub download_url: String,
    pub installer_name: String,
    /// Retries for the download step only.
    pub download_retries: u32,
    pub cleanup_resolver_symlink: bool,
}

/// Render the bash script run inside the chroot.
pub fn render_install_script(params: &ScriptParams) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/bash\n");
    script.push_str("set -euo pipefail\n\n");
    script.push_str("cd \"$(dirname \"$0\")\"\n\n");

    script.push_str("created_stub=0\n");
    script.push_str(&format!(
        "if [ ! -e {stub} ] && [ ! -L {stub} ]; then\n    mkdir -p \"$(dirname {stub})\"\n    ln -s \"$PWD/{companion}\" {stub}\n    created_stub=1\nfi\n",
        stub = RESOLVER_STUB,
        companion = RESOLV_CONF_COMPANION,
    ));
    if params.cleanup_resolver_symlink {
        script.push_str(&format!(
            "cleanup_stub() {{\n    if [ \"$created_stub\" = 1 ]; then\n        rm -f {stub}\n    fi\n}}\ntrap cleanup_stub EXIT\n",
            stub = RESOLVER_STUB,
        ));
    }
    script.push('\n');

    script.push_str(&format!(
        "curl --fail --silent --show-error --location --retry {} --remote-name-all '{}'\n",
        params.download_retries, params.download_url
    ));
    script.push_str(&format!("chmod +x ./{}\n", params.installer_name));
    script.push_str(&format!(
        "./{} --non-interactive --license-file {} </dev/null\n",
        params.installer_name, LICENSE_FILE_NAME
    ));
    script
}
