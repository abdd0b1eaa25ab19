//! Installer download location, derived from the image URL.
//!
//! The installer repository lives next to the image service: for an image at
//! `https://img.example.com/...` the repository is `https://repo.example.com`.

/// Host of `url`, or `None` when the URL has no network location.
///
/// Userinfo and port are stripped and the host is lower-cased. IPv6
/// literals keep their brackets.
pub fn network_location_host(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = if host_port.starts_with('[') {
        host_port.split_inclusive(']').next().unwrap_or_default()
    } else {
        host_port.split(':').next().unwrap_or_default()
    };

    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Drop the first DNS label: `img.example.com` -> `example.com`.
pub fn parent_domain(host: &str) -> Option<&str> {
    let (_, parent) = host.trim_end_matches('.').split_once('.')?;
    if parent.is_empty() {
        return None;
    }
    Some(parent)
}

/// Installer script file name for `version`.
pub fn installer_name(version: &str) -> String {
    format!("vsmp_installer-{}.sh", version)
}

/// curl URL fetching both the installer and its license.
pub fn installer_download_url(
    host_prefix: &str,
    domain: &str,
    repo_path: &str,
    version: &str,
    license_name: &str,
) -> String {
    format!(
        "https://{}.{}/{}/{{{},{}}}",
        host_prefix,
        domain,
        repo_path.trim_matches('/'),
        installer_name(version),
        license_name
    )
}
