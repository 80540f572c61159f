//! The mutation rule applied to every admitted Pod: make sure the resolver
//! is tuned with a fixed set of options, unless the Pod author already
//! configured some.

use k8s_openapi::api::core::v1::{Pod, PodDNSConfig, PodDNSConfigOption, PodSpec};

pub const NDOTS: &str = "ndots";
pub const TIMEOUT: &str = "timeout";
pub const SINGLE_REQUEST_REOPEN: &str = "single-request-reopen";

/// The options injected into Pods, in the order they are written.
pub fn canonical_dns_options() -> Vec<PodDNSConfigOption> {
    vec![
        PodDNSConfigOption {
            name: Some(NDOTS.to_owned()),
            value: Some("2".to_owned()),
        },
        PodDNSConfigOption {
            name: Some(TIMEOUT.to_owned()),
            value: Some("1".to_owned()),
        },
        PodDNSConfigOption {
            name: Some(SINGLE_REQUEST_REOPEN.to_owned()),
            value: None,
        },
    ]
}

/// Ensure the Pod's DNS configuration carries the canonical options.
///
/// A Pod that already lists at least one DNS option is left untouched: no
/// merging takes place. Other `dnsConfig` fields (nameservers, searches) are
/// always preserved.
///
/// Returns `true` when the Pod has been changed.
pub fn ensure_dns_options(pod: &mut Pod) -> bool {
    let has_options = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.dns_config.as_ref())
        .and_then(|dns_config| dns_config.options.as_ref())
        .is_some_and(|options| !options.is_empty());
    if has_options {
        return false;
    }

    let spec = pod.spec.get_or_insert_with(PodSpec::default);
    let dns_config = spec.dns_config.get_or_insert_with(PodDNSConfig::default);
    dns_config.options = Some(canonical_dns_options());
    true
}
