use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub static SERVICE_NAME: &str = "pod-admission-webhook";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    /// `None` when the metrics endpoint is disabled.
    pub metrics_addr: Option<SocketAddr>,
    pub tls_config: TlsConfig,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl TlsConfig {
    pub fn from_cert_dir(cert_dir: &Path, cert_name: &str, key_name: &str) -> Self {
        TlsConfig {
            cert_file: cert_dir.join(cert_name),
            key_file: cert_dir.join(key_name),
        }
    }
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let metrics_addr = metrics_bind_address(
            matches
                .get_one::<String>("metrics-addr")
                .expect("clap should have set a default value"),
        )?;
        let tls_config = tls_config(matches);

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            metrics_addr,
            tls_config,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

/// The directory holding the serving certificates when `--cert-dir` is not given.
pub fn default_cert_dir() -> PathBuf {
    std::env::temp_dir()
        .join("k8s-webhook-server")
        .join("serving-certs")
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    let address = matches
        .get_one::<String>("address")
        .expect("clap should have set a default value");
    let port = matches
        .get_one::<String>("port")
        .expect("clap should have set a default value");

    let ip: IpAddr = address
        .parse()
        .map_err(|e| anyhow!("error parsing arguments: invalid address {address}: {e}"))?;
    let port: u16 = port
        .parse()
        .map_err(|e| anyhow!("error parsing arguments: invalid port {port}: {e}"))?;

    Ok(SocketAddr::new(ip, port))
}

/// Parse the metrics bind address. `"0"` disables the endpoint, an empty host
/// (e.g. `":8080"`) binds all the interfaces.
pub(crate) fn metrics_bind_address(value: &str) -> Result<Option<SocketAddr>> {
    if value == "0" {
        return Ok(None);
    }

    if let Some(port) = value.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|e| anyhow!("error parsing arguments: invalid metrics port {port}: {e}"))?;
        return Ok(Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)));
    }

    value
        .parse()
        .map(Some)
        .map_err(|e| anyhow!("error parsing arguments: invalid metrics address {value}: {e}"))
}

fn tls_config(matches: &ArgMatches) -> TlsConfig {
    let cert_dir = matches
        .get_one::<String>("cert-dir")
        .map(PathBuf::from)
        .unwrap_or_else(default_cert_dir);
    let cert_name = matches
        .get_one::<String>("cert-name")
        .expect("clap should have set a default value");
    let key_name = matches
        .get_one::<String>("key-name")
        .expect("clap should have set a default value");

    TlsConfig::from_cert_dir(&cert_dir, cert_name, key_name)
}
