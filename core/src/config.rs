use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use color_eyre::eyre::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::processing::image::{VariantSpec, VariantTable};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlDataDir {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlUploads {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlVariant {
    name: String,
    width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlCleanup {
    pub reconcile_interval_secs: Option<u64>,
    pub grace_period_secs: Option<u64>,
    pub session_cleanup_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub admin_password: Option<String>,
    pub max_upload_size: Option<String>,
    pub session_ttl_hours: Option<u32>,
    pub ingest_timeout_secs: Option<u64>,
    #[serde(rename = "DataDir")]
    pub data_dir: TomlDataDir,
    #[serde(rename = "Uploads")]
    pub uploads: Option<TomlUploads>,
    #[serde(rename = "Variants")]
    pub variants: Option<Vec<TomlVariant>>,
    #[serde(rename = "Cleanup")]
    pub cleanup: Option<TomlCleanup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    pub path: PathBuf,
}

impl DataDir {
    pub fn database_path(&self) -> PathBuf {
        self.path.join("folio.db")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupConfig {
    pub reconcile_interval: Duration,
    /// orphaned files younger than this are never swept
    pub grace_period: Duration,
    pub session_cleanup_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub port: u16,
    /// used to create the admin account if there is none yet
    pub admin_password: Option<String>,
    /// in bytes, for a whole request
    pub max_upload_size: usize,
    pub session_ttl: Duration,
    pub ingest_timeout: Duration,
    pub data_dir: DataDir,
    /// root of the content addressed store
    pub uploads_dir: PathBuf,
    pub variants: VariantTable,
    pub cleanup: CleanupConfig,
}

const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_SIZE: &str = "32 MiB";
const DEFAULT_SESSION_TTL_HOURS: u32 = 24;
const DEFAULT_INGEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_GRACE_PERIOD_SECS: u64 = 10 * 60;
const DEFAULT_SESSION_CLEANUP_INTERVAL_SECS: u64 = 6 * 60 * 60;

pub async fn read_config(path: &Path) -> Result<Config> {
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .context(format!("Error reading config file {}", path))?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    parse_config(&toml_str, base_dir)
}

/// Relative paths in the config are resolved against `base_dir`
pub fn parse_config(toml_str: &str, base_dir: &Path) -> Result<Config> {
    let toml_config: TomlConfig = toml::from_str(toml_str).context("Error parsing config file")?;
    let resolve = |p: &str| -> PathBuf {
        let p = PathBuf::from(p);
        if p.is_absolute() {
            p
        } else {
            base_dir.join(p)
        }
    };

    let data_dir = DataDir {
        path: resolve(&toml_config.data_dir.path),
    };
    let uploads_dir = match &toml_config.uploads {
        Some(uploads) => resolve(&uploads.path),
        None => data_dir.path.join("uploads"),
    };

    let max_upload_size_str = toml_config
        .max_upload_size
        .as_deref()
        .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE);
    let max_upload_size: usize = parse_size::parse_size(max_upload_size_str)
        .ok()
        .and_then(|size| usize::try_from(size).ok())
        .ok_or_else(|| {
            color_eyre::eyre::eyre!("invalid max_upload_size '{}'", max_upload_size_str)
        })?;

    let variants = match toml_config.variants {
        None => VariantTable::default(),
        Some(variants) => VariantTable::new(
            variants
                .into_iter()
                .map(|v| VariantSpec::new(v.name, v.width))
                .collect(),
        )
        .wrap_err("invalid [[Variants]] in config")?,
    };

    let ingest_timeout = Duration::from_secs(
        toml_config
            .ingest_timeout_secs
            .unwrap_or(DEFAULT_INGEST_TIMEOUT_SECS),
    );
    let cleanup = {
        let c = toml_config.cleanup.as_ref();
        CleanupConfig {
            reconcile_interval: Duration::from_secs(
                c.and_then(|c| c.reconcile_interval_secs)
                    .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS),
            ),
            grace_period: Duration::from_secs(
                c.and_then(|c| c.grace_period_secs)
                    .unwrap_or(DEFAULT_GRACE_PERIOD_SECS),
            ),
            session_cleanup_interval: Duration::from_secs(
                c.and_then(|c| c.session_cleanup_interval_secs)
                    .unwrap_or(DEFAULT_SESSION_CLEANUP_INTERVAL_SECS),
            ),
        }
    };
    if cleanup.grace_period <= ingest_timeout {
        bail!(
            "Cleanup.grace_period_secs ({}s) must be longer than ingest_timeout_secs ({}s)",
            cleanup.grace_period.as_secs(),
            ingest_timeout.as_secs()
        );
    }
    if cleanup.reconcile_interval.is_zero() || cleanup.session_cleanup_interval.is_zero() {
        bail!("cleanup intervals must not be zero");
    }

    Ok(Config {
        address: toml_config
            .address
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned()),
        port: toml_config.port.unwrap_or(DEFAULT_PORT),
        admin_password: toml_config.admin_password,
        max_upload_size,
        session_ttl: Duration::from_secs(
            toml_config
                .session_ttl_hours
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS) as u64
                * 60
                * 60,
        ),
        ingest_timeout,
        data_dir,
        uploads_dir,
        variants,
        cleanup,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use claims::{assert_err, assert_ok};
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = assert_ok!(parse_config(
            r#"
[DataDir]
path = "data"
"#,
            Path::new("/srv/folio"),
        ));
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_size, 32 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.ingest_timeout, Duration::from_secs(30));
        assert_eq!(config.data_dir.path, PathBuf::from("/srv/folio/data"));
        assert_eq!(
            config.data_dir.database_path(),
            PathBuf::from("/srv/folio/data/folio.db")
        );
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/folio/data/uploads"));
        assert_eq!(config.variants, VariantTable::default());
        assert_eq!(config.cleanup.grace_period, Duration::from_secs(600));
        assert_eq!(config.admin_password, None);
    }

    #[test]
    fn full_config() {
        let config = assert_ok!(parse_config(
            r#"
address = "0.0.0.0"
port = 3000
admin_password = "hunter2"
max_upload_size = "8 MB"
session_ttl_hours = 2
ingest_timeout_secs = 5

[DataDir]
path = "/var/lib/folio"

[Uploads]
path = "uploads"

[[Variants]]
name = "small"
width = 200

[[Variants]]
name = "big"
width = 2048

[Cleanup]
reconcile_interval_secs = 60
grace_period_secs = 120
session_cleanup_interval_secs = 3600
"#,
            Path::new("/etc/folio"),
        ));
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.admin_password.as_deref(), Some("hunter2"));
        assert_eq!(config.max_upload_size, 8_000_000);
        assert_eq!(config.session_ttl, Duration::from_secs(7200));
        assert_eq!(config.data_dir.path, PathBuf::from("/var/lib/folio"));
        assert_eq!(config.uploads_dir, PathBuf::from("/etc/folio/uploads"));
        let names: Vec<&str> = config.variants.names().collect();
        assert_eq!(names, vec!["small", "big"]);
        assert_eq!(config.cleanup.reconcile_interval, Duration::from_secs(60));
    }

    #[test]
    fn rejects_bad_values() {
        let base = Path::new("/");
        // single variant
        assert_err!(parse_config(
            "[DataDir]\npath = \"d\"\n[[Variants]]\nname = \"only\"\nwidth = 100\n",
            base
        ));
        assert_err!(parse_config(
            "max_upload_size = \"lots\"\n[DataDir]\npath = \"d\"\n",
            base
        ));
        // grace period shorter than an ingest may take
        assert_err!(parse_config(
            "ingest_timeout_secs = 60\n[DataDir]\npath = \"d\"\n[Cleanup]\ngrace_period_secs = 30\n",
            base
        ));
        assert_err!(parse_config("port = 8080\n", base));
    }
}
