//! Runtime configuration
//!
//! Values come from command line flags, falling back to `STOREFRONT_*`
//! environment variables (a `.env` file is loaded first by `main`), then to
//! built-in defaults.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{StorefrontError, StorefrontResult};

/// Payment secret accepted only when running with `--dev`
pub const DEV_PAYMENT_SECRET: &str = "storefront-dev-secret";

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "storefront")]
#[command(about = "Storefront web service: catalog, cart, orders, delivery and order chat")]
pub struct Args {
    /// Interface to bind the HTTP server on
    #[arg(long, env = "STOREFRONT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for HTTP server
    #[arg(long, env = "STOREFRONT_PORT", default_value = "8080")]
    pub port: u16,

    /// Directory holding the persisted store snapshot
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Static files directory
    #[arg(long, env = "STOREFRONT_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Directory uploaded product images are written to
    #[arg(long, env = "STOREFRONT_UPLOAD_DIR", default_value = "./uploads")]
    pub upload_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STOREFRONT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Shared secret used to sign and verify payment gateway redirects
    #[arg(long, env = "STOREFRONT_PAYMENT_SECRET")]
    pub payment_secret: Option<String>,

    /// Hosted payment page customers are redirected to
    #[arg(long, env = "STOREFRONT_PAYMENT_GATEWAY_URL", default_value = "https://sandbox.payments.example/checkout")]
    pub payment_gateway_url: String,

    /// Where the gateway sends the customer back to
    #[arg(
        long,
        env = "STOREFRONT_PAYMENT_RETURN_URL",
        default_value = "http://127.0.0.1:8080/api/payment/callback"
    )]
    pub payment_return_url: String,

    /// Idle minutes before a session expires
    #[arg(long, env = "STOREFRONT_SESSION_TTL_MINUTES", default_value = "120")]
    pub session_ttl_minutes: u64,

    /// Bootstrap admin account email
    #[arg(long, env = "STOREFRONT_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Bootstrap admin account password
    #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Largest accepted image upload in bytes
    #[arg(long, env = "STOREFRONT_MAX_UPLOAD_BYTES", default_value = "5242880")]
    pub max_upload_bytes: usize,

    /// Development mode: built-in payment secret and the fake gateway endpoint
    #[arg(long, env = "STOREFRONT_DEV", default_value_t = false)]
    pub dev: bool,
}

/// Validated service configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub bind_address: SocketAddr,
    /// `None` keeps the store in memory only
    pub data_dir: Option<PathBuf>,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub log_level: String,
    pub payment_secret: String,
    pub payment_gateway_url: String,
    pub payment_return_url: String,
    pub session_ttl: Duration,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub max_upload_bytes: usize,
    pub dev: bool,
}

impl StoreConfig {
    /// Build configuration from parsed arguments
    pub fn from_args(args: Args) -> StorefrontResult<Self> {
        let bind_address: SocketAddr = format!("{}:{}", args.host, args.port)
            .parse()
            .map_err(|e| StorefrontError::Config(format!("Invalid bind address {}:{}: {}", args.host, args.port, e)))?;

        let payment_secret = match (args.payment_secret, args.dev) {
            (Some(secret), _) => secret,
            (None, true) => DEV_PAYMENT_SECRET.to_string(),
            (None, false) => {
                return Err(StorefrontError::Config(
                    "payment secret is required (use --payment-secret or --dev)".to_string(),
                ));
            }
        };

        let config = Self {
            bind_address,
            data_dir: Some(args.data_dir),
            static_dir: args.static_dir,
            upload_dir: args.upload_dir,
            log_level: args.log_level,
            payment_secret,
            payment_gateway_url: args.payment_gateway_url,
            payment_return_url: args.payment_return_url,
            session_ttl: Duration::from_secs(args.session_ttl_minutes.saturating_mul(60)),
            admin_email: args.admin_email,
            admin_password: args.admin_password,
            max_upload_bytes: args.max_upload_bytes,
            dev: args.dev,
        };

        config.validate()?;
        Ok(config)
    }

    /// In-memory development configuration rooted at `root`
    pub fn development(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: None,
            static_dir: root.join("static"),
            upload_dir: root.join("uploads"),
            log_level: "info".to_string(),
            payment_secret: DEV_PAYMENT_SECRET.to_string(),
            payment_gateway_url: "https://sandbox.payments.example/checkout".to_string(),
            payment_return_url: "http://127.0.0.1:8080/api/payment/callback".to_string(),
            session_ttl: Duration::from_secs(120 * 60),
            admin_email: None,
            admin_password: None,
            max_upload_bytes: 5 * 1024 * 1024,
            dev: true,
        }
    }

    pub fn validate(&self) -> StorefrontResult<()> {
        if self.bind_address.port() == 0 {
            return Err(StorefrontError::Config("port must be non-zero".to_string()));
        }
        if self.payment_secret.trim().is_empty() {
            return Err(StorefrontError::Config("payment secret must not be empty".to_string()));
        }
        if self.session_ttl.is_zero() {
            return Err(StorefrontError::Config("session TTL must be positive".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(StorefrontError::Config("upload limit must be positive".to_string()));
        }
        if self.admin_email.is_some() != self.admin_password.is_some() {
            return Err(StorefrontError::Config(
                "admin email and admin password must be given together".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the JSON store snapshot, if persistence is enabled
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("store.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["storefront"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_require_payment_secret() {
        let result = StoreConfig::from_args(parse(&[]));
        assert!(matches!(result, Err(StorefrontError::Config(_))));
    }

    #[test]
    fn test_dev_mode_supplies_secret() {
        let config = StoreConfig::from_args(parse(&["--dev", "--port", "9000"])).unwrap();
        assert_eq!(config.payment_secret, DEV_PAYMENT_SECRET);
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.session_ttl, Duration::from_secs(7200));
        assert!(config.snapshot_path().unwrap().ends_with("store.json"));
    }

    #[test]
    fn test_rejects_half_admin_bootstrap() {
        let result = StoreConfig::from_args(parse(&["--dev", "--admin-email", "root@example.com"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let result = StoreConfig::from_args(parse(&["--payment-secret", "s3cret", "--session-ttl-minutes", "0"]));
        assert!(result.is_err());
    }
}
