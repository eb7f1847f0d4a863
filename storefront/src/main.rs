//! Storefront server entry point

use clap::Parser;

use shared::logging;
use storefront::{Args, StoreConfig, Storefront};

const COMPONENT: &str = "storefront";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap's env fallbacks see it
    dotenv::dotenv().ok();
    let args = Args::parse();

    logging::init_tracing_with_level(Some(&args.log_level));

    let config = StoreConfig::from_args(args)?;
    logging::log_progress(
        COMPONENT,
        "Configuration",
        &format!(
            "bind {}, data {}, uploads {}",
            config.bind_address,
            config
                .data_dir
                .as_ref()
                .map_or_else(|| "in memory".to_string(), |dir| dir.display().to_string()),
            config.upload_dir.display()
        ),
    );

    let storefront = Storefront::from_config(config).await?;
    storefront.run().await?;

    logging::log_success(COMPONENT, "Storefront stopped gracefully");
    Ok(())
}
