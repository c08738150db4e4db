pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::compare::CompareRequest;
use crate::core::config::AppConfig;
use crate::core::{CountryFilter, Currency, RateStore, RateSync};
use crate::providers::SupabaseSource;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Options shared by `compare` and `watch`. Unset values come from the config.
#[derive(Debug, Clone, Copy)]
pub struct CompareOptions {
    pub amount: f64,
    pub currency: Option<Currency>,
    pub country: Option<CountryFilter>,
}

pub enum AppCommand {
    Compare { options: CompareOptions, json: bool },
    Rates { currency: Option<Currency> },
    Providers { country: Option<CountryFilter> },
    Watch { options: CompareOptions },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xofcompare starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?
            .with_env_overrides(|key| std::env::var(key).ok()),
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if let AppCommand::Providers { country } = command {
        cli::providers::run(country.unwrap_or(config.country));
        return Ok(());
    }

    let source = SupabaseSource::new(&config.remote)?;
    let store = Arc::new(RateStore::new());
    let sync = {
        let pb = source
            .is_configured()
            .then(|| cli::ui::new_spinner("Fetching latest rates..."))
            .transpose()?;
        let store = Arc::clone(&store);
        // Only `watch` outlives the first render.
        let sync = if matches!(command, AppCommand::Watch { .. }) {
            RateSync::start(&source, store).await
        } else {
            RateSync::fetch(&source, store).await
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        sync
    };

    let result = match command {
        AppCommand::Compare { options, json } => cli::compare::run(
            &store,
            &request(&options, &config),
            sync.status(),
            json,
        ),
        AppCommand::Rates { currency } => {
            cli::rates::run(&store, currency.unwrap_or(config.currency), sync.status())
        }
        AppCommand::Watch { options } => {
            cli::watch::run(&sync, &request(&options, &config), source.is_configured()).await
        }
        AppCommand::Providers { .. } => Ok(()),
    };

    sync.stop();
    result
}

fn request(options: &CompareOptions, config: &AppConfig) -> CompareRequest {
    CompareRequest {
        amount: options.amount,
        currency: options.currency.unwrap_or(config.currency),
        country: options.country.unwrap_or(config.country),
    }
}
