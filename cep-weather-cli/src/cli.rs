use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use cep_weather_core::{Config, ErrorBody, ErrorClass, LookupPipeline, RequestContext};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tokio_util::sync::CancellationToken;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cep-weather", version, about = "Current temperature for a Brazilian postal code")]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather provider API key and optional endpoint overrides.
    Configure,

    /// Look up the current temperature for a postal code.
    Lookup {
        /// Eight-digit postal code, e.g. 01001000.
        postal_code: String,

        /// Overall deadline for the lookup, in seconds.
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Correlation id forwarded to both upstream services.
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Print the active configuration.
    ShowConfig,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => configure()?,
            Command::Lookup { postal_code, timeout, correlation_id } => {
                return lookup(&postal_code, timeout, correlation_id).await;
            }
            Command::ShowConfig => show_config()?,
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("WeatherAPI key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    cfg.set_weather_api_key(api_key.trim().to_string());

    let directory_url = cfg.directory.base_url.clone();
    cfg.directory.base_url = Text::new("Postal code directory URL:")
        .with_default(&directory_url)
        .prompt()
        .context("Failed to read directory URL")?;

    let weather_url = cfg.weather.base_url.clone();
    cfg.weather.base_url = Text::new("Weather provider URL:")
        .with_default(&weather_url)
        .prompt()
        .context("Failed to read weather URL")?;

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn show_config() -> anyhow::Result<()> {
    let cfg = Config::load_with_env()?;

    println!("config file:   {}", Config::config_file_path()?.display());
    println!("directory url: {}", cfg.directory.base_url);
    println!("weather url:   {}", cfg.weather.base_url);
    println!("api key:       {}", mask_key(cfg.weather.api_key.as_deref()));
    Ok(())
}

async fn lookup(
    postal_code: &str,
    timeout: u64,
    correlation_id: Option<String>,
) -> anyhow::Result<ExitCode> {
    let cfg = Config::load_with_env()?;
    let pipeline = LookupPipeline::from_config(&cfg)?;

    let token = CancellationToken::new();
    let mut ctx = RequestContext::new()
        .with_cancellation(token.clone())
        .with_timeout(Duration::from_secs(timeout));
    if let Some(id) = correlation_id {
        ctx = ctx.with_correlation_id(id);
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling lookup");
            token.cancel();
        }
    });

    match pipeline.lookup(&ctx, postal_code).await {
        Ok(result) => {
            println!("{}", serde_json::to_string(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string(&ErrorBody::from(&err))?);
            Ok(ExitCode::from(exit_status(err.class())))
        }
    }
}

fn exit_status(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Unprocessable => 2,
        ErrorClass::NotFound => 3,
        ErrorClass::UpstreamFailure => 4,
        ErrorClass::DecodeFailure => 5,
    }
}

fn mask_key(key: Option<&str>) -> String {
    match key {
        None | Some("") => "<not set>".to_string(),
        Some(k) if k.chars().count() <= 4 => "****".to_string(),
        Some(k) => {
            let tail: String = k.chars().skip(k.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lookup_with_defaults() {
        let cli = Cli::try_parse_from(["cep-weather", "lookup", "01001000"]).expect("parse");
        match cli.command {
            Command::Lookup { postal_code, timeout, correlation_id } => {
                assert_eq!(postal_code, "01001000");
                assert_eq!(timeout, 10);
                assert!(correlation_id.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "cep-weather",
            "lookup",
            "01001000",
            "--timeout",
            "3",
            "--correlation-id",
            "abc",
            "--verbose",
        ])
        .expect("parse");

        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Lookup { timeout: 3, correlation_id: Some(ref id), .. } if id == "abc"
        ));
    }

    #[test]
    fn huge_timeout_runs_without_deadline() {
        let cli = Cli::try_parse_from([
            "cep-weather",
            "lookup",
            "01001000",
            "--timeout",
            "18446744073709551615",
        ])
        .expect("parse");

        let Command::Lookup { timeout, .. } = cli.command else {
            panic!("expected lookup command");
        };
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(timeout));
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn exit_codes_are_distinct_per_class() {
        let codes = [
            ErrorClass::Unprocessable,
            ErrorClass::NotFound,
            ErrorClass::UpstreamFailure,
            ErrorClass::DecodeFailure,
        ]
        .map(exit_status);

        assert_eq!(codes, [2, 3, 4, 5]);
    }

    #[test]
    fn masks_api_key() {
        assert_eq!(mask_key(None), "<not set>");
        assert_eq!(mask_key(Some("abc")), "****");
        assert_eq!(mask_key(Some("bdb5695826b2")), "****26b2");
    }
}
