use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    Config,
    context::RequestContext,
    convert,
    error::ResolveError,
    model::{Location, WeatherReading},
};

use super::{WeatherResolver, fetch_text};

const SERVICE: &str = "weatherapi";

/// Current conditions from WeatherAPI.com (`current.json`).
#[derive(Clone)]
pub struct WeatherApiResolver {
    base_url: String,
    api_key: String,
    http: Client,
}

// Keeps the credential out of logs.
impl std::fmt::Debug for WeatherApiResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiResolver")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl WeatherApiResolver {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), http }
    }

    pub fn from_config(config: &Config, http: Client) -> anyhow::Result<Self> {
        let api_key = config.weather_api_key()?;
        Ok(Self::new(config.weather.base_url.clone(), api_key, http))
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: Option<WaCurrent>,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaErrorDetail,
}

fn parse_reading(body: &str) -> Result<WeatherReading, ResolveError> {
    let decode = |reason: String| ResolveError::Decode { service: SERVICE, reason };

    let parsed: WaResponse = serde_json::from_str(body).map_err(|e| decode(e.to_string()))?;
    let current = parsed.current.ok_or_else(|| decode("missing field `current`".into()))?;
    let celsius = current.temp_c.ok_or_else(|| decode("missing field `current.temp_c`".into()))?;

    Ok(WeatherReading {
        celsius,
        fahrenheit: current.temp_f.unwrap_or_else(|| convert::celsius_to_fahrenheit(celsius)),
        observed_at: current.last_updated_epoch.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
    })
}

/// Replaces a raw error body with the provider's own message when it sent one.
fn describe_status(err: ResolveError) -> ResolveError {
    match err {
        ResolveError::Status { service, status, body } => {
            let body = match serde_json::from_str::<WaErrorResponse>(&body) {
                Ok(WaErrorResponse { error: WaErrorDetail { code: Some(code), message } }) => {
                    format!("{message} (code {code})")
                }
                Ok(WaErrorResponse { error }) => error.message,
                Err(_) => body,
            };
            ResolveError::Status { service, status, body }
        }
        other => other,
    }
}

#[async_trait]
impl WeatherResolver for WeatherApiResolver {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        location: &Location,
    ) -> Result<WeatherReading, ResolveError> {
        let span = info_span!(
            "resolve_weather",
            locality = %location.name,
            correlation_id = ctx.correlation_id().unwrap_or("-"),
        );

        async {
            let request = self.http.get(&self.base_url).query(&[
                ("key", self.api_key.as_str()),
                ("q", location.name.as_str()),
                ("aqi", "no"),
            ]);

            let body = fetch_text(ctx, SERVICE, request).await.map_err(describe_status).inspect_err(
                |e| {
                    warn!(error = %e, "weather request failed");
                },
            )?;

            let reading = parse_reading(&body).inspect_err(|e| {
                warn!(error = %e, body = %super::truncate_body(&body), "weather reply rejected");
            })?;

            debug!(
                celsius = reading.celsius,
                observed_at = ?reading.observed_at,
                "current conditions resolved"
            );
            Ok::<_, ResolveError>(reading)
        }
        .instrument(span)
        .await
    }
}
