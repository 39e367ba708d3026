use std::{fmt, sync::Arc};

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    Config,
    context::RequestContext,
    error::{LookupError, ResolveError},
    model::{PostalCode, TemperatureResult},
    provider::{self, LocationResolver, ViaCepResolver, WeatherApiResolver, WeatherResolver},
};

/// Lookup stages, walked strictly in order. Any failure ends the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Validated,
    LocationResolved,
    WeatherResolved,
    Converted,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Received => "request intake",
            Stage::Validated => "postal code validation",
            Stage::LocationResolved => "location lookup",
            Stage::WeatherResolved => "weather lookup",
            Stage::Converted => "unit conversion",
            Stage::Completed => "response assembly",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LookupPipeline {
    locations: Arc<dyn LocationResolver>,
    weather: Arc<dyn WeatherResolver>,
}

impl LookupPipeline {
    pub fn new(locations: Arc<dyn LocationResolver>, weather: Arc<dyn WeatherResolver>) -> Self {
        Self { locations, weather }
    }

    /// Production pipeline: ViaCEP + WeatherAPI.com sharing one HTTP client.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = provider::default_client();
        let weather = WeatherApiResolver::from_config(config, http.clone())?;
        let locations = ViaCepResolver::from_config(config, http);

        Ok(Self::new(Arc::new(locations), Arc::new(weather)))
    }

    pub async fn lookup(
        &self,
        ctx: &RequestContext,
        raw_code: &str,
    ) -> Result<TemperatureResult, LookupError> {
        let span = info_span!(
            "lookup",
            postal_code = raw_code,
            correlation_id = ctx.correlation_id().unwrap_or("-"),
        );

        self.run(ctx, raw_code).instrument(span).await
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        raw_code: &str,
    ) -> Result<TemperatureResult, LookupError> {
        debug!(stage = %Stage::Received);

        let Some(code) = PostalCode::parse(raw_code) else {
            warn!(stage = %Stage::Validated, input = raw_code, "rejecting malformed postal code");
            return Err(LookupError::Unprocessable { input: raw_code.to_string() });
        };
        debug!(stage = %Stage::Validated);

        let location = match self.locations.resolve(ctx, &code).await {
            Ok(location) => location,
            Err(ResolveError::NotFound { postal_code }) => {
                warn!(stage = %Stage::LocationResolved, input = %code, "postal code not found");
                return Err(LookupError::NotFound { postal_code });
            }
            Err(source) => {
                error!(stage = %Stage::LocationResolved, input = %code, error = %source, "location lookup failed");
                return Err(LookupError::Upstream { stage: Stage::LocationResolved, source });
            }
        };
        debug!(stage = %Stage::LocationResolved, locality = %location.name);

        let reading = self.weather.resolve(ctx, &location).await.map_err(|source| {
            error!(
                stage = %Stage::WeatherResolved,
                input = %location.name,
                error = %source,
                "weather lookup failed"
            );
            LookupError::Upstream { stage: Stage::WeatherResolved, source }
        })?;
        debug!(stage = %Stage::WeatherResolved, celsius = reading.celsius);

        let result = TemperatureResult::new(&location, &reading);
        debug!(stage = %Stage::Converted);

        info!(
            stage = %Stage::Completed,
            city = %result.city,
            temp_c = %result.celsius,
            "lookup completed"
        );
        Ok(result)
    }
}
