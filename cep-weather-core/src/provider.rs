use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::fmt::Debug;

use crate::{
    context::RequestContext,
    error::ResolveError,
    model::{Location, PostalCode, WeatherReading},
};

pub mod viacep;
pub mod weatherapi;

pub use viacep::ViaCepResolver;
pub use weatherapi::WeatherApiResolver;

/// Postal code → locality lookup.
#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        code: &PostalCode,
    ) -> Result<Location, ResolveError>;
}

/// Locality → current conditions lookup.
#[async_trait]
pub trait WeatherResolver: Send + Sync + Debug {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        location: &Location,
    ) -> Result<WeatherReading, ResolveError>;
}

/// Sends `request` under `ctx` and reads the whole body.
///
/// The body is always consumed before returning so the connection goes back
/// to the pool. Non-2xx statuses become [`ResolveError::Status`].
pub(crate) async fn fetch_text(
    ctx: &RequestContext,
    service: &'static str,
    request: RequestBuilder,
) -> Result<String, ResolveError> {
    ctx.run(service, async move {
        let res = ctx
            .decorate(request)
            .send()
            .await
            .map_err(|source| ResolveError::Transport { service, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ResolveError::Transport { service, source })?;

        if !status.is_success() {
            return Err(ResolveError::Status {
                service,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    })
    .await
}

pub(crate) fn default_client() -> Client {
    Client::new()
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_untouched() {
        assert_eq!(truncate_body("{\"erro\":true}"), "{\"erro\":true}");
    }

    #[test]
    fn long_bodies_are_cut_on_char_boundaries() {
        let body = "ã".repeat(300);
        let cut = truncate_body(&body);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
