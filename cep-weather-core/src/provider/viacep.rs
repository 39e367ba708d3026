use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    Config,
    context::RequestContext,
    error::ResolveError,
    model::{Location, PostalCode},
};

use super::{LocationResolver, fetch_text};

const SERVICE: &str = "viacep";

/// Resolves postal codes through the ViaCEP directory (`<base>/<code>/json/`).
#[derive(Debug, Clone)]
pub struct ViaCepResolver {
    base_url: String,
    http: Client,
}

impl ViaCepResolver {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        Self::new(config.directory.base_url.clone(), http)
    }

    fn lookup_url(&self, code: &PostalCode) -> String {
        format!("{}/{}/json/", self.base_url.trim_end_matches('/'), code)
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    localidade: Option<String>,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    /// ViaCEP answers unknown codes with `{"erro": true}` (older deployments: `"true"`).
    fn is_unknown_code(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

fn parse_location(body: &str, code: &PostalCode) -> Result<Location, ResolveError> {
    let parsed: ViaCepResponse = serde_json::from_str(body)
        .map_err(|e| ResolveError::Decode { service: SERVICE, reason: e.to_string() })?;

    if parsed.is_unknown_code() {
        return Err(ResolveError::NotFound { postal_code: code.to_string() });
    }

    let name = parsed.localidade.ok_or_else(|| ResolveError::Decode {
        service: SERVICE,
        reason: "missing field `localidade`".to_string(),
    })?;

    if name.trim().is_empty() {
        return Err(ResolveError::NotFound { postal_code: code.to_string() });
    }

    Ok(Location { name })
}

#[async_trait]
impl LocationResolver for ViaCepResolver {
    async fn resolve(
        &self,
        ctx: &RequestContext,
        code: &PostalCode,
    ) -> Result<Location, ResolveError> {
        let span = info_span!(
            "resolve_location",
            postal_code = %code,
            correlation_id = ctx.correlation_id().unwrap_or("-"),
        );

        async {
            let url = self.lookup_url(code);
            debug!(%url, "querying postal code directory");

            let body = fetch_text(ctx, SERVICE, self.http.get(&url)).await.inspect_err(|e| {
                warn!(error = %e, "directory request failed");
            })?;

            let location = parse_location(&body, code).inspect_err(|e| {
                warn!(error = %e, body = %super::truncate_body(&body), "directory reply rejected");
            })?;

            debug!(locality = %location.name, "postal code resolved");
            Ok::<_, ResolveError>(location)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> PostalCode {
        PostalCode::parse("01001000").expect("valid code")
    }

    #[test]
    fn builds_lookup_url_without_double_slash() {
        let resolver = ViaCepResolver::new("http://viacep.test/ws/", Client::new());
        assert_eq!(resolver.lookup_url(&code()), "http://viacep.test/ws/01001000/json/");
    }

    #[test]
    fn parses_locality() {
        let loc = parse_location(r#"{"cep":"01001-000","localidade":"São Paulo","uf":"SP"}"#, &code())
            .expect("location");
        assert_eq!(loc.name, "São Paulo");
    }

    #[test]
    fn empty_locality_is_not_found() {
        let err = parse_location(r#"{"localidade":""}"#, &code()).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref postal_code } if postal_code == "01001000"));
    }

    #[test]
    fn erro_flag_is_not_found() {
        for body in [r#"{"erro":true}"#, r#"{"erro":"true"}"#] {
            let err = parse_location(body, &code()).unwrap_err();
            assert!(matches!(err, ResolveError::NotFound { .. }), "body {body}");
        }
    }

    #[test]
    fn missing_or_mistyped_locality_is_decode_error() {
        for body in [r#"{}"#, r#"{"localidade":42}"#, "<html>", ""] {
            let err = parse_location(body, &code()).unwrap_err();
            assert!(matches!(err, ResolveError::Decode { service: "viacep", .. }), "body {body}");
        }
    }
}
