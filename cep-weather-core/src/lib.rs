//! Core library for the `cep-weather` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Postal code validation and temperature conversions
//! - Resolvers for the postal code directory and the weather provider
//! - The lookup pipeline that chains them and classifies failures
//!
//! It is used by `cep-weather-cli`, but can also be embedded in a service
//! that maps [`ErrorClass`] to HTTP statuses.

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod validator;

pub use config::Config;
pub use context::RequestContext;
pub use error::{ErrorBody, ErrorClass, LookupError, ResolveError};
pub use model::{Location, PostalCode, TemperatureResult, WeatherReading};
pub use pipeline::{LookupPipeline, Stage};
pub use provider::{LocationResolver, ViaCepResolver, WeatherApiResolver, WeatherResolver};
