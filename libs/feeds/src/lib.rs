mod quote_client;
mod weather_client;

pub use quote_client::{Quote, QuoteClient, pick_random};
pub use weather_client::{Field, WeatherClient, WeatherSnapshot};
