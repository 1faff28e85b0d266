pub mod caching;
pub mod coingecko;
pub mod er_api;
