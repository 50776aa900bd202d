// src/data/mod.rs
pub mod normalize;
pub mod price_feed;
pub mod yahoo_fetcher;

pub use price_feed::SeriesProvider;
pub use yahoo_fetcher::YahooSeriesProvider;
