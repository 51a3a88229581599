mod client;
mod signed_url;

pub use convai_realtime_types as types;
pub use client::config::{Config, ConfigBuilder};
pub use client::stats::Stats;
pub use client::{Client, ConvaiClient, ServerRx, connect, connect_with_capacity};
pub use signed_url::SignedUrlClient;
