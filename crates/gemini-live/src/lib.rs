mod client;
pub mod types;

pub use client::config::Config;
pub use client::stats::Stats;
pub use client::{Client, ServerRx, connect_with_config};
