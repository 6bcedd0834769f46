pub mod chat;
pub mod cli;
pub mod config;
pub mod live_adapter;
pub mod practice;
pub mod render;
pub mod voice;
