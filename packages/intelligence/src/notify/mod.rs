//! Outbound alerting.

pub mod discord;

pub use discord::DiscordAlerter;
