pub mod api;
pub mod cli;
pub mod core;
pub mod demos;
pub mod discord;
pub mod google;
