pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod nav;
pub mod output;
pub mod production;
pub mod resources;
pub mod utils;

#[cfg(test)]
mod tests;
