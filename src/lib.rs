pub mod app;
pub mod cli;
pub mod columns;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod query;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
