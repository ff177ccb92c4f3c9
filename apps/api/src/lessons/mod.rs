pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod service;
pub mod store;

#[cfg(test)]
pub mod testing;
