pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod filter;
pub mod http;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod registry;
