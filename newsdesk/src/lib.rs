// Library interface for newsdesk modules
// This allows tests and the binary to import modules

pub mod clipboard;
pub mod console;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod processing;
pub mod scraping;
