// Library interface for hotnews modules
// This allows tests and other binaries to import modules

pub mod blocks;
pub mod delivery;
pub mod driver;
pub mod ingestion;
pub mod llm;
pub mod pipeline;
pub mod scraping;
pub mod text;
