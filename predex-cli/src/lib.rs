// All core functionality is in predex-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod corpus_manager;
pub mod openfda;

// Re-export core types for convenience
pub use predex_core::*;

// Re-export CLI utilities
pub use corpus_manager::CorpusManager;
pub use openfda::OpenFdaClient;
