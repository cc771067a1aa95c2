pub mod cipher;
pub mod config;
pub mod engine;
pub mod error;

pub use cipher::CredentialCipher;
pub use config::Config;
pub use engine::EngineKind;
pub use error::*;
