// crimson-api: Async Rust client for the Generative Language (Gemini) REST API.

pub mod error;
pub mod gemini;
pub mod transport;

pub use error::Error;
pub use gemini::GeminiClient;
pub use gemini::models::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    Schema, SchemaType,
};
pub use transport::{TlsMode, TransportConfig};
