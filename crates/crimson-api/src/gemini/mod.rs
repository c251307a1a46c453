// Generative Language API surface.
//
// `client` owns transport mechanics (URL construction, auth header,
// error envelope decoding); `models` holds the wire types.

mod client;
pub mod models;

pub use client::GeminiClient;
