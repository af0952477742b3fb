//! Inference backend implementations for Vesper.
//!
//! Two concrete backends share the same OpenAI-style chat-completions wire
//! format: a higher-quality networked endpoint and a constrained local
//! server (llama-server / Ollama style). `FallbackBackend` chains them in
//! preference order so the reasoning loop stays backend-agnostic.

pub mod fallback;
pub mod local;
pub mod remote;
mod wire;

pub use fallback::FallbackBackend;
pub use local::LocalBackend;
pub use remote::RemoteBackend;
