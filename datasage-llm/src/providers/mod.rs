//! Built-in model provider implementations.

pub mod gemini;
