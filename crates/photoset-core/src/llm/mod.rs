//! Vision API adapter.
//!
//! Normalizes the DashScope (Qwen-VL) and OpenAI-compatible request/response
//! shapes behind one [`VisionProvider`] trait, plus an offline demo provider.

pub(crate) mod dashscope;
pub(crate) mod demo;
pub(crate) mod openai;
pub(crate) mod provider;

#[cfg(test)]
pub(crate) mod stub;

pub use provider::{describe, Dialect, ImageInput, VisionProvider, VisionProviderFactory};
