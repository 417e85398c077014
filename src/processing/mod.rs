//! Request handling, response normalization and the match engine

pub mod analyzer;
pub mod normalizer;
pub mod request;
pub mod result;
pub mod scoring;
pub mod text_processor;
