mod common;

pub mod codec;
pub mod config;
pub mod cycle;
pub mod downsample;
pub mod probe;
pub mod reader;
pub mod runtime;
pub mod settings;
