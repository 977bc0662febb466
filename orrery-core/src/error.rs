/// Error types for loading and running the viewer
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::backend::ShaderStage;

/// Failures while reading a mesh description
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to open mesh {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read mesh data: {0}")]
    Read(#[from] io::Error),

    /// The stream was read to the end but produced no vertices
    #[error("mesh {0} has no vertices")]
    NoVertices(String),
}

/// Failures while loading a texture image
#[derive(Error, Debug)]
pub enum ResourceLoadError {
    #[error("failed to load texture {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Shader compile or link diagnostics
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Top-level error for the viewer
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resource(#[from] ResourceLoadError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("window error: {0}")]
    Io(#[from] io::Error),
}
