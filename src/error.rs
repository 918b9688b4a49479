//! Error types for engine setup.
//!
//! The per-frame animation path never fails; everything here comes from
//! acquiring GPU resources, parsing configuration, or building the DOM
//! overlay. Errors are converted to `JsValue` at the wasm boundary.

use std::fmt;
use wasm_bindgen::JsValue;

/// Errors that can occur while setting up or resizing the scene.
#[derive(Debug)]
pub enum Error {
    /// The canvas could not provide a WebGL2 context.
    WebGl(String),
    /// A shader failed to compile.
    Shader(String),
    /// A shader program failed to link.
    Program(String),
    /// A buffer, texture, framebuffer or VAO could not be created.
    Resource(String),
    /// Scene configuration could not be parsed or is out of range.
    Config(String),
    /// A DOM node was missing or had the wrong type.
    Dom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WebGl(msg) => write!(f, "WebGL2 unavailable: {}", msg),
            Error::Shader(log) => write!(f, "Shader compilation failed: {}", log),
            Error::Program(log) => write!(f, "Program linking failed: {}", log),
            Error::Resource(what) => write!(f, "Failed to create {}", what),
            Error::Config(msg) => write!(f, "Invalid scene config: {}", msg),
            Error::Dom(msg) => write!(f, "DOM error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(format!("YAML parse error: {}", e))
    }
}

impl From<Error> for JsValue {
    fn from(e: Error) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::Resource("instance buffer".to_string()).to_string(),
            "Failed to create instance buffer"
        );
        assert!(Error::Config("count".to_string()).to_string().contains("count"));
    }

    #[test]
    fn test_yaml_error_becomes_config_error() {
        let err = serde_yaml::from_str::<u32>("[not a number").unwrap_err();
        assert!(matches!(Error::from(err), Error::Config(_)));
    }
}
