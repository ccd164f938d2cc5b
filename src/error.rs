//! Crate error types

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised while loading meshes, images and LUTs from disk
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to load OBJ {name}: {source}")]
    Obj {
        name: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("OBJ {0} contains no triangles")]
    EmptyMesh(String),
    #[error("LUT parse error on line {line}: {message}")]
    Lut { line: usize, message: String },
    #[error("Invalid cube map: {0}")]
    CubeMap(String),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Top-level error of the demo application
#[derive(Error, Debug)]
pub enum DemoError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Window error: {0}")]
    Window(String),
}

pub type DemoResult<T> = Result<T, DemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_error_reports_line() {
        let err = AssetError::Lut {
            line: 7,
            message: "expected 3 values".into(),
        };
        assert_eq!(err.to_string(), "LUT parse error on line 7: expected 3 values");
    }

    #[test]
    fn asset_error_converts_into_demo_error() {
        let err: DemoError = AssetError::CubeMap("faces differ".into()).into();
        assert!(matches!(err, DemoError::Asset(_)));
        assert_eq!(err.to_string(), "Invalid cube map: faces differ");
    }
}
