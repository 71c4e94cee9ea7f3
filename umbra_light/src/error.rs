// Copyright 2025 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable errors. Caller bugs (stale keys, bad parameters) panic instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a hull outline.
#[derive(Debug, Error)]
pub enum HullLoadError {
    /// The file could not be read.
    #[error("failed to read hull file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A token is not a number.
    #[error("invalid coordinate {token:?} at token {index}")]
    InvalidNumber {
        /// Offending token.
        token: String,
        /// Zero-based token position.
        index: usize,
    },
    /// The coordinate count is odd.
    #[error("coordinate {index} has no matching y value")]
    UnpairedCoordinate {
        /// Zero-based token position of the dangling value.
        index: usize,
    },
    /// Too few vertices for a polygon.
    #[error("a hull needs at least 3 vertices, found {found}")]
    TooFewVertices {
        /// Vertices parsed.
        found: usize,
    },
}

/// Failure reported by a [`RenderBackend`](crate::RenderBackend).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested surface is larger than the backend supports.
    #[error("surface of {width}x{height} exceeds the maximum size {max}")]
    SurfaceTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Backend limit.
        max: u32,
    },
    /// The backend could not allocate the surface.
    #[error("surface allocation failed: {0}")]
    Allocation(String),
}

/// Failure to set up a [`LightSystem`](crate::LightSystem).
#[derive(Debug, Error)]
pub enum LightSystemError {
    /// The backend lacks a feature the compositing pipeline relies on.
    #[error("render backend is unsupported: {0}")]
    UnsupportedBackend(&'static str),
}
