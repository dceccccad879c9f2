//! Domain errors for the two loads that can fail at runtime.
//!
//! Everything else in the crate propagates `anyhow::Error`; these two are
//! typed because callers react to them differently: an environment failure is
//! logged and rendering continues, an asset failure is handed back to the
//! orchestrator.

use thiserror::Error;

/// Failure to fetch or decode the display asset.
#[derive(Error, Debug)]
pub enum AssetLoadError
{
        #[error("unable to read asset {path}: {source}")]
        Io
        {
                path: String,
                #[source]
                source: std::io::Error,
        },

        #[error("unable to decode glTF asset {path}: {source}")]
        Gltf
        {
                path: String,
                #[source]
                source: gltf::Error,
        },

        #[error("unable to fetch asset {0}")]
        Fetch(String),

        #[error("unsupported asset format: {0}")]
        UnsupportedFormat(String),

        #[error("asset {0} contains no renderable geometry")]
        Empty(String),

        #[error("an asset is already loaded into this display object")]
        AlreadyLoaded,
}

/// Failure to fetch or decode the environment map.
#[derive(Error, Debug)]
pub enum EnvironmentLoadError
{
        #[error("unable to read environment map {path}: {source}")]
        Io
        {
                path: String,
                #[source]
                source: std::io::Error,
        },

        #[error("unable to fetch environment map {0}")]
        Fetch(String),

        #[error("unable to decode environment map: {0}")]
        Decode(#[from] image::ImageError),
}
