//! Export layer.
//!
//! Turns region reads into PNG images for callers that want encoded output
//! rather than raw canvases.
//!
//! # Components
//!
//! - [`RegionService`]: Looks videos up in the registry, reads and encodes regions
//! - [`PngRegionEncoder`]: Lossless RGBA PNG encoding of canvases
//! - [`RegionResponse`]: Encoded bytes plus image size
//! - [`VideoMetadata`]: Serializable description of an opened video

mod encoder;
mod service;

pub use encoder::PngRegionEncoder;
pub use service::{thumbnail_size, LevelMetadata, RegionResponse, RegionService, VideoMetadata};
