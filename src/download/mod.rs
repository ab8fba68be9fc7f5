//! Song download pipeline and its building blocks

pub mod error;
pub mod pipeline;
pub mod source;
pub mod tags;
pub mod thumbnail;
pub mod workspace;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::FetchError;
pub use pipeline::{ArtworkPolicy, FetchPipeline, FetchResult, PipelineConfig};
pub use source::{MediaInfo, MediaSource};
pub use ytdlp::YtDlpSource;
