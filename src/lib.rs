pub mod config;
pub mod error;
pub mod fallback;
pub mod gate;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod services;
pub mod storage;

pub use config::{
    ImageServiceConfig, LimitsConfig, StoreConfig, StudioConfig, TextServiceConfig,
};
pub use error::{Result, StudioError};
pub use gate::{DenialReason, GateDecision};
pub use models::*;
pub use pipeline::StudioClient;
pub use progress::{ProgressEstimator, ProgressHandle};
pub use services::{BrandResolution, BrandResolver, ImageService, TextService};
pub use storage::{ArtifactStore, CreativeStore, MemoryStore, StoreManager, UsageStore};
