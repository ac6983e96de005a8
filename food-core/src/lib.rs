pub mod cache;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod fetch;
pub mod gesture;
pub mod image_url;
pub mod shuffle;

pub use cache::{ImageFetcher, PrefetchCache, PrefetchSummary};
pub use catalog::{Catalog, FoodCard};
pub use config::{app_config_dir, AppConfig, CacheConfig, DeckConfig, GestureConfig};
pub use deck::{DeckEvent, DeckState, SwipeDeck, SwipeReport};
pub use error::{CatalogError, ConfigError, FetchError};
pub use fetch::HttpImageFetcher;
pub use gesture::{classify, Decision, GestureFrame, GestureSample, GestureTracker, Outcome, Thresholds};
pub use image_url::{fallback_image, optimize_image_url, ImageSize};
pub use shuffle::DeckGenerator;
