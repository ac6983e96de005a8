mod app;

use std::path::PathBuf;
use std::sync::Arc;

use eframe::{egui, NativeOptions};
use food_core::{
    app_config_dir, AppConfig, Catalog, DeckGenerator, HttpImageFetcher, PrefetchCache, SwipeDeck,
};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, SwipeApp};

fn main() -> eframe::Result<()> {
    init_tracing();

    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    // Keep the runtime entered on the UI thread so the deck can spawn prefetches.
    let _runtime_guard = runtime.enter();

    let config = AppConfig::load();
    let catalog = load_catalog();
    info!(cards = catalog.len(), "catalog ready");

    let client = HttpImageFetcher::client().expect("failed to build HTTP client");
    let fetcher = Arc::new(HttpImageFetcher::new(client, config.cache.clone()));
    let cache = PrefetchCache::new(fetcher, config.cache.clone());
    let deck = SwipeDeck::new(
        DeckGenerator::new(catalog.clone()),
        cache,
        config.deck.clone(),
    );

    let init = AppInit {
        runtime: runtime.clone(),
        deck,
        catalog,
        gesture: config.gesture.clone(),
    };

    eframe::run_native(
        "FoodSwipe",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([720.0, 820.0])
                .with_min_inner_size([520.0, 640.0]),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(SwipeApp::new(init))),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Catalog from the first CLI argument, then `<config>/foodswipe/foods.json`,
/// then the catalog bundled with the core crate.
fn load_catalog() -> Catalog {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return Catalog::load_or_default(path);
    }
    match app_config_dir() {
        Ok(dir) if dir.join("foods.json").exists() => Catalog::load_or_default(dir.join("foods.json")),
        _ => Catalog::bundled(),
    }
}
