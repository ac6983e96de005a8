#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use food_core::{
    CacheConfig, Catalog, DeckConfig, DeckGenerator, FetchError, FoodCard, ImageFetcher,
    PrefetchCache, SwipeDeck,
};

/// Fake fetcher that logs `start:<uri>` / `end:<uri>` around a yield point.
#[derive(Default)]
pub struct RecordingFetcher {
    log: Mutex<Vec<String>>,
    failing: HashSet<String>,
    // fail the first attempt of every uri
    flaky: bool,
}

impl RecordingFetcher {
    pub fn failing_on(uris: &[&str]) -> Self {
        Self {
            failing: uris.iter().map(|uri| uri.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn flaky() -> Self {
        Self {
            flaky: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self, uri: &str) -> usize {
        self.started().iter().filter(|started| *started == uri).count()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|line| line.strip_prefix("start:").map(str::to_owned))
            .collect()
    }
}

#[async_trait]
impl ImageFetcher for RecordingFetcher {
    async fn prefetch(&self, uri: &str) -> Result<(), FetchError> {
        self.log.lock().unwrap().push(format!("start:{uri}"));
        let first_attempt = self.attempts(uri) == 1;
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(format!("end:{uri}"));
        if self.failing.contains(uri) || (self.flaky && first_attempt) {
            Err(FetchError::Other(format!("{uri} unavailable")))
        } else {
            Ok(())
        }
    }
}

pub fn catalog_of(names: &[&str]) -> Catalog {
    Catalog::new(
        names
            .iter()
            .map(|name| FoodCard::new(*name, name.to_uppercase(), format!("https://img.test/{name}.jpg")))
            .collect(),
    )
}

pub fn numbered_catalog(size: usize) -> Catalog {
    Catalog::new(
        (0..size)
            .map(|i| FoodCard::new(i.to_string(), format!("food {i}"), format!("https://img.test/{i}.jpg")))
            .collect(),
    )
}

pub fn cache_with(fetcher: Arc<RecordingFetcher>) -> PrefetchCache {
    PrefetchCache::new(fetcher, CacheConfig::default())
}

pub fn deck_for(catalog: Catalog, seed: u64) -> (SwipeDeck, Arc<RecordingFetcher>) {
    let fetcher = Arc::new(RecordingFetcher::default());
    let deck = deck_with(catalog, seed, fetcher.clone(), DeckConfig::default());
    (deck, fetcher)
}

pub fn deck_with(
    catalog: Catalog,
    seed: u64,
    fetcher: Arc<RecordingFetcher>,
    config: DeckConfig,
) -> SwipeDeck {
    SwipeDeck::new(
        DeckGenerator::with_seed(catalog, seed),
        cache_with(fetcher),
        config,
    )
}

pub fn ids(cards: &[Arc<FoodCard>]) -> Vec<String> {
    cards.iter().map(|card| card.id.clone()).collect()
}
