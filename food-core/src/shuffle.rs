use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::warn;

use crate::catalog::{Catalog, FoodCard};

/// Produces randomized orderings of a catalog for the swipe deck.
#[derive(Debug, Clone)]
pub struct DeckGenerator {
    catalog: Catalog,
    rng: StdRng,
}

impl DeckGenerator {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A fresh Fisher-Yates permutation of the whole catalog.
    pub fn shuffle(&mut self) -> Vec<Arc<FoodCard>> {
        shuffle_cards(self.catalog.cards(), &mut self.rng)
    }

    /// `count` more cards taken from successive fresh shuffles, so cards
    /// repeat once the catalog is used up.
    pub fn extend(&mut self, count: usize) -> Vec<Arc<FoodCard>> {
        if self.catalog.is_empty() {
            warn!(count, "cannot extend deck from an empty catalog");
            return Vec::new();
        }
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            let needed = count - batch.len();
            let mut round = self.shuffle();
            round.truncate(needed);
            batch.extend(round);
        }
        batch
    }
}

pub fn shuffle_cards<R: rand::Rng + ?Sized>(
    cards: &[Arc<FoodCard>],
    rng: &mut R,
) -> Vec<Arc<FoodCard>> {
    if cards.is_empty() {
        warn!("refusing to shuffle an empty catalog");
        return Vec::new();
    }
    let mut shuffled = cards.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog_of(size: usize) -> Catalog {
        Catalog::new(
            (0..size)
                .map(|i| FoodCard::new(i.to_string(), format!("food {i}"), format!("https://e/{i}.jpg")))
                .collect(),
        )
    }

    fn sorted_ids(cards: &[Arc<FoodCard>]) -> Vec<String> {
        let mut ids: Vec<String> = cards.iter().map(|card| card.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn empty_catalog_shuffles_to_nothing() {
        let mut generator = DeckGenerator::with_seed(Catalog::default(), 1);
        assert!(generator.shuffle().is_empty());
        assert!(generator.extend(5).is_empty());
    }

    #[test]
    fn shuffles_usually_change_the_order() {
        let catalog = catalog_of(10);
        let original: Vec<String> = catalog.cards().iter().map(|c| c.id.clone()).collect();
        let mut generator = DeckGenerator::with_seed(catalog, 42);
        let unchanged = (0..100)
            .filter(|_| {
                let order: Vec<String> = generator.shuffle().iter().map(|c| c.id.clone()).collect();
                order == original
            })
            .count();
        assert!(unchanged < 5, "{unchanged} of 100 shuffles left the order intact");
    }

    #[test]
    fn extend_takes_a_prefix_of_a_fresh_shuffle() {
        let mut generator = DeckGenerator::with_seed(catalog_of(10), 3);
        let batch = generator.extend(5);
        assert_eq!(batch.len(), 5);
        let mut ids = sorted_ids(&batch);
        ids.dedup();
        assert_eq!(ids.len(), 5, "one shuffle round never repeats a card");
    }

    #[test]
    fn extend_resamples_small_catalogs() {
        let mut generator = DeckGenerator::with_seed(catalog_of(2), 9);
        let batch = generator.extend(5);
        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|card| card.id == "0" || card.id == "1"));
    }

    proptest! {
        #[test]
        fn shuffle_is_a_permutation(size in 1..60usize, seed in any::<u64>()) {
            let catalog = catalog_of(size);
            let expected = sorted_ids(catalog.cards());
            let mut generator = DeckGenerator::with_seed(catalog, seed);
            prop_assert_eq!(sorted_ids(&generator.shuffle()), expected);
        }

        #[test]
        fn extend_yields_exactly_the_requested_count(size in 1..12usize, count in 0..40usize, seed in any::<u64>()) {
            let mut generator = DeckGenerator::with_seed(catalog_of(size), seed);
            prop_assert_eq!(generator.extend(count).len(), count);
        }
    }
}
