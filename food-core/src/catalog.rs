use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CatalogError;

const BUNDLED_CATALOG: &str = include_str!("../data/foods.json");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FoodCard {
    pub id: String,
    pub display_name: String,
    pub image_ref: String,
}

impl FoodCard {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            image_ref: image_ref.into(),
        }
    }
}

/// Catalog ids show up both as strings and as plain integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
struct RawFoodRecord {
    id: RawId,
    name: String,
    #[serde(alias = "image_url")]
    url: String,
}

impl RawFoodRecord {
    fn into_card(self) -> Option<FoodCard> {
        let id = match self.id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        };
        let name = self.name.trim();
        let url = self.url.trim();
        if id.is_empty() || name.is_empty() || url.is_empty() {
            return None;
        }
        Some(FoodCard::new(id, name, url))
    }
}

/// Immutable, fully resident list of food cards.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: Arc<[Arc<FoodCard>]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    pub fn new(cards: Vec<FoodCard>) -> Self {
        Self {
            cards: cards.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parses either a top-level array or `{ "foods": [...] }`, dropping
    /// records that do not carry an id, a name and an image url.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(json)?;
        let records = match value {
            Value::Array(records) => records,
            Value::Object(mut object) => match object.remove("foods") {
                Some(Value::Array(records)) => records,
                _ => return Err(CatalogError::NotAnArray),
            },
            _ => return Err(CatalogError::NotAnArray),
        };

        let total = records.len();
        let cards: Vec<FoodCard> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let card = serde_json::from_value::<RawFoodRecord>(record)
                    .ok()
                    .and_then(RawFoodRecord::into_card);
                if card.is_none() {
                    warn!(index, "dropping malformed catalog record");
                }
                card
            })
            .collect();

        if cards.is_empty() {
            warn!(total, "catalog contains no valid records");
        } else {
            debug!(valid = cards.len(), total, "catalog parsed");
        }
        Ok(Self::new(cards))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Loads a catalog file, falling back to [`Catalog::default_foods`] on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to load catalog, using defaults");
                Self::default_foods()
            }
        }
    }

    /// The catalog shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_CATALOG).unwrap_or_else(|err| {
            warn!(error = %err, "bundled catalog is invalid, using defaults");
            Self::default_foods()
        })
    }

    pub fn default_foods() -> Self {
        Self::new(vec![
            FoodCard::new(
                "1",
                "Pasta",
                "https://images.unsplash.com/photo-1504674900242-4197e29bdab7?w=400&h=600&fit=crop",
            ),
            FoodCard::new(
                "2",
                "Fresh salad",
                "https://images.unsplash.com/photo-1512621776951-a57141f2eefd?w=400&h=600&fit=crop",
            ),
            FoodCard::new(
                "3",
                "Roast chicken",
                "https://images.unsplash.com/photo-1565299624946-b28f40a0ca4b?w=400&h=600&fit=crop",
            ),
        ])
    }

    pub fn cards(&self) -> &[Arc<FoodCard>] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Picks a single card uniformly at random.
    pub fn random_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<FoodCard>> {
        self.cards.choose(rng).cloned()
    }
}
