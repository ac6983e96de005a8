use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{PrefetchCache, PrefetchSummary};
use crate::catalog::FoodCard;
use crate::config::DeckConfig;
use crate::gesture::{Decision, Outcome};
use crate::image_url::fallback_image;
use crate::shuffle::DeckGenerator;

const EVENT_CAPACITY: usize = 64;
// Used when a configured settle window does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    Active,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwipeReport {
    pub outcome: Outcome,
    /// The card that was on top when the swipe landed.
    pub card: Arc<FoodCard>,
    /// Cursor after the swipe.
    pub cursor: usize,
    /// Number of cards appended by a low-water extension.
    pub extended: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    Swiped(SwipeReport),
    Extended { added: usize, len: usize },
    Reset { len: usize },
}

pub struct SwipeDeck {
    generator: DeckGenerator,
    cache: PrefetchCache,
    config: DeckConfig,
    cards: Vec<Arc<FoodCard>>,
    cursor: usize,
    liked: Vec<Arc<FoodCard>>,
    disliked: Vec<Arc<FoodCard>>,
    settle_until: Option<Instant>,
    events: broadcast::Sender<DeckEvent>,
    pending: Vec<JoinHandle<PrefetchSummary>>,
    settled: PrefetchSummary,
}

impl SwipeDeck {
    pub fn new(generator: DeckGenerator, cache: PrefetchCache, config: DeckConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut deck = Self {
            generator,
            cache,
            config,
            cards: Vec::new(),
            cursor: 0,
            liked: Vec::new(),
            disliked: Vec::new(),
            settle_until: None,
            events,
            pending: Vec::new(),
            settled: PrefetchSummary::default(),
        };
        deck.reset();
        deck
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.events.subscribe()
    }

    /// Replaces the deck with a fresh shuffle and forgets every decision.
    pub fn reset(&mut self) {
        self.cards = self.generator.shuffle();
        self.cursor = 0;
        self.liked.clear();
        self.disliked.clear();
        self.settle_until = None;

        if self.cards.is_empty() {
            warn!("deck reset with an empty catalog; nothing to swipe");
        } else {
            let preview: Vec<&str> = self
                .cards
                .iter()
                .take(self.config.initial_prefetch)
                .map(|card| card.display_name.as_str())
                .collect();
            info!(len = self.cards.len(), first = ?preview, "deck shuffled");
        }

        let initial = self.config.initial_prefetch.min(self.cards.len());
        let uris = self.image_refs(0..initial);
        self.schedule_prefetch(uris);
        self.emit(DeckEvent::Reset {
            len: self.cards.len(),
        });
    }

    pub fn state(&self) -> DeckState {
        if self.cursor < self.cards.len() {
            DeckState::Active
        } else {
            DeckState::Exhausted
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state() == DeckState::Exhausted
    }

    pub fn current_card(&self) -> Option<&Arc<FoodCard>> {
        self.cards.get(self.cursor)
    }

    /// Up to `count` cards starting at the cursor, front card first.
    pub fn visible_window(&self, count: usize) -> &[Arc<FoodCard>] {
        let end = self.cursor.saturating_add(count).min(self.cards.len());
        &self.cards[self.cursor..end]
    }

    pub fn window(&self) -> &[Arc<FoodCard>] {
        self.visible_window(self.config.window)
    }

    /// Only the front card takes gestures.
    pub fn is_top(&self, window_index: usize) -> bool {
        window_index == 0 && !self.is_exhausted()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Arc<FoodCard>] {
        &self.cards
    }

    pub fn liked(&self) -> &[Arc<FoodCard>] {
        &self.liked
    }

    pub fn disliked(&self) -> &[Arc<FoodCard>] {
        &self.disliked
    }

    pub fn cache(&self) -> &PrefetchCache {
        &self.cache
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// The image to show for `card`: its own until a fetch for it fails,
    /// then a stand-in that stays the same for that card.
    pub fn image_for<'a>(&self, card: &'a FoodCard) -> &'a str {
        if self.cache.has_failed(&card.image_ref) {
            fallback_image(&card.image_ref)
        } else {
            &card.image_ref
        }
    }

    /// True while the previous card's exit animation is settling.
    pub fn is_transitioning(&self) -> bool {
        self.settle_until
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    /// Whether a new drag may start on the front card. This gates gestures
    /// only; [`SwipeDeck::on_swipe`] is always applied immediately.
    pub fn can_begin_gesture(&self) -> bool {
        !self.is_exhausted() && !self.is_transitioning()
    }

    pub fn like(&mut self) -> Option<SwipeReport> {
        self.on_swipe(Outcome::Up)
    }

    pub fn dislike(&mut self) -> Option<SwipeReport> {
        self.on_swipe(Outcome::Down)
    }

    /// Applies a classified gesture to the front card.
    ///
    /// Returns `None` when there is no card to swipe. `Cancel` reports the
    /// front card without changing anything.
    pub fn on_swipe(&mut self, outcome: Outcome) -> Option<SwipeReport> {
        let Some(card) = self.current_card().cloned() else {
            warn!(
                cursor = self.cursor,
                len = self.cards.len(),
                ?outcome,
                "swipe ignored: no current card"
            );
            return None;
        };

        if !outcome.advances() {
            debug!(cursor = self.cursor, "swipe cancelled");
            return Some(SwipeReport {
                outcome,
                card,
                cursor: self.cursor,
                extended: 0,
            });
        }

        match outcome.decision() {
            Some(Decision::Like) => self.liked.push(card.clone()),
            Some(Decision::Dislike) => self.disliked.push(card.clone()),
            None => {}
        }
        self.cursor += 1;
        self.settle_until = Some(deadline_after(self.config.settle_window()));

        let (extended, mut uris) = self.top_up();
        uris.extend(self.lookahead_refs());
        self.schedule_prefetch(uris);

        let report = SwipeReport {
            outcome,
            card,
            cursor: self.cursor,
            extended,
        };
        debug!(
            id = %report.card.id,
            ?outcome,
            cursor = self.cursor,
            len = self.cards.len(),
            "card swiped"
        );
        self.emit(DeckEvent::Swiped(report.clone()));
        Some(report)
    }

    /// Appends a fresh batch when fewer than `low_water_mark` cards remain.
    /// Returns the number of cards added and their image refs.
    fn top_up(&mut self) -> (usize, Vec<String>) {
        let remaining = self.cards.len() - self.cursor;
        if remaining >= self.config.low_water_mark {
            return (0, Vec::new());
        }
        let needed = self.config.low_water_mark - remaining;
        let batch = self.generator.extend(self.config.extend_batch.max(needed));
        if batch.is_empty() {
            return (0, Vec::new());
        }

        let start = self.cards.len();
        let added = batch.len();
        self.cards.extend(batch);
        let uris = self.image_refs(start..self.cards.len());

        debug!(added, len = self.cards.len(), "deck extended");
        self.emit(DeckEvent::Extended {
            added,
            len: self.cards.len(),
        });
        (added, uris)
    }

    // Offered again on every advance; the cache skips what is still fresh,
    // so images that failed earlier get retried.
    fn lookahead_refs(&self) -> Vec<String> {
        let start = (self.cursor + 1).min(self.cards.len());
        let end = (start + self.config.lookahead).min(self.cards.len());
        self.image_refs(start..end)
    }

    fn image_refs(&self, range: std::ops::Range<usize>) -> Vec<String> {
        self.cards[range]
            .iter()
            .map(|card| card.image_ref.clone())
            .collect()
    }

    fn schedule_prefetch(&mut self, mut uris: Vec<String>) {
        let mut seen = HashSet::new();
        uris.retain(|uri| seen.insert(uri.clone()) && !self.cache.is_cached(uri));
        if uris.is_empty() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            debug!(count = uris.len(), "no tokio runtime, skipping prefetch");
            return;
        };
        self.harvest_finished();
        let cache = self.cache.clone();
        self.pending
            .push(runtime.spawn(async move { cache.prefetch_many(uris).await }));
    }

    // Folds finished prefetch tasks into `settled` so `pending` stays short.
    fn harvest_finished(&mut self) {
        let mut still_running = Vec::with_capacity(self.pending.len());
        for handle in self.pending.drain(..) {
            if !handle.is_finished() {
                still_running.push(handle);
                continue;
            }
            match handle.now_or_never() {
                Some(Ok(summary)) => accumulate(&mut self.settled, summary),
                Some(Err(err)) => warn!(error = %err, "prefetch task failed"),
                None => {}
            }
        }
        self.pending = still_running;
    }

    /// Waits for every prefetch started so far and returns their combined
    /// summary since the last call.
    pub async fn settle_prefetch(&mut self) -> PrefetchSummary {
        let mut total = std::mem::take(&mut self.settled);
        for handle in self.pending.drain(..) {
            match handle.await {
                Ok(summary) => accumulate(&mut total, summary),
                Err(err) => warn!(error = %err, "prefetch task failed"),
            }
        }
        total
    }

    fn emit(&self, event: DeckEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn deadline_after(window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(window).unwrap_or(now + FAR_FUTURE)
}

fn accumulate(total: &mut PrefetchSummary, summary: PrefetchSummary) {
    total.requested += summary.requested;
    total.succeeded += summary.succeeded;
    total.failed += summary.failed;
    total.batches += summary.batches;
}

impl std::fmt::Debug for SwipeDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwipeDeck")
            .field("cursor", &self.cursor)
            .field("len", &self.cards.len())
            .field("liked", &self.liked.len())
            .field("disliked", &self.disliked.len())
            .field("pending_prefetch", &self.pending.len())
            .finish_non_exhaustive()
    }
}
