use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Color32, Pos2, Rect, Rounding, Sense, Shape, Stroke, Vec2};
use food_core::gesture::stacked_offset;
use food_core::{
    Catalog, DeckEvent, FoodCard, GestureConfig, GestureFrame, GestureTracker, Outcome, SwipeDeck,
};
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tracing::debug;

const CARD_SIZE: Vec2 = Vec2::new(340.0, 480.0);

fn color_for_card(id: &str) -> Color32 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    id.hash(&mut hasher);
    let h = hasher.finish();
    const PALETTE: [Color32; 8] = [
        Color32::from_rgb(230, 126, 34),
        Color32::from_rgb(192, 57, 43),
        Color32::from_rgb(39, 174, 96),
        Color32::from_rgb(41, 128, 185),
        Color32::from_rgb(142, 68, 173),
        Color32::from_rgb(211, 84, 0),
        Color32::from_rgb(22, 160, 133),
        Color32::from_rgb(127, 140, 141),
    ];
    PALETTE[(h as usize) % PALETTE.len()]
}

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub deck: SwipeDeck,
    pub catalog: Catalog,
    pub gesture: GestureConfig,
}

pub struct SwipeApp {
    // Owns the runtime the prefetch tasks run on.
    _runtime: Arc<Runtime>,
    deck: SwipeDeck,
    catalog: Catalog,
    events: broadcast::Receiver<DeckEvent>,
    tracker: GestureTracker,
    frame: Option<GestureFrame>,
    status: Option<String>,
    suggestion: Option<Arc<FoodCard>>,
}

impl SwipeApp {
    pub fn new(init: AppInit) -> Self {
        let events = init.deck.subscribe();
        Self {
            _runtime: init.runtime,
            deck: init.deck,
            catalog: init.catalog,
            events,
            tracker: GestureTracker::new(init.gesture),
            frame: None,
            status: None,
            suggestion: None,
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        self.tracker.cancel();
        self.frame = None;
        self.deck.on_swipe(outcome);
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(DeckEvent::Swiped(report)) => {
                    let verb = match report.outcome {
                        Outcome::Up => "Liked",
                        Outcome::Down => "Disliked",
                        Outcome::Left | Outcome::Right => "Skipped",
                        Outcome::Cancel => continue,
                    };
                    self.status = Some(format!("{verb} {}", report.card.display_name));
                }
                Ok(DeckEvent::Extended { added, len }) => {
                    debug!(added, len, "deck extended");
                }
                Ok(DeckEvent::Reset { len }) => {
                    self.status = Some(format!("Fresh deck of {len} cards"));
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "ui lagged behind deck events");
                }
                Err(_) => break,
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if self.deck.is_exhausted() {
            return;
        }
        let pressed = ctx.input(|input| {
            [
                (egui::Key::ArrowUp, Outcome::Up),
                (egui::Key::ArrowDown, Outcome::Down),
                (egui::Key::ArrowLeft, Outcome::Left),
                (egui::Key::ArrowRight, Outcome::Right),
            ]
            .into_iter()
            .find(|(key, _)| input.key_pressed(*key))
            .map(|(_, outcome)| outcome)
        });
        if let Some(outcome) = pressed {
            self.apply(outcome);
        }
    }

    fn draw_decisions(&mut self, ui: &mut egui::Ui) {
        ui.heading("Liked");
        egui::ScrollArea::vertical()
            .id_source("liked")
            .max_height(260.0)
            .show(ui, |ui| {
                for card in self.deck.liked().iter().rev() {
                    ui.label(format!("👍 {}", card.display_name));
                }
            });
        ui.separator();
        ui.heading("Disliked");
        egui::ScrollArea::vertical()
            .id_source("disliked")
            .max_height(200.0)
            .show(ui, |ui| {
                for card in self.deck.disliked().iter().rev() {
                    ui.label(format!("👎 {}", card.display_name));
                }
            });
        ui.separator();

        if ui.button("🎲 What should I eat?").clicked() {
            self.suggestion = self.catalog.random_pick(&mut rand::thread_rng());
        }
        if let Some(card) = &self.suggestion {
            ui.label(egui::RichText::new(&card.display_name).strong().size(16.0));
        }

        ui.separator();
        let cache = self.deck.cache();
        ui.small(format!(
            "Prefetched images: {} / {}",
            cache.size(),
            cache.config().capacity
        ));
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let active = !self.deck.is_exhausted();
            if ui
                .add_enabled(active, egui::Button::new("👎 Dislike"))
                .clicked()
            {
                self.apply(Outcome::Down);
            }
            if ui.add_enabled(active, egui::Button::new("👍 Like")).clicked() {
                self.apply(Outcome::Up);
            }
            if ui.button("🔄 Reset").clicked() {
                self.tracker.cancel();
                self.frame = None;
                self.deck.reset();
            }
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status);
            }
        });
    }

    fn draw_exhausted(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading("No more cards!");
            if ui.button("Start over").clicked() {
                self.deck.reset();
            }
        });
    }

    fn draw_deck(&mut self, ui: &mut egui::Ui) {
        let config = self.tracker.config().clone();
        let available = ui.available_rect_before_wrap();
        let center = available.center();
        let progress = self.frame.map(|frame| frame.progress).unwrap_or(0.0);

        let window: Vec<Arc<FoodCard>> = self.deck.window().to_vec();
        // Back to front so the top card is painted last.
        for (index, card) in window.iter().enumerate().rev() {
            let mut offset = Vec2::new(0.0, stacked_offset(index, progress, &config));
            let mut rotation = 0.0;
            if index == 0 {
                if let Some(frame) = self.frame {
                    offset += Vec2::new(frame.translate_x, frame.translate_y);
                    rotation = frame.rotation_deg;
                }
            }
            let rect = Rect::from_center_size(center + offset, CARD_SIZE);
            self.paint_card(ui, rect, rotation, card);

            if self.deck.is_top(index) {
                let response = ui.interact(rect, ui.id().with("front-card"), Sense::drag());
                self.track_drag(&response);
            }
        }
    }

    fn track_drag(&mut self, response: &egui::Response) {
        if response.drag_started() && self.deck.can_begin_gesture() {
            self.tracker.begin(true);
        }
        if response.dragged() && self.tracker.is_active() {
            let delta = response.drag_delta();
            self.frame = self.tracker.update(delta.x, delta.y);
            if self.tracker.is_captured() {
                response.ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
            }
        }
        if response.drag_stopped() && self.tracker.is_active() {
            let outcome = self.tracker.release();
            self.frame = None;
            self.deck.on_swipe(outcome);
        }
    }

    fn paint_card(&self, ui: &egui::Ui, rect: Rect, rotation_deg: f32, card: &FoodCard) {
        let painter = ui.painter();
        let fill = color_for_card(&card.id);
        let stroke = Stroke::new(1.0, Color32::from_gray(40));

        if rotation_deg == 0.0 {
            painter.rect(rect, Rounding::same(16.0), fill, stroke);
        } else {
            let rot = egui::emath::Rot2::from_angle(rotation_deg.to_radians());
            let c = rect.center();
            let corners: Vec<Pos2> = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
            ]
            .into_iter()
            .map(|corner| c + rot * (corner - c))
            .collect();
            painter.add(Shape::convex_polygon(corners, fill, stroke));
        }

        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            &card.display_name,
            egui::FontId::proportional(28.0),
            Color32::WHITE,
        );
        let cache = self.deck.cache();
        let badge = if cache.is_cached(&card.image_ref) {
            "image ready"
        } else if self.deck.image_for(card) != card.image_ref {
            "image unavailable, showing a stand-in"
        } else {
            "loading image…"
        };
        painter.text(
            rect.center_bottom() - Vec2::new(0.0, 24.0),
            egui::Align2::CENTER_CENTER,
            badge,
            egui::FontId::proportional(13.0),
            Color32::from_white_alpha(200),
        );
    }
}

impl eframe::App for SwipeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.handle_keys(ctx);

        egui::SidePanel::right("decisions")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| self.draw_decisions(ui));

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            self.draw_controls(ui);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.deck.is_exhausted() {
                self.draw_exhausted(ui);
            } else {
                ui.label("Drag sideways to skip · arrows work too · ↑ like · ↓ dislike");
                self.draw_deck(ui);
            }
        });

        // Badges and the transition guard change without input.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
