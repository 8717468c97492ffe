//! Public browse view: stats header, search/sort bar and the infinite card grid

use super::detail::DetailState;
use super::App;
use crate::constants::{BROWSE_PAGE_SIZE, LOAD_MORE_MARGIN, SEARCH_DEBOUNCE};
use crate::debounce::Debouncer;
use crate::query::FeedQuery;
use crate::theme;
use crate::types::{SortField, SortOrder, Token, TokenQueryParams, TokenStats};
use crate::ui::components::{loading_row, placeholder, skeleton_card, stat_tile, symbol_badge, token_avatar};
use crate::utils::{format_market_cap, format_number, format_price, format_supply};
use eframe::egui;
use egui_phosphor::regular as icons;
use std::time::Instant;
use tracing::debug;

pub struct BrowseState {
    /// Text as typed; the query only sees it once the debouncer settles
    pub(crate) search_text: String,
    search: Debouncer<String>,
    pub(crate) sort: SortField,
    pub(crate) order: SortOrder,
}

impl BrowseState {
    pub fn new(sort: SortField, order: SortOrder) -> Self {
        Self {
            search_text: String::new(),
            search: Debouncer::new(String::new(), SEARCH_DEBOUNCE),
            sort,
            order,
        }
    }

    pub fn search_changed(&mut self, now: Instant) {
        self.search.set(self.search_text.trim().to_string(), now);
    }

    /// Settle the search term if it has been quiet long enough. Returns
    /// true when the effective query changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.search.poll(now) {
            Some(term) => {
                debug!(search = %term, "Search settled");
                true
            }
            None => false,
        }
    }

    pub fn params(&self) -> TokenQueryParams {
        let term = self.search.value();
        TokenQueryParams {
            limit: Some(BROWSE_PAGE_SIZE),
            search: (!term.is_empty()).then(|| term.clone()),
            sort_by: Some(self.sort),
            sort_order: Some(self.order),
            ..TokenQueryParams::default()
        }
    }
}

/// Whether the viewport bottom is within `LOAD_MORE_MARGIN` of the content end
fn near_end(offset: f32, viewport_height: f32, content_height: f32) -> bool {
    offset + viewport_height >= content_height - LOAD_MORE_MARGIN
}

impl App {
    pub(crate) fn render_browse(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let now = Instant::now();
        self.browse.tick(now);
        if let Some(left) = self.browse.search.remaining(now) {
            ctx.request_repaint_after(left);
        }

        ui.label(
            egui::RichText::new("Discover Tokens")
                .size(theme::FONT_DISPLAY)
                .strong()
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(theme::SPACING_LG);
        self.render_stats_header(ui);
        ui.add_space(theme::SPACING_XL);
        self.render_browse_toolbar(ui, now);
        ui.add_space(theme::SPACING_LG);

        let params = self.browse.params();
        let feed = self.query.feed(&params);

        if feed.is_loading() {
            self.render_skeleton_grid(ui);
            return;
        }
        if feed.tokens.is_empty() {
            if let Some(err) = &feed.error {
                placeholder(ui, icons::WARNING_CIRCLE, "Failed to load tokens. Please try again.", err);
                ui.vertical_centered(|ui| {
                    if ui.add(theme::button(format!("{} Retry", icons::ARROW_CLOCKWISE))).clicked() {
                        self.query.invalidate_all();
                    }
                });
            } else if feed.is_empty() {
                let detail = if params.search.is_some() {
                    "Try a different search term."
                } else {
                    ""
                };
                placeholder(ui, icons::COINS, "No tokens found.", detail);
            }
            return;
        }

        let output = egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .id_salt("browse_scroll")
            .show(ui, |ui| {
                self.render_card_grid(ui, ctx, &feed.tokens);
                ui.add_space(theme::SPACING_XL);
                self.render_feed_footer(ui, &feed);
                ui.add_space(theme::SPACING_XL);
            });

        let at_end = near_end(
            output.state.offset.y,
            output.inner_rect.height(),
            output.content_size.y,
        );
        if at_end && feed.has_next_page && !feed.is_fetching_next_page && feed.error.is_none() {
            self.query.fetch_next_page(&params);
        }
    }

    fn render_stats_header(&mut self, ui: &mut egui::Ui) {
        let stats = self.query.stats();
        let value = |f: &dyn Fn(&TokenStats) -> String| match (&stats.data, &stats.error) {
            (Some(s), _) => f(s),
            (None, Some(_)) => "-".to_string(),
            (None, None) => "...".to_string(),
        };
        let total = value(&|s| format_number(Some(s.total_tokens as f64)));
        let cap = value(&|s| format_market_cap(Some(s.total_market_cap)));
        let average = value(&|s| format_price(Some(s.average_price)));

        let spacing = theme::SPACING_LG;
        // section_frame adds 12px margin and 1px stroke on each side
        let tile_w = ((ui.available_width() - spacing * 2.0) / 3.0 - 26.0).max(80.0);
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = spacing;
            stat_tile(ui, "Total Tokens", &total, tile_w);
            stat_tile(ui, "Total Market Cap", &cap, tile_w);
            stat_tile(ui, "Average Price", &average, tile_w);
        });
    }

    fn render_browse_toolbar(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.horizontal(|ui| {
            egui::Frame::new()
                .fill(theme::BG_INPUT)
                .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_SUBTLE))
                .corner_radius(theme::RADIUS_DEFAULT)
                .inner_margin(egui::Margin::symmetric(8, 6))
                .show(ui, |ui| {
                    ui.spacing_mut().item_spacing.x = theme::SPACING_SM;
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(icons::MAGNIFYING_GLASS)
                                .size(theme::FONT_BODY)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.browse.search_text)
                            .hint_text("Search tokens by name or symbol...")
                            .frame(false)
                            .desired_width(320.0),
                    );
                    if response.changed() {
                        self.browse.search_changed(now);
                    }
                    if !self.browse.search_text.is_empty() && theme::icon_button(ui, icons::X, theme::TEXT_PRIMARY, true).clicked() {
                        self.browse.search_text.clear();
                        self.browse.search_changed(now);
                    }
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut ascending = self.browse.order == SortOrder::Asc;
                let up = format!("{} Asc", icons::ARROW_UP);
                let down = format!("{} Desc", icons::ARROW_DOWN);
                if theme::segmented_toggle(ui, &up, &down, &mut ascending) {
                    self.browse.order = if ascending { SortOrder::Asc } else { SortOrder::Desc };
                    debug!(order = ?self.browse.order, "Sort order changed");
                }

                let before = self.browse.sort;
                egui::ComboBox::from_id_salt("browse_sort")
                    .width(110.0)
                    .selected_text(self.browse.sort.label())
                    .show_ui(ui, |ui| {
                        for field in SortField::BROWSE {
                            ui.selectable_value(&mut self.browse.sort, field, field.label());
                        }
                    });
                if self.browse.sort != before {
                    debug!(sort = ?self.browse.sort, "Sort field changed");
                }
                ui.label(egui::RichText::new("Sort by").color(theme::TEXT_DIM));
            });
        });
    }

    /// Card width and column count for the available width
    fn grid_layout(available: f32) -> (f32, f32) {
        let spacing = theme::SPACING_LG;
        let (base_w, base_h) = theme::CARD_SIZE;
        let cols = ((available + spacing) / (base_w + spacing)).floor().max(1.0);
        let card_w = ((available - spacing * (cols - 1.0)) / cols).floor();
        (card_w, base_h)
    }

    fn render_skeleton_grid(&self, ui: &mut egui::Ui) {
        let (card_w, card_h) = Self::grid_layout(ui.available_width());
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(theme::SPACING_LG, theme::SPACING_LG);
            for _ in 0..BROWSE_PAGE_SIZE {
                skeleton_card(ui, egui::vec2(card_w, card_h));
            }
        });
    }

    fn render_card_grid(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, tokens: &[Token]) {
        let (card_w, card_h) = Self::grid_layout(ui.available_width());
        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(theme::SPACING_LG, theme::SPACING_LG);
            for token in tokens {
                if self.render_token_card(ui, ctx, token, egui::vec2(card_w, card_h)).clicked() {
                    clicked = Some(token.id.clone());
                }
            }
        });
        if let Some(id) = clicked {
            debug!(token = %id, "Opening token detail");
            self.detail = Some(DetailState::new(id));
        }
    }

    fn render_token_card(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, token: &Token, size: egui::Vec2) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
        if !ui.is_rect_visible(rect) {
            return response;
        }

        let (fill, draw_rect) = theme::button_visual(&response, theme::BG_ELEVATED, rect);
        let stroke = if response.hovered() {
            theme::ACCENT_DARK
        } else {
            theme::BORDER_SUBTLE
        };
        ui.painter().rect(
            draw_rect,
            theme::RADIUS_LARGE,
            fill,
            egui::Stroke::new(theme::STROKE_DEFAULT, stroke),
            egui::StrokeKind::Inside,
        );
        if response.hovered() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let texture = token.logo_url().and_then(|url| self.logos.get(ctx, self.runtime.handle(), url));
        let mut card = ui.new_child(
            egui::UiBuilder::new()
                .max_rect(draw_rect.shrink(theme::SPACING_XL))
                .layout(egui::Layout::top_down(egui::Align::Min)),
        );
        card.spacing_mut().item_spacing.y = theme::SPACING_SM;

        card.horizontal(|ui| {
            token_avatar(ui, token, texture.as_ref(), theme::AVATAR_MEDIUM);
            ui.vertical(|ui| {
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(&token.name)
                            .size(theme::FONT_HEADING)
                            .strong()
                            .color(theme::TEXT_PRIMARY),
                    )
                    .truncate()
                    .selectable(false),
                );
                symbol_badge(ui, &token.symbol);
            });
            if token.website_url().is_some() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                    ui.label(egui::RichText::new(icons::ARROW_SQUARE_OUT).color(theme::TEXT_DIM));
                });
            }
        });
        card.add_space(theme::SPACING_MD);

        let row = |ui: &mut egui::Ui, label: &str, value: String, size: f32| {
            ui.horizontal(|ui| {
                ui.add(egui::Label::new(egui::RichText::new(label).color(theme::TEXT_DIM)).selectable(false));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add(
                        egui::Label::new(egui::RichText::new(value).size(size).strong().color(theme::TEXT_SECONDARY))
                            .selectable(false),
                    );
                });
            });
        };
        row(&mut card, "Price", format_price(token.price_usd), theme::FONT_HEADING);
        row(&mut card, "Supply", format_supply(token.total_supply, 2), theme::FONT_BODY);

        if let Some(description) = token.description.as_deref().filter(|d| !d.is_empty()) {
            card.add_space(theme::SPACING_SM);
            card.add(
                egui::Label::new(
                    egui::RichText::new(description)
                        .size(theme::FONT_LABEL)
                        .color(theme::TEXT_MUTED),
                )
                .truncate()
                .selectable(false),
            );
        }

        response
    }

    fn render_feed_footer(&self, ui: &mut egui::Ui, feed: &FeedQuery) {
        ui.vertical_centered(|ui| {
            if feed.is_fetching_next_page {
                ui.scope(|ui| {
                    ui.set_max_width(200.0);
                    loading_row(ui, "Loading more tokens...");
                });
            } else if let Some(err) = &feed.error {
                ui.label(egui::RichText::new(err).color(theme::STATUS_ERROR));
                if ui.add(theme::button(format!("{} Retry", icons::ARROW_CLOCKWISE))).clicked() {
                    self.query.invalidate_all();
                }
            } else if !feed.has_next_page {
                ui.label(
                    egui::RichText::new("You've reached the end! No more tokens to load.")
                        .size(theme::FONT_LABEL)
                        .color(theme::TEXT_DIM),
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_params_match_browse_defaults() {
        let state = BrowseState::new(SortField::CreatedAt, SortOrder::Desc);
        let params = state.params();
        assert_eq!(params.limit, Some(12));
        assert_eq!(params.page, None);
        assert_eq!(params.search, None);
        assert_eq!(params.sort_by, Some(SortField::CreatedAt));
        assert_eq!(params.sort_order, Some(SortOrder::Desc));
    }

    #[test]
    fn typing_settles_into_one_query_change() {
        let start = Instant::now();
        let mut state = BrowseState::new(SortField::CreatedAt, SortOrder::Desc);
        for (i, text) in ["b", "bi", "bit"].into_iter().enumerate() {
            state.search_text = text.to_string();
            state.search_changed(start + Duration::from_millis(100 * i as u64));
            assert!(!state.tick(start + Duration::from_millis(100 * i as u64 + 50)));
            assert_eq!(state.params().search, None);
        }

        assert!(state.tick(start + Duration::from_millis(200) + SEARCH_DEBOUNCE));
        assert_eq!(state.params().search.as_deref(), Some("bit"));
        assert!(!state.tick(start + Duration::from_secs(5)));
    }

    #[test]
    fn whitespace_search_is_no_search() {
        let start = Instant::now();
        let mut state = BrowseState::new(SortField::Name, SortOrder::Asc);
        state.search_text = "   ".to_string();
        state.search_changed(start);
        state.tick(start + SEARCH_DEBOUNCE);
        assert_eq!(state.params().search, None);
    }

    #[test]
    fn load_more_triggers_within_margin() {
        assert!(!near_end(0.0, 600.0, 2000.0));
        assert!(near_end(1350.0, 600.0, 2000.0));
        assert!(near_end(0.0, 600.0, 500.0));
    }
}
