//! Token detail modal opened from the browse grid

use super::App;
use crate::constants::COPIED_FEEDBACK;
use crate::theme;
use crate::types::Token;
use crate::ui::components::{loading_row, stat_tile, symbol_badge, token_avatar};
use crate::utils::{format_date_time, format_price, format_supply};
use eframe::egui;
use egui_phosphor::regular as icons;
use std::time::Instant;
use tracing::{debug, warn};

const DETAIL_WIDTH: f32 = 560.0;

pub struct DetailState {
    pub id: String,
    copied_at: Option<Instant>,
}

impl DetailState {
    pub fn new(id: String) -> Self {
        Self { id, copied_at: None }
    }

    fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    /// "Copied!" stays up for `COPIED_FEEDBACK` after a copy
    fn show_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_FEEDBACK)
    }
}

impl App {
    pub(crate) fn render_detail_modal(&mut self, ctx: &egui::Context) {
        let Some(id) = self.detail.as_ref().map(|d| d.id.clone()) else {
            return;
        };
        let query = self.query.token(&id);
        let texture = query
            .data
            .as_ref()
            .and_then(Token::logo_url)
            .and_then(|url| self.logos.get(ctx, self.runtime.handle(), url));

        let mut close = false;
        let modal = egui::Modal::new(egui::Id::new("token_detail"))
            .backdrop_color(egui::Color32::from_black_alpha(160))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(DETAIL_WIDTH);
                ui.horizontal(|ui| {
                    if let Some(token) = &query.data {
                        token_avatar(ui, token, texture.as_ref(), theme::AVATAR_SMALL + 4.0);
                        ui.label(egui::RichText::new(&token.name).size(theme::FONT_TITLE).strong());
                        symbol_badge(ui, &token.symbol);
                    } else {
                        ui.label(egui::RichText::new("Token Details").size(theme::FONT_TITLE).strong());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if theme::icon_button(ui, icons::X, theme::TEXT_PRIMARY, true).clicked() {
                            close = true;
                        }
                    });
                });
                ui.label(egui::RichText::new("Detailed information about this token").color(theme::TEXT_DIM));
                ui.add_space(theme::SPACING_LG);

                match (&query.data, &query.error) {
                    (Some(token), _) => self.render_detail_body(ui, token),
                    (None, Some(err)) => {
                        ui.vertical_centered(|ui| {
                            ui.add_space(theme::SPACING_XL);
                            ui.label(egui::RichText::new("Failed to load token details.").color(theme::STATUS_ERROR));
                            ui.label(egui::RichText::new(err).size(theme::FONT_LABEL).color(theme::TEXT_DIM));
                            ui.add_space(theme::SPACING_XL);
                        });
                    }
                    (None, None) => {
                        ui.add_space(theme::SPACING_XL);
                        loading_row(ui, "Loading token details...");
                        ui.add_space(theme::SPACING_XL);
                    }
                }
            });

        if close || modal.should_close() {
            debug!(token = %id, "Closing token detail");
            self.detail = None;
        }
    }

    fn render_detail_body(&mut self, ui: &mut egui::Ui, token: &Token) {
        let now = Instant::now();

        theme::section_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Current Price").color(theme::TEXT_MUTED));
            ui.label(
                egui::RichText::new(format_price(token.price_usd))
                    .size(theme::FONT_DISPLAY + 4.0)
                    .strong()
                    .color(theme::TEXT_PRIMARY),
            );
        });
        ui.add_space(theme::SPACING_MD);

        let local = |at: &chrono::DateTime<chrono::Utc>| format_date_time(&at.with_timezone(&chrono::Local));
        // two tiles per row, each with 26px of frame around it
        let tile_w = (ui.available_width() - theme::SPACING_MD) / 2.0 - 26.0;
        egui::Grid::new("detail_stats")
            .num_columns(2)
            .spacing(egui::vec2(theme::SPACING_MD, theme::SPACING_MD))
            .show(ui, |ui| {
                stat_tile(ui, "Total Supply", &format_supply(token.total_supply, 2), tile_w);
                stat_tile(ui, "Market Cap", &format_price(token.market_cap()), tile_w);
                ui.end_row();
                stat_tile(ui, "Created", &local(&token.created_at), tile_w);
                stat_tile(ui, "Updated", &local(&token.updated_at), tile_w);
                ui.end_row();
            });

        if let Some(description) = token.description.as_deref().filter(|d| !d.is_empty()) {
            ui.add_space(theme::SPACING_LG);
            ui.label(
                egui::RichText::new(format!("{} About {}", icons::INFO, token.name))
                    .size(theme::FONT_HEADING)
                    .strong(),
            );
            ui.add(egui::Label::new(egui::RichText::new(description).color(theme::TEXT_SECONDARY)).wrap());
        }

        ui.add_space(theme::SPACING_LG);
        ui.separator();
        ui.add_space(theme::SPACING_MD);

        let copied = self.detail.as_ref().is_some_and(|d| d.show_copied(now));
        if copied {
            ui.ctx().request_repaint_after(COPIED_FEEDBACK);
        }
        ui.horizontal(|ui| {
            if let Some(site) = token.website_url() {
                let visit = ui.add(theme::button(format!(
                    "{} Visit Website {}",
                    icons::GLOBE,
                    icons::ARROW_SQUARE_OUT
                )));
                if visit.clicked() {
                    if let Err(e) = open::that(site) {
                        warn!(url = site, error = %e, "Failed to open website");
                        self.toasts.error("Could not open the website");
                    }
                }
            }

            let label = if copied {
                format!("{} Copied!", icons::CHECK)
            } else {
                format!("{} Copy Token ID", icons::COPY)
            };
            if ui.add(theme::button(label)).clicked() {
                ui.ctx().copy_text(token.id.clone());
                if let Some(detail) = self.detail.as_mut() {
                    detail.mark_copied(now);
                }
            }
        });

        ui.add_space(theme::SPACING_MD);
        theme::section_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Token ID").size(theme::FONT_SMALL).color(theme::TEXT_DIM));
            ui.label(egui::RichText::new(&token.id).monospace().size(theme::FONT_SMALL));
        });
    }
}
