//! Admin view: paginated token table with edit and delete actions

use super::App;
use crate::constants::ADMIN_PAGE_SIZE;
use crate::theme;
use crate::types::{Token, TokenPage, TokenQueryParams};
use crate::ui::components::{loading_row, placeholder, symbol_badge, token_avatar};
use crate::ui::confirm::{ConfirmChoice, ConfirmGate};
use crate::ui::pagination::{self, Pagination};
use crate::utils::{format_number, format_short_date, format_usd};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_phosphor::regular as icons;
use tracing::{debug, info, warn};

/// Token a pending delete is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: String,
    pub name: String,
}

pub struct ManageState {
    pub(crate) page: u32,
    /// Last page shown, kept on screen while the next one loads
    shown: Option<TokenPage>,
}

impl Default for ManageState {
    fn default() -> Self {
        Self { page: 1, shown: None }
    }
}

impl ManageState {
    pub fn params(&self) -> TokenQueryParams {
        TokenQueryParams {
            page: Some(self.page),
            limit: Some(ADMIN_PAGE_SIZE),
            ..TokenQueryParams::default()
        }
    }

    pub fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Record a loaded page. Returns false when the current page no longer
    /// exists (e.g. the last row of the last page was deleted) and the view
    /// moved back to the last real page.
    pub fn accept(&mut self, page: TokenPage) -> bool {
        let total_pages = page.total_pages();
        if page.tokens.is_empty() && self.page > total_pages {
            self.page = total_pages;
            return false;
        }
        self.shown = Some(page);
        true
    }
}

enum RowAction {
    Edit(Token),
    Delete(DeleteTarget),
}

impl App {
    pub(crate) fn render_manage(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new("Token Management")
                        .size(theme::FONT_DISPLAY)
                        .strong()
                        .color(theme::TEXT_PRIMARY),
                );
                ui.label(egui::RichText::new("Manage cryptocurrency tokens in your database").color(theme::TEXT_DIM));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(theme::button_accent(format!("{} Add Token", icons::PLUS))).clicked() {
                    self.open_create_form();
                }
            });
        });
        ui.add_space(theme::SPACING_XL);

        let query = self.query.list(&self.manage.params());
        if let Some(page) = query.data {
            if !self.manage.accept(page) {
                debug!(page = self.manage.page, "Page out of range, moving back");
                ctx.request_repaint();
            }
        }

        let Some(page) = self.manage.shown.clone() else {
            match query.error {
                Some(err) => {
                    placeholder(ui, icons::WARNING_CIRCLE, "Error loading tokens", &err);
                    ui.vertical_centered(|ui| {
                        if ui.add(theme::button(format!("{} Retry", icons::ARROW_CLOCKWISE))).clicked() {
                            self.query.invalidate_all();
                        }
                    });
                }
                None => {
                    ui.add_space(theme::SPACING_XL);
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(160.0);
                        loading_row(ui, "Loading tokens...");
                    });
                }
            }
            return;
        };

        if let Some(err) = &query.error {
            ui.label(egui::RichText::new(format!("{} {}", icons::WARNING_CIRCLE, err)).color(theme::STATUS_ERROR));
            ui.add_space(theme::SPACING_MD);
        }

        let pagination = Pagination::new(self.manage.page, page.total_pages());
        let total_items = page.meta.map_or(0, |m| m.total);
        let footer_height = if pagination.total_pages > 1 { 48.0 } else { 0.0 };
        let table_height = (ui.available_height() - footer_height).max(theme::ROW_HEIGHT * 3.0);

        let action = egui::Frame::new()
            .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_SUBTLE))
            .corner_radius(theme::RADIUS_MEDIUM)
            .inner_margin(egui::Margin::same(theme::SPACING_MD as i8))
            .show(ui, |ui| {
                ui.set_height(table_height - 2.0 * theme::SPACING_MD);
                if page.tokens.is_empty() {
                    placeholder(ui, icons::COINS, "No tokens found.", "Add your first token to get started.");
                    None
                } else {
                    self.render_token_table(ui, ctx, &page.tokens, query.is_fetching)
                }
            })
            .inner;

        if pagination.total_pages > 1 {
            ui.add_space(theme::SPACING_LG);
            if let Some(target) = pagination::show(ui, pagination, total_items, !query.is_fetching) {
                debug!(page = target, "Changing page");
                self.manage.go_to(target);
            }
        }

        match action {
            Some(RowAction::Edit(token)) => self.open_edit_form(&token),
            Some(RowAction::Delete(target)) => {
                let description = format!(
                    "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                    target.name
                );
                self.pending_delete = Some(ConfirmGate::new("Delete Token", description, "Delete", target));
            }
            None => {}
        }
    }

    fn render_token_table(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        tokens: &[Token],
        refreshing: bool,
    ) -> Option<RowAction> {
        let mut action = None;
        let header = |ui: &mut egui::Ui, text: &str| {
            ui.label(egui::RichText::new(text).size(theme::FONT_SMALL).strong().color(theme::TEXT_DIM));
        };
        let deleting = self.pending_delete.as_ref().map(|gate| gate.target.id.clone());

        TableBuilder::new(ui)
            .striped(true)
            .resizable(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::exact(48.0))
            .column(Column::remainder().at_least(140.0).clip(true))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(110.0))
            .column(Column::auto().at_least(110.0))
            .column(Column::exact(64.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::exact(72.0))
            .header(28.0, |mut row| {
                for title in ["LOGO", "NAME", "SYMBOL", "TOTAL SUPPLY", "PRICE (USD)", "WEBSITE", "CREATED"] {
                    row.col(|ui| header(ui, title));
                }
                row.col(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| header(ui, "ACTIONS"));
                });
            })
            .body(|body| {
                body.rows(theme::ROW_HEIGHT, tokens.len(), |mut row| {
                    let token = &tokens[row.index()];
                    row.col(|ui| {
                        let texture = token.logo_url().and_then(|url| self.logos.get(ctx, self.runtime.handle(), url));
                        token_avatar(ui, token, texture.as_ref(), theme::AVATAR_SMALL);
                    });
                    row.col(|ui| {
                        ui.add(egui::Label::new(egui::RichText::new(&token.name).strong()).truncate());
                    });
                    row.col(|ui| symbol_badge(ui, &token.symbol));
                    row.col(|ui| {
                        ui.label(format_number(token.total_supply));
                    });
                    row.col(|ui| {
                        ui.label(format_usd(token.price_usd));
                    });
                    row.col(|ui| match token.website_url() {
                        Some(site) => {
                            let link = theme::icon_button(ui, icons::ARROW_SQUARE_OUT, theme::ACCENT, true)
                                .on_hover_text(site);
                            if link.clicked() {
                                if let Err(e) = open::that(site) {
                                    warn!(url = site, error = %e, "Failed to open website");
                                }
                            }
                        }
                        None => {
                            ui.label(egui::RichText::new("-").color(theme::TEXT_DIM));
                        }
                    });
                    row.col(|ui| {
                        let created = token.created_at.with_timezone(&chrono::Local);
                        ui.label(format_short_date(&created));
                    });
                    row.col(|ui| {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let busy = refreshing || deleting.as_deref() == Some(token.id.as_str());
                            if theme::icon_button(ui, icons::TRASH, theme::STATUS_ERROR, !busy)
                                .on_hover_text("Delete")
                                .clicked()
                            {
                                action = Some(RowAction::Delete(DeleteTarget {
                                    id: token.id.clone(),
                                    name: token.name.clone(),
                                }));
                            }
                            if theme::icon_button(ui, icons::PENCIL_SIMPLE, theme::ACCENT, !refreshing)
                                .on_hover_text("Edit")
                                .clicked()
                            {
                                action = Some(RowAction::Edit(token.clone()));
                            }
                        });
                    });
                });
            });
        action
    }

    pub(crate) fn render_delete_confirm(&mut self, ctx: &egui::Context) {
        let Some(gate) = self.pending_delete.as_mut() else {
            return;
        };

        if let Some(outcome) = gate.poll() {
            let target = gate.target.clone();
            match outcome {
                Ok(()) => {
                    info!(token = %target.id, name = %target.name, "Token deleted");
                    self.toasts.success("Token deleted successfully");
                    self.pending_delete = None;
                }
                Err(message) => {
                    warn!(token = %target.id, error = %message, "Failed to delete token");
                    self.toasts.error("Failed to delete token");
                }
            }
            return;
        }

        match gate.show(ctx) {
            Some(ConfirmChoice::Confirm) => {
                debug!(token = %gate.target.id, "Delete confirmed");
                let mutation = self.query.delete_token(gate.target.id.clone());
                gate.start(mutation);
            }
            Some(ConfirmChoice::Cancel) => self.pending_delete = None,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageMeta;

    fn page(number: u32, total_pages: u32, rows: usize) -> TokenPage {
        let tokens = (0..rows)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": format!("t{i}"),
                    "name": format!("Token {i}"),
                    "symbol": format!("T{i}"),
                    "createdAt": "2024-03-01T10:00:00Z",
                    "updatedAt": "2024-03-01T10:00:00Z"
                }))
                .unwrap()
            })
            .collect();
        TokenPage {
            tokens,
            meta: Some(PageMeta {
                total: u64::from(total_pages) * 10,
                page: number,
                limit: ADMIN_PAGE_SIZE,
                total_pages,
            }),
        }
    }

    #[test]
    fn params_use_fixed_page_size() {
        let mut state = ManageState::default();
        assert_eq!(state.params().page, Some(1));
        assert_eq!(state.params().limit, Some(10));

        state.go_to(3);
        assert_eq!(state.params().page, Some(3));
        state.go_to(0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn emptied_last_page_moves_back() {
        let mut state = ManageState::default();
        state.go_to(3);
        assert!(!state.accept(page(3, 2, 0)));
        assert_eq!(state.page, 2);
        assert!(state.shown.is_none());

        assert!(state.accept(page(2, 2, 10)));
        assert_eq!(state.shown.as_ref().map(|p| p.tokens.len()), Some(10));
    }

    #[test]
    fn empty_catalog_stays_on_first_page() {
        let mut state = ManageState::default();
        assert!(state.accept(page(1, 1, 0)));
        assert_eq!(state.page, 1);
    }
}
