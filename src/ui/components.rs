//! Reusable UI components
//!
//! Standalone widgets shared by the browse and management views.

use crate::theme;
use crate::types::Token;
use eframe::egui;

/// Round token logo, or the symbol's initial on a colored disc when there is
/// no texture (yet).
pub fn token_avatar(ui: &mut egui::Ui, token: &Token, texture: Option<&egui::TextureHandle>, size: f32) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    if !ui.is_rect_visible(rect) {
        return response;
    }

    let painter = ui.painter();
    let radius = egui::CornerRadius::same((size / 2.0) as u8);
    match texture {
        Some(tex) => {
            // textured RectShape clips the image to the circle
            let brush = egui::epaint::Brush {
                fill_texture_id: tex.id(),
                uv: egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            };
            let mut shape = egui::epaint::RectShape::filled(rect, radius, egui::Color32::WHITE);
            shape.brush = Some(std::sync::Arc::new(brush));
            painter.add(shape);
        }
        None => {
            painter.rect_filled(rect, radius, theme::avatar_color(&token.symbol));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                token.initial(),
                egui::FontId::proportional(size * 0.45),
                theme::TEXT_PRIMARY,
            );
        }
    }
    response
}

/// Small rounded pill with the token symbol
pub fn symbol_badge(ui: &mut egui::Ui, symbol: &str) {
    egui::Frame::new()
        .fill(theme::BG_SURFACE)
        .corner_radius(theme::RADIUS_DEFAULT)
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(symbol)
                    .size(theme::FONT_SMALL)
                    .monospace()
                    .color(theme::TEXT_SECONDARY),
            );
        });
}

/// Label above a value, as used in stat tiles and the detail modal
pub fn stat_tile(ui: &mut egui::Ui, label: &str, value: &str, width: f32) {
    theme::section_frame().show(ui, |ui| {
        ui.set_width(width);
        ui.label(
            egui::RichText::new(label.to_uppercase())
                .size(theme::FONT_SMALL)
                .color(theme::TEXT_DIM),
        );
        ui.label(
            egui::RichText::new(value)
                .size(theme::FONT_HEADING)
                .strong()
                .color(theme::TEXT_PRIMARY),
        );
    });
}

/// Centered icon + message, for empty and error states
pub fn placeholder(ui: &mut egui::Ui, icon: &str, title: &str, detail: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.label(egui::RichText::new(icon).size(40.0).color(theme::TEXT_DIM));
        ui.add_space(theme::SPACING_MD);
        ui.label(egui::RichText::new(title).size(theme::FONT_HEADING).strong());
        if !detail.is_empty() {
            ui.label(egui::RichText::new(detail).color(theme::TEXT_MUTED));
        }
        ui.add_space(theme::SPACING_LG);
    });
}

/// Spinner with a caption on one row
pub fn loading_row(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.add(egui::Spinner::new().size(16.0));
        ui.label(egui::RichText::new(text).color(theme::TEXT_MUTED));
    });
}

/// Grey pulsing card used while the first page loads
pub fn skeleton_card(ui: &mut egui::Ui, size: egui::Vec2) {
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    if !ui.is_rect_visible(rect) {
        return;
    }
    let t = ui.input(|i| i.time) as f32;
    let pulse = 0.5 + 0.5 * (t * 3.0).sin();
    let fill = theme::lighten(theme::BG_ELEVATED, 0.03 + 0.04 * pulse);
    let painter = ui.painter();
    painter.rect_filled(rect, theme::RADIUS_LARGE, fill);

    let inner = rect.shrink(theme::SPACING_LG);
    let avatar = egui::Rect::from_min_size(inner.min, egui::vec2(theme::AVATAR_MEDIUM, theme::AVATAR_MEDIUM));
    painter.rect_filled(avatar, theme::AVATAR_MEDIUM / 2.0, theme::BG_SURFACE);
    for (i, width) in [0.6_f32, 0.35, 0.8].into_iter().enumerate() {
        let y = avatar.bottom() + theme::SPACING_LG + i as f32 * 18.0;
        let bar = egui::Rect::from_min_size(egui::pos2(inner.left(), y), egui::vec2(inner.width() * width, 10.0));
        painter.rect_filled(bar, theme::RADIUS_DEFAULT, theme::BG_SURFACE);
    }
    ui.ctx().request_repaint();
}
