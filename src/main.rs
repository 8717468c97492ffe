#![windows_subsystem = "windows"]
//! Token Catalog Desk - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod api;
mod app;
mod config;
mod constants;
mod debounce;
mod error;
mod query;
mod settings;
mod theme;
mod types;
mod ui;
mod utils;
mod validation;

use app::App;
use config::Config;
use constants::*;
use eframe::egui;
use egui_phosphor::regular as icons;
use tracing::{debug, error, info};
use types::View;
use utils::get_data_dir;

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "token-catalog-desk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,token_catalog_desk=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "Token Catalog Desk starting");

    let settings = settings::Settings::load(&data_dir);
    let (config, config_error) = match Config::load(&settings) {
        Ok(config) => (config, None),
        Err(e) => {
            error!(error = %e, "Invalid configuration, using default backend");
            (Config::default(), Some(e.to_string()))
        }
    };

    // Load saved window position/size
    let win_pos = match (settings.window_x, settings.window_y) {
        (Some(x), Some(y)) => Some(egui::pos2(x, y)),
        _ => None,
    };
    let win_size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) => Some(egui::vec2(w, h)),
        _ => None,
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(win_size.unwrap_or(egui::vec2(1360.0, 820.0)))
        .with_min_inner_size([1000.0, 640.0])
        .with_title(APP_NAME);

    // Window/taskbar icon from the bundled SVG
    if let Some((rgba, width, height)) = utils::rasterize_icon(256) {
        let icon = egui::IconData { rgba, width, height };
        viewport = viewport.with_icon(std::sync::Arc::new(icon));
    }

    let needs_center = win_pos.is_none();

    if let Some(pos) = win_pos {
        viewport = viewport.with_position(pos);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| {
            let mut app = App::new(cc, settings, config, data_dir)?;
            app.needs_center = needs_center;
            if let Some(message) = config_error {
                app.notify_error(message);
            }
            Ok(Box::new(app))
        }),
    )
}

/// Full-width sidebar entry with an icon, highlighted when `selected`
fn nav_item(ui: &mut egui::Ui, icon: &str, label: &str, selected: bool) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 36.0), egui::Sense::click());
    if ui.is_rect_visible(rect) {
        let base = if selected { theme::ACCENT_DARK } else { theme::BG_BASE };
        let (fill, draw_rect) = theme::button_visual(&response, base, rect);
        let painter = ui.painter();
        painter.rect_filled(draw_rect, theme::RADIUS_MEDIUM, fill);
        let color = if selected { theme::TEXT_PRIMARY } else { theme::TEXT_MUTED };
        painter.text(
            egui::pos2(draw_rect.left() + 14.0, draw_rect.center().y),
            egui::Align2::LEFT_CENTER,
            icon,
            egui::FontId::proportional(theme::FONT_HEADING),
            if selected { theme::ACCENT } else { color },
        );
        painter.text(
            egui::pos2(draw_rect.left() + 40.0, draw_rect.center().y),
            egui::Align2::LEFT_CENTER,
            label,
            egui::FontId::proportional(theme::FONT_BODY),
            color,
        );
    }
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    response
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window position/size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                self.window_pos = Some(rect.min);
            }
            if let Some(rect) = i.viewport().inner_rect {
                self.window_size = Some(rect.size());
            }
        });

        // Center window on first launch
        if self.needs_center {
            self.needs_center = false;
            if let Some(cmd) = egui::ViewportCommand::center_on_screen(ctx) {
                ctx.send_viewport_cmd(cmd);
            }
        }

        // F5 refetches everything, failed queries included
        if !self.modal_open() && ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            info!("Manual refresh");
            self.query.invalidate_all();
        }

        // Sidebar - logo and navigation (must be added BEFORE CentralPanel)
        egui::SidePanel::left("nav_panel")
            .exact_width(theme::SIDEBAR_WIDTH)
            .resizable(false)
            .show_separator_line(false)
            .frame(theme::sidebar_frame())
            .show(ctx, |ui| {
                let avail_w = ui.available_width();

                ui.add_space(24.0);
                ui.with_layout(egui::Layout::top_down(egui::Align::Center), |ui| {
                    if self.logo_texture.is_none() {
                        self.logo_texture = utils::rasterize_logo(avail_w as u32 * 2).map(|(pixels, w, h)| {
                            ctx.load_texture(
                                "app_logo",
                                egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels),
                                egui::TextureOptions::LINEAR,
                            )
                        });
                    }
                    if let Some(texture) = &self.logo_texture {
                        let aspect = texture.size()[1] as f32 / texture.size()[0] as f32;
                        let logo_w = avail_w * 0.5;
                        ui.image(egui::load::SizedTexture::new(texture.id(), egui::vec2(logo_w, logo_w * aspect)));
                    }

                    ui.add_space(4.0);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(APP_NAME.to_uppercase())
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                });
                ui.add_space(24.0);

                for (view, icon, label) in [
                    (View::Browse, icons::COMPASS, "Browse"),
                    (View::Manage, icons::TABLE, "Manage"),
                ] {
                    if nav_item(ui, icon, label, self.view == view).clicked() && self.view != view {
                        debug!(view = ?view, "Switching view");
                        self.view = view;
                    }
                    ui.add_space(theme::SPACING_SM);
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.add_space(theme::SPACING_XL);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(format!("v{}", APP_VERSION))
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(self.query.base_url().as_str())
                                .size(theme::FONT_SMALL)
                                .monospace()
                                .color(theme::TEXT_MUTED),
                        )
                        .truncate(),
                    );
                    ui.add_space(theme::SPACING_SM);
                    let refresh = ui
                        .add_sized(
                            [ui.available_width(), theme::BUTTON_HEIGHT],
                            theme::button(format!("{} Refresh", icons::ARROW_CLOCKWISE)),
                        )
                        .on_hover_text("Refetch all data (F5)");
                    if refresh.clicked() {
                        info!("Manual refresh");
                        self.query.invalidate_all();
                    }
                });
            });

        // Central panel - active view (MUST be added LAST after all side/top/bottom panels)
        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::same(24)),
            )
            .show(ctx, |ui| match self.view {
                View::Browse => self.render_browse(ui, ctx),
                View::Manage => self.render_manage(ui, ctx),
            });

        // Modals on top of the views
        self.render_detail_modal(ctx);
        self.render_token_form(ctx);
        self.render_delete_confirm(ctx);

        self.toasts.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application shutting down");
        self.save_settings();
    }
}
