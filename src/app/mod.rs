//! App module - contains the main application state and logic

mod browse;
mod detail;
mod form;
mod logos;
mod manage;
mod toasts;

use crate::api::ApiClient;
use crate::config::Config;
use crate::query::QueryClient;
use crate::settings::Settings;
use crate::theme;
use crate::types::View;
use crate::ui::confirm::ConfirmGate;
use crate::utils::get_cache_dir;
use browse::BrowseState;
use detail::DetailState;
use eframe::egui;
use form::TokenEditor;
use logos::LogoCache;
use manage::{DeleteTarget, ManageState};
use std::path::PathBuf;
use toasts::Toasts;
use tracing::info;

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) query: QueryClient,
    pub(crate) view: View,
    pub(crate) browse: BrowseState,
    pub(crate) manage: ManageState,
    // Modals
    pub(crate) detail: Option<DetailState>,
    pub(crate) editor: Option<TokenEditor>,
    pub(crate) pending_delete: Option<ConfirmGate<DeleteTarget>>,
    pub(crate) toasts: Toasts,
    // Images
    pub(crate) logos: LogoCache,
    pub(crate) logo_texture: Option<egui::TextureHandle>,
    // Settings
    pub(crate) backend_url: Option<String>,
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) data_dir: PathBuf,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        config: Config,
        data_dir: PathBuf,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        // Apply theme from theme.rs
        theme::apply_visuals(&cc.egui_ctx);

        let runtime = tokio::runtime::Runtime::new()?;
        let client = ApiClient::new(&config)?;
        info!(backend = %client.base_url(), "API client ready");
        let query = QueryClient::new(client, runtime.handle().clone(), cc.egui_ctx.clone(), config.stale_time);

        Ok(Self {
            runtime,
            query,
            view: settings.view,
            browse: BrowseState::new(settings.browse_sort, settings.browse_order),
            manage: ManageState::default(),
            detail: None,
            editor: None,
            pending_delete: None,
            toasts: Toasts::default(),
            logos: LogoCache::new(get_cache_dir().join("logos")),
            logo_texture: None,
            backend_url: settings.backend_url,
            window_pos: None,
            window_size: None,
            needs_center: false,
            data_dir,
        })
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            view: self.view,
            browse_sort: self.browse.sort,
            browse_order: self.browse.order,
            backend_url: self.backend_url.clone(),
        };
        settings.save(&self.data_dir);
    }

    /// Show an error toast, e.g. for start-up problems the user should know about
    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.toasts.error(message);
    }

    /// Any modal that should keep keyboard shortcuts away from the views
    pub(crate) fn modal_open(&self) -> bool {
        self.detail.is_some() || self.editor.is_some() || self.pending_delete.is_some()
    }
}
