//! Create/edit token form with logo upload

use super::toasts::ToastKind;
use super::App;
use crate::query::Mutation;
use crate::theme;
use crate::types::Token;
use crate::validation::{Field, FieldErrors, TokenForm};
use eframe::egui;
use egui_phosphor::regular as icons;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

/// Something that finished in the background since the last poll
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Uploaded(String),
    UploadFailed(String),
    Saved(Token),
    SaveFailed(String),
}

impl EditorEvent {
    pub fn toast(&self, mode: &EditorMode) -> (ToastKind, &'static str) {
        match (self, mode) {
            (EditorEvent::Uploaded(_), _) => (ToastKind::Success, "Image uploaded successfully"),
            (EditorEvent::UploadFailed(_), _) => (ToastKind::Error, "Failed to upload image. Please try again."),
            (EditorEvent::Saved(_), EditorMode::Create) => (ToastKind::Success, "Token created successfully"),
            (EditorEvent::Saved(_), EditorMode::Edit { .. }) => (ToastKind::Success, "Token updated successfully"),
            (EditorEvent::SaveFailed(_), EditorMode::Create) => (ToastKind::Error, "Failed to create token"),
            (EditorEvent::SaveFailed(_), EditorMode::Edit { .. }) => (ToastKind::Error, "Failed to update token"),
        }
    }
}

enum FormAction {
    PickLogo,
    RemoveLogo,
    Submit,
    Close,
}

pub struct TokenEditor {
    pub mode: EditorMode,
    pub form: TokenForm,
    pub errors: FieldErrors,
    upload_error: Option<String>,
    submit_error: Option<String>,
    upload: Option<Mutation<String>>,
    upload_cancel: CancellationToken,
    submit: Option<Mutation<Token>>,
    /// Images stored while this form was open
    session_uploads: Vec<String>,
}

impl TokenEditor {
    pub fn create() -> Self {
        Self::with(EditorMode::Create, TokenForm::default())
    }

    pub fn edit(token: &Token) -> Self {
        Self::with(EditorMode::Edit { id: token.id.clone() }, TokenForm::from_token(token))
    }

    fn with(mode: EditorMode, form: TokenForm) -> Self {
        Self {
            mode,
            form,
            errors: FieldErrors::default(),
            upload_error: None,
            submit_error: None,
            upload: None,
            upload_cancel: CancellationToken::new(),
            submit: None,
            session_uploads: Vec::new(),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.as_ref().is_some_and(Mutation::is_pending)
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.as_ref().is_some_and(Mutation::is_pending)
    }

    pub fn is_busy(&self) -> bool {
        self.is_uploading() || self.is_submitting()
    }

    pub fn start_upload(&mut self, mutation: Mutation<String>) {
        self.upload_error = None;
        self.upload = Some(mutation);
    }

    pub fn start_submit(&mut self, mutation: Mutation<Token>) {
        self.submit_error = None;
        self.submit = Some(mutation);
    }

    pub fn remove_logo(&mut self) {
        self.form.logo.clear();
        self.upload_error = None;
    }

    /// Collect finished uploads and saves. A failed upload leaves the logo
    /// field empty.
    pub fn poll(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();

        if let Some(outcome) = self.upload.as_ref().and_then(Mutation::poll) {
            self.upload = None;
            match outcome {
                Ok(url) => {
                    self.form.logo = url.clone();
                    self.session_uploads.push(url.clone());
                    events.push(EditorEvent::Uploaded(url));
                }
                Err(message) => {
                    self.form.logo.clear();
                    self.upload_error = Some(message.clone());
                    events.push(EditorEvent::UploadFailed(message));
                }
            }
        }

        if let Some(outcome) = self.submit.as_ref().and_then(Mutation::poll) {
            self.submit = None;
            match outcome {
                Ok(token) => events.push(EditorEvent::Saved(token)),
                Err(message) => {
                    self.submit_error = Some(message.clone());
                    events.push(EditorEvent::SaveFailed(message));
                }
            }
        }

        events
    }

    /// Images uploaded during this session that `kept` does not reference
    pub fn orphaned_uploads(&self, kept: Option<&str>) -> Vec<String> {
        self.session_uploads
            .iter()
            .filter(|url| Some(url.as_str()) != kept)
            .cloned()
            .collect()
    }

    fn title(&self) -> &'static str {
        match self.mode {
            EditorMode::Create => "Add New Token",
            EditorMode::Edit { .. } => "Edit Token",
        }
    }

    fn submit_label(&self) -> &'static str {
        match (&self.mode, self.is_submitting()) {
            (EditorMode::Create, false) => "Create Token",
            (EditorMode::Create, true) => "Creating...",
            (EditorMode::Edit { .. }, false) => "Update Token",
            (EditorMode::Edit { .. }, true) => "Updating...",
        }
    }
}

impl App {
    pub(crate) fn open_create_form(&mut self) {
        debug!("Opening create form");
        self.editor = Some(TokenEditor::create());
    }

    pub(crate) fn open_edit_form(&mut self, token: &Token) {
        debug!(token = %token.id, "Opening edit form");
        self.editor = Some(TokenEditor::edit(token));
    }

    pub(crate) fn render_token_form(&mut self, ctx: &egui::Context) {
        self.poll_token_form();
        let Some(editor) = self.editor.as_ref() else {
            return;
        };

        let logo_url = editor.form.logo.trim().to_string();
        let preview = (!logo_url.is_empty())
            .then(|| self.logos.get(ctx, self.runtime.handle(), &logo_url))
            .flatten();

        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let busy = editor.is_busy();
        let mut action = None;

        let modal = egui::Modal::new(egui::Id::new("token_form"))
            .backdrop_color(egui::Color32::from_black_alpha(160))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(theme::FORM_WIDTH);
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(editor.title()).size(theme::FONT_TITLE).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if theme::icon_button(ui, icons::X, theme::TEXT_PRIMARY, !busy).clicked() {
                            action = Some(FormAction::Close);
                        }
                    });
                });
                let subtitle = match editor.mode {
                    EditorMode::Create => "Fill in the details to add a new token to the catalog.",
                    EditorMode::Edit { .. } => "Update the token details and save your changes.",
                };
                ui.label(egui::RichText::new(subtitle).color(theme::TEXT_DIM));
                ui.add_space(theme::SPACING_LG);

                egui::ScrollArea::vertical()
                    .max_height(ctx.screen_rect().height() * 0.7)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        ui.add_enabled_ui(!busy, |ui| {
                            text_field(ui, "Name", "Enter token name", &mut editor.form.name, editor.errors.get(Field::Name));
                            text_field(ui, "Symbol", "Enter token symbol", &mut editor.form.symbol, editor.errors.get(Field::Symbol));
                            field_label(ui, "Description");
                            ui.add(
                                egui::TextEdit::multiline(&mut editor.form.description)
                                    .hint_text("Enter token description")
                                    .desired_rows(4)
                                    .desired_width(f32::INFINITY),
                            );
                            field_error(ui, editor.errors.get(Field::Description));
                        });

                        field_label(ui, "Logo");
                        ui.horizontal(|ui| {
                            if !logo_url.is_empty() {
                                let (rect, _) = ui.allocate_exact_size(
                                    egui::vec2(theme::AVATAR_LARGE, theme::AVATAR_LARGE),
                                    egui::Sense::hover(),
                                );
                                match &preview {
                                    Some(tex) => {
                                        ui.painter().image(
                                            tex.id(),
                                            rect,
                                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                            egui::Color32::WHITE,
                                        );
                                    }
                                    None => {
                                        ui.painter().rect_filled(rect, theme::RADIUS_MEDIUM, theme::BG_SURFACE);
                                        ui.painter().text(
                                            rect.center(),
                                            egui::Align2::CENTER_CENTER,
                                            icons::IMAGE,
                                            egui::FontId::proportional(22.0),
                                            theme::TEXT_DIM,
                                        );
                                    }
                                }
                            }
                            ui.vertical(|ui| {
                                if editor.is_uploading() {
                                    ui.horizontal(|ui| {
                                        ui.add(egui::Spinner::new().size(14.0));
                                        ui.label("Uploading...");
                                    });
                                } else {
                                    let label = if logo_url.is_empty() {
                                        format!("{} Upload Logo", icons::UPLOAD_SIMPLE)
                                    } else {
                                        format!("{} Change Logo", icons::UPLOAD_SIMPLE)
                                    };
                                    if ui.add_enabled(!busy, theme::button(label)).clicked() {
                                        action = Some(FormAction::PickLogo);
                                    }
                                }
                                if !logo_url.is_empty()
                                    && ui.add_enabled(!busy, theme::button(format!("{} Remove", icons::X))).clicked()
                                {
                                    action = Some(FormAction::RemoveLogo);
                                }
                            });
                        });
                        ui.label(
                            egui::RichText::new("PNG, JPG, GIF, WEBP or SVG, up to 5MB")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                        if let Some(err) = &editor.upload_error {
                            ui.label(egui::RichText::new(err).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
                        }

                        ui.add_enabled_ui(!busy, |ui| {
                            text_field(
                                ui,
                                "Total Supply",
                                "Enter total supply",
                                &mut editor.form.total_supply,
                                editor.errors.get(Field::TotalSupply),
                            );
                            text_field(
                                ui,
                                "Price (USD)",
                                "Enter price in USD",
                                &mut editor.form.price_usd,
                                editor.errors.get(Field::PriceUsd),
                            );
                            text_field(ui, "Website", "Enter website URL", &mut editor.form.website, editor.errors.get(Field::Website));
                        });
                    });

                if let Some(err) = &editor.submit_error {
                    ui.add_space(theme::SPACING_MD);
                    ui.label(egui::RichText::new(err).color(theme::STATUS_ERROR));
                }

                ui.add_space(theme::SPACING_XL);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(!busy, theme::button_accent(editor.submit_label())).clicked() {
                        action = Some(FormAction::Submit);
                    }
                    if editor.is_submitting() {
                        ui.add(egui::Spinner::new().size(16.0));
                    }
                    if ui.add_enabled(!editor.is_submitting(), theme::button("Cancel")).clicked() {
                        action = Some(FormAction::Close);
                    }
                });
            });

        if modal.should_close() && !editor.is_submitting() && action.is_none() {
            action = Some(FormAction::Close);
        }

        match action {
            Some(FormAction::PickLogo) => self.pick_logo(),
            Some(FormAction::RemoveLogo) => editor.remove_logo(),
            Some(FormAction::Submit) => self.submit_token_form(),
            Some(FormAction::Close) => self.close_token_form(None),
            None => {}
        }
    }

    fn poll_token_form(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let mode = editor.mode.clone();
        let mut saved = None;
        for event in editor.poll() {
            let (kind, text) = event.toast(&mode);
            match kind {
                ToastKind::Success => self.toasts.success(text),
                ToastKind::Error => self.toasts.error(text),
            }
            match event {
                EditorEvent::Uploaded(url) => info!(url = %url, "Logo uploaded"),
                EditorEvent::UploadFailed(message) => warn!(error = %message, "Failed to upload image"),
                EditorEvent::SaveFailed(message) => warn!(mode = ?mode, error = %message, "Failed to save token"),
                EditorEvent::Saved(token) => saved = Some(token),
            }
        }
        if let Some(token) = saved {
            info!(token = %token.id, symbol = %token.symbol, "Token saved");
            self.close_token_form(token.logo_url());
        }
    }

    fn pick_logo(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Select token logo")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.upload_logo(path);
    }

    fn upload_logo(&mut self, path: PathBuf) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        debug!(path = %path.display(), "Uploading logo");
        let mutation = self.query.upload_logo(path, editor.upload_cancel.child_token());
        editor.start_upload(mutation);
    }

    fn submit_token_form(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match &editor.mode {
            EditorMode::Create => match editor.form.validate_create() {
                Ok(dto) => {
                    editor.errors = FieldErrors::default();
                    let mutation = self.query.create_token(dto);
                    editor.start_submit(mutation);
                }
                Err(errors) => editor.errors = errors,
            },
            EditorMode::Edit { id } => match editor.form.validate_update() {
                Ok(dto) => {
                    editor.errors = FieldErrors::default();
                    let mutation = self.query.update_token(id.clone(), dto);
                    editor.start_submit(mutation);
                }
                Err(errors) => editor.errors = errors,
            },
        }
        if !editor.errors.is_empty() {
            debug!(count = editor.errors.len(), "Token form has validation errors");
        }
    }

    /// Drop the form, cancelling any upload and deleting images it stored
    /// that did not end up on a token.
    fn close_token_form(&mut self, kept_logo: Option<&str>) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        editor.upload_cancel.cancel();
        for url in editor.orphaned_uploads(kept_logo) {
            debug!(url = %url, "Deleting unused upload");
            let _ = self.query.delete_image(url);
        }
    }
}

fn field_label(ui: &mut egui::Ui, label: &str) {
    ui.add_space(theme::SPACING_MD);
    ui.label(egui::RichText::new(label).size(theme::FONT_LABEL).strong().color(theme::TEXT_SECONDARY));
}

fn field_error(ui: &mut egui::Ui, error: Option<&str>) {
    if let Some(message) = error {
        ui.label(egui::RichText::new(message).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
    }
}

fn text_field(ui: &mut egui::Ui, label: &str, hint: &str, value: &mut String, error: Option<&str>) {
    field_label(ui, label);
    let stroke = if error.is_some() {
        egui::Stroke::new(theme::STROKE_DEFAULT, theme::STATUS_ERROR)
    } else {
        egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_DEFAULT)
    };
    egui::Frame::new()
        .fill(theme::BG_INPUT)
        .stroke(stroke)
        .corner_radius(theme::RADIUS_DEFAULT)
        .inner_margin(egui::Margin::symmetric(8, 6))
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text(hint)
                    .frame(false)
                    .desired_width(f32::INFINITY),
            );
        });
    field_error(ui, error);
}
