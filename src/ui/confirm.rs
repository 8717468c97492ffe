//! Confirmation dialog guarding destructive actions

use crate::query::Mutation;
use crate::theme;
use eframe::egui;
use egui_phosphor::regular as icons;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Confirm,
    Cancel,
}

/// An open confirmation for `target`, plus the write it started, if any.
/// The dialog stays up until that write succeeds.
pub struct ConfirmGate<T> {
    pub title: String,
    pub description: String,
    pub confirm_text: String,
    pub target: T,
    in_flight: Option<Mutation<()>>,
}

impl<T> ConfirmGate<T> {
    pub fn new(title: impl Into<String>, description: impl Into<String>, confirm_text: impl Into<String>, target: T) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confirm_text: confirm_text.into(),
            target,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(Mutation::is_pending)
    }

    pub fn start(&mut self, mutation: Mutation<()>) {
        self.in_flight = Some(mutation);
    }

    /// Outcome of the started write, reported once.
    pub fn poll(&mut self) -> Option<Result<(), String>> {
        let outcome = self.in_flight.as_ref()?.poll()?;
        self.in_flight = None;
        Some(outcome)
    }

    /// Draw the dialog. Clicks are ignored while the write is in flight.
    pub fn show(&self, ctx: &egui::Context) -> Option<ConfirmChoice> {
        let busy = self.is_busy();
        let mut choice = None;

        let modal = egui::Modal::new(egui::Id::new("confirm_dialog"))
            .backdrop_color(egui::Color32::from_black_alpha(160))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(theme::MODAL_WIDTH - 60.0);
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(icons::WARNING)
                            .size(theme::FONT_TITLE)
                            .color(theme::STATUS_ERROR),
                    );
                    ui.label(egui::RichText::new(&self.title).size(theme::FONT_HEADING).strong());
                });
                ui.add_space(theme::SPACING_MD);
                ui.label(egui::RichText::new(&self.description).color(theme::TEXT_MUTED));
                ui.add_space(theme::SPACING_XL);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let confirm_label = if busy {
                        "Loading...".to_string()
                    } else {
                        self.confirm_text.clone()
                    };
                    if ui.add_enabled(!busy, theme::button_danger(confirm_label)).clicked() {
                        choice = Some(ConfirmChoice::Confirm);
                    }
                    if busy {
                        ui.add(egui::Spinner::new().size(16.0));
                    }
                    if ui.add_enabled(!busy, theme::button("Cancel")).clicked() {
                        choice = Some(ConfirmChoice::Cancel);
                    }
                });
            });

        if modal.should_close() && !busy && choice.is_none() {
            choice = Some(ConfirmChoice::Cancel);
        }
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MutationState;

    #[test]
    fn busy_until_write_settles() {
        let mut gate = ConfirmGate::new("Delete Token", "Sure?", "Delete", "t1".to_string());
        assert!(!gate.is_busy());
        assert_eq!(gate.poll(), None);

        gate.start(Mutation::from_state(MutationState::Pending));
        assert!(gate.is_busy());
        assert_eq!(gate.poll(), None);
    }

    #[test]
    fn outcome_reported_once() {
        let mut gate = ConfirmGate::new("Delete Token", "Sure?", "Delete", 7u32);
        gate.start(Mutation::from_state(MutationState::Failed("nope".into())));
        assert!(!gate.is_busy());
        assert_eq!(gate.poll(), Some(Err("nope".into())));
        assert_eq!(gate.poll(), None);
        assert_eq!(gate.target, 7);
    }
}
