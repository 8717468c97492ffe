//! Toast notifications stacked in the bottom-right corner

use crate::constants::TOAST_DURATION;
use crate::theme;
use eframe::egui;
use egui_phosphor::regular as icons;
use std::time::{Duration, Instant};

const FADE: Duration = Duration::from_millis(500);
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    /// 1.0 while visible, fading to 0.0 over the last half second
    fn alpha(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed <= TOAST_DURATION {
            1.0
        } else {
            let fading = (elapsed - TOAST_DURATION).as_secs_f32();
            (1.0 - fading / FADE.as_secs_f32()).max(0.0)
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_DURATION + FADE
    }
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into(), Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into(), Instant::now());
    }

    fn push(&mut self, kind: ToastKind, message: String, now: Instant) {
        self.items.push(Toast {
            kind,
            message,
            shown_at: now,
        });
        if self.items.len() > MAX_VISIBLE {
            self.items.remove(0);
        }
    }

    fn prune(&mut self, now: Instant) {
        self.items.retain(|t| !t.expired(now));
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.prune(now);
        if self.items.is_empty() {
            return;
        }

        let screen = ctx.screen_rect();
        let margin = theme::SPACING_XL;
        let mut hovered = false;

        egui::Area::new(egui::Id::new("toasts"))
            .fixed_pos(egui::pos2(screen.right() - margin, screen.bottom() - margin))
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                ui.set_max_width(theme::TOAST_WIDTH);
                ui.spacing_mut().item_spacing.y = theme::SPACING_MD;
                for toast in &self.items {
                    let alpha = toast.alpha(now);
                    let (icon, accent) = match toast.kind {
                        ToastKind::Success => (icons::CHECK_CIRCLE, theme::STATUS_SUCCESS),
                        ToastKind::Error => (icons::WARNING_CIRCLE, theme::STATUS_ERROR),
                    };
                    let fade = |c: egui::Color32| c.gamma_multiply(alpha);
                    let response = theme::toast_frame(accent, alpha)
                        .show(ui, |ui| {
                            ui.set_width(theme::TOAST_WIDTH);
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(icon).size(theme::FONT_HEADING).color(fade(accent)));
                                ui.add(
                                    egui::Label::new(
                                        egui::RichText::new(&toast.message).color(fade(theme::TEXT_PRIMARY)),
                                    )
                                    .wrap(),
                                );
                            });
                        })
                        .response;
                    hovered |= response.hovered();
                }
            });

        // pause expiry while the pointer rests on a toast
        if hovered {
            for toast in &mut self.items {
                toast.shown_at = now;
            }
        }
        ctx.request_repaint_after(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_fade() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        toasts.push(ToastKind::Success, "Token created successfully".into(), start);

        toasts.prune(start + TOAST_DURATION);
        assert_eq!(toasts.items.len(), 1);

        toasts.prune(start + TOAST_DURATION + FADE);
        assert_eq!(toasts.items.len(), 0);
    }

    #[test]
    fn alpha_fades_out() {
        let start = Instant::now();
        let toast = Toast {
            kind: ToastKind::Error,
            message: "x".into(),
            shown_at: start,
        };
        assert_eq!(toast.alpha(start), 1.0);
        let mid = toast.alpha(start + TOAST_DURATION + FADE / 2);
        assert!(mid > 0.4 && mid < 0.6);
        assert_eq!(toast.alpha(start + TOAST_DURATION + FADE * 2), 0.0);
    }

    #[test]
    fn oldest_dropped_when_full() {
        let now = Instant::now();
        let mut toasts = Toasts::default();
        for i in 0..=MAX_VISIBLE {
            toasts.push(ToastKind::Success, format!("t{i}"), now);
        }
        let messages: Vec<_> = toasts.items.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages.len(), MAX_VISIBLE);
        assert_eq!(messages[0], "t1");
    }
}
