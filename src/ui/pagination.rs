//! Page navigation bar for paginated tables

use crate::theme;
use eframe::egui;
use egui_phosphor::regular as icons;

const MAX_VISIBLE_PAGES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Position within a paginated listing (pages are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            page: page.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page buttons to show: all pages when there are few, otherwise the
    /// current page ±2 with the first/last page and ellipses around them.
    pub fn items(&self) -> Vec<PageItem> {
        if self.total_pages <= MAX_VISIBLE_PAGES {
            return (1..=self.total_pages).map(PageItem::Page).collect();
        }

        let start = self.page.saturating_sub(2).max(1);
        let end = (self.page + 2).min(self.total_pages);
        let mut items = Vec::with_capacity(9);

        if start > 1 {
            items.push(PageItem::Page(1));
            if start > 2 {
                items.push(PageItem::Ellipsis);
            }
        }
        items.extend((start..=end).map(PageItem::Page));
        if end < self.total_pages {
            if end < self.total_pages - 1 {
                items.push(PageItem::Ellipsis);
            }
            items.push(PageItem::Page(self.total_pages));
        }
        items
    }

    /// "Page 2 of 5 (43 total tokens)"
    pub fn summary(&self, total_items: u64) -> String {
        if total_items > 0 {
            format!("Page {} of {} ({} total tokens)", self.page, self.total_pages, total_items)
        } else {
            format!("Page {} of {}", self.page, self.total_pages)
        }
    }
}

/// Draw the bar. Returns the page the user picked, if any.
pub fn show(ui: &mut egui::Ui, pagination: Pagination, total_items: u64, enabled: bool) -> Option<u32> {
    let mut picked = None;
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(pagination.summary(total_items))
                .size(theme::FONT_LABEL)
                .color(theme::TEXT_DIM),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.spacing_mut().item_spacing.x = theme::SPACING_SM;
            // right-to-left: next, numbers reversed, previous
            let next = ui.add_enabled(
                enabled && pagination.has_next(),
                theme::button(format!("Next {}", icons::CARET_RIGHT)),
            );
            if next.clicked() {
                picked = Some(pagination.page + 1);
            }

            for item in pagination.items().into_iter().rev() {
                match item {
                    PageItem::Ellipsis => {
                        ui.label(egui::RichText::new("...").color(theme::TEXT_DIM));
                    }
                    PageItem::Page(number) => {
                        let current = number == pagination.page;
                        let button = if current {
                            theme::button_accent(number.to_string())
                        } else {
                            theme::button(number.to_string())
                        };
                        let response = ui.add_enabled(
                            enabled,
                            button.min_size(egui::vec2(theme::PAGE_BUTTON_WIDTH, theme::BUTTON_HEIGHT)),
                        );
                        if response.clicked() && !current {
                            picked = Some(number);
                        }
                    }
                }
            }

            let previous = ui.add_enabled(
                enabled && pagination.has_previous(),
                theme::button(format!("{} Previous", icons::CARET_LEFT)),
            );
            if previous.clicked() {
                picked = Some(pagination.page - 1);
            }
        });
    });
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn previous_disabled_on_first_page() {
        let p = Pagination::new(1, 4);
        assert!(!p.has_previous());
        assert!(p.has_next());
    }

    #[test]
    fn next_disabled_on_last_page() {
        let p = Pagination::new(4, 4);
        assert!(p.has_previous());
        assert!(!p.has_next());

        let single = Pagination::new(1, 0);
        assert_eq!(single.total_pages, 1);
        assert!(!single.has_previous() && !single.has_next());
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        assert_eq!(Pagination::new(9, 3).page, 3);
        assert_eq!(Pagination::new(0, 3).page, 1);
    }

    #[test]
    fn few_pages_show_all() {
        assert_eq!(
            Pagination::new(2, 4).items(),
            vec![Page(1), Page(2), Page(3), Page(4)]
        );
    }

    #[test]
    fn many_pages_use_ellipsis() {
        assert_eq!(
            Pagination::new(1, 10).items(),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)]
        );
        assert_eq!(
            Pagination::new(6, 10).items(),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Page(7), Page(8), Ellipsis, Page(10)]
        );
        assert_eq!(
            Pagination::new(4, 7).items(),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7)]
        );
        assert_eq!(
            Pagination::new(10, 10).items(),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn summary_mentions_total_when_known() {
        assert_eq!(Pagination::new(2, 5).summary(43), "Page 2 of 5 (43 total tokens)");
        assert_eq!(Pagination::new(1, 1).summary(0), "Page 1 of 1");
    }
}
