use std::time::{Duration, Instant};

use duoread_core::{ArticleData, SidebarView};

use crate::ui_state::{SidebarState, UiState};

pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(2);

/// Vocabulary term selected from the article text.
#[derive(Debug, Clone, Default)]
pub struct TermFocus {
    active_term: Option<String>,
    highlight_until: Option<Instant>,
}

impl TermFocus {
    /// Shows `term` in the vocabulary panel. Returns whether the term has an
    /// entry in the article's vocabulary.
    pub fn focus_term(
        &mut self,
        now: Instant,
        term: &str,
        article: Option<&ArticleData>,
        ui: &mut UiState,
        sidebar: &mut SidebarState,
    ) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        ui.set_active_sidebar_view(Some(SidebarView::Vocabulary));
        if sidebar.is_mobile() {
            sidebar.open();
        }
        let Some(item) = article.and_then(|a| a.find_vocab(term)) else {
            return false;
        };
        self.active_term = Some(item.term.to_lowercase());
        self.highlight_until = Some(now + HIGHLIGHT_DURATION);
        true
    }

    pub fn go_back(&mut self, sidebar: &mut SidebarState) {
        if sidebar.is_mobile() {
            sidebar.close();
        }
        self.active_term = None;
        self.highlight_until = None;
    }

    pub fn tick(&mut self, now: Instant) {
        if self.highlight_until.is_some_and(|at| at <= now) {
            self.highlight_until = None;
        }
    }

    pub fn active_term(&self) -> Option<&str> {
        self.active_term.as_deref()
    }

    pub fn is_highlighted(&self, term: &str) -> bool {
        self.highlight_until.is_some()
            && self
                .active_term
                .as_deref()
                .is_some_and(|active| active == term.to_lowercase())
    }
}
