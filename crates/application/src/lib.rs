//! Application state for the duoread reader.

use std::rc::Rc;
use std::time::Instant;

use duoread_core::{ArticleData, ArticleId, SavedWord, ScrollMetrics, Settings};
use duoread_storage::LocalStore;

mod article;
mod debounce;
mod focus;
mod scroll;
mod theme;
mod toast;
mod ui_state;
mod word_book;

pub use article::ArticleState;
pub use debounce::Debouncer;
pub use focus::{HIGHLIGHT_DURATION, TermFocus};
pub use scroll::{PROGRESS_DEBOUNCE, SAVE_DEBOUNCE, SETTLE_DELAY, ScrollTo, ScrollTracker};
pub use theme::{THEME_ATTRIBUTE, ThemeState};
pub use toast::{TOAST_DURATION, Toast};
pub use ui_state::{SidebarState, UiState};
pub use word_book::{Clock, WordBook, unix_now_millis};

/// Everything the reader holds for one session. Built once at start-up and
/// handed to the front end by reference.
#[derive(Debug)]
pub struct ReaderContext {
    pub settings: Settings,
    pub article_id: ArticleId,
    pub article: ArticleState,
    pub estimated_reading_time: Option<u32>,
    pub word_book: WordBook,
    pub ui: UiState,
    pub sidebar: SidebarState,
    pub theme: ThemeState,
    pub scroll: ScrollTracker,
    pub focus: TermFocus,
    pub toast: Toast,
}

impl ReaderContext {
    pub fn new(
        settings: Settings,
        article_id: ArticleId,
        store: Rc<dyn LocalStore>,
        viewport_width_px: u32,
    ) -> Self {
        Self {
            settings,
            article_id,
            article: ArticleState::new(),
            estimated_reading_time: None,
            word_book: WordBook::load(store.clone()),
            ui: UiState::default(),
            sidebar: SidebarState::new(viewport_width_px),
            theme: ThemeState::new(store.clone()),
            scroll: ScrollTracker::new(store),
            focus: TermFocus::default(),
            toast: Toast::default(),
        }
    }

    /// Resolves the theme and starts scroll tracking.
    pub fn activate(&mut self, now: Instant, prefers_dark: bool, metrics: ScrollMetrics) {
        if let Err(err) = self.theme.resolve(prefers_dark) {
            self.report(now, err);
        }
        let loaded = self.article.is_loaded();
        self.scroll.activate(now, metrics, loaded);
    }

    pub fn deactivate(&mut self) {
        self.scroll.deactivate();
    }

    /// Publishes the settled article fetch and refreshes everything derived from it.
    pub fn publish_article(&mut self, now: Instant, result: anyhow::Result<ArticleData>) {
        self.article.settle(result);
        self.estimated_reading_time = estimate_reading_time(self.article.article());
        if self.article.is_loaded() {
            self.scroll.on_article_loaded(now);
        }
    }

    /// Services timers. Returns a scroll command when a saved position is restored.
    pub fn tick(&mut self, now: Instant, metrics: ScrollMetrics) -> Option<ScrollTo> {
        self.toast.tick(now);
        self.focus.tick(now);
        let loaded = self.article.is_loaded();
        self.scroll.tick(now, metrics, loaded)
    }

    pub fn reading_progress(&self) -> f32 {
        self.scroll.progress()
    }

    pub fn handle_resize(&mut self, now: Instant, viewport_width_px: u32, metrics: ScrollMetrics) {
        self.sidebar.handle_resize(viewport_width_px);
        self.scroll.on_resize(now, metrics);
    }

    pub fn focus_term(&mut self, now: Instant, term: &str) -> bool {
        self.focus.focus_term(
            now,
            term,
            self.article.article(),
            &mut self.ui,
            &mut self.sidebar,
        )
    }

    pub fn go_back(&mut self) {
        self.focus.go_back(&mut self.sidebar);
    }

    pub fn toggle_theme(&mut self, now: Instant) {
        if let Err(err) = self.theme.toggle_theme() {
            self.report(now, err);
        }
    }

    pub fn save_word(&mut self, now: Instant, word: SavedWord) {
        let name = word.word.clone();
        let existed = self.word_book.contains(&name);
        match self.word_book.add(word) {
            Ok(()) if existed => self.toast.trigger(now, format!("Updated \"{name}\" in word book")),
            Ok(()) => self.toast.trigger(now, format!("Added \"{name}\" to word book")),
            Err(err) => self.report(now, err),
        }
    }

    pub fn remove_word(&mut self, now: Instant, word: &str) {
        match self.word_book.remove(word) {
            Ok(()) => self.toast.trigger(now, format!("Removed \"{word}\" from word book")),
            Err(err) => self.report(now, err),
        }
    }

    pub fn update_note(&mut self, now: Instant, word: &str, text: &str) {
        if let Err(err) = self.word_book.update_note(word, text) {
            self.report(now, err);
        }
    }

    pub fn update_note_height(&mut self, now: Instant, word: &str, height: f64) {
        if let Err(err) = self.word_book.update_note_height(word, height) {
            self.report(now, err);
        }
    }

    fn report(&mut self, now: Instant, err: anyhow::Error) {
        tracing::warn!(error = %format!("{err:#}"), "storage write failed");
        self.toast.trigger(now, format!("{err:#}"));
    }
}

/// Minutes needed to read `article`, or `None` while there is no article.
pub fn estimate_reading_time(article: Option<&ArticleData>) -> Option<u32> {
    article.map(ArticleData::reading_minutes)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use duoread_core::{Paragraph, SidebarView, Theme, VocabItem};
    use duoread_storage::{MemoryStore, SCROLL_POSITION_KEY, THEME_KEY, WORD_BOOK_KEY};

    use super::*;

    fn article(words: usize) -> ArticleData {
        ArticleData {
            paragraphs: vec![Paragraph {
                en: vec!["word"; words].join(" "),
                zh: String::new(),
            }],
            vocabulary: vec![VocabItem {
                term: "word".to_string(),
                ..VocabItem::default()
            }],
            ..ArticleData::default()
        }
    }

    fn context(store: Rc<MemoryStore>, width: u32) -> ReaderContext {
        ReaderContext::new(Settings::default(), ArticleId::default(), store, width)
    }

    #[test]
    fn reading_time_follows_published_article() {
        let now = Instant::now();
        let mut ctx = context(Rc::new(MemoryStore::new()), 1600);
        assert_eq!(ctx.estimated_reading_time, None);
        ctx.publish_article(now, Ok(article(500)));
        assert_eq!(ctx.estimated_reading_time, Some(2));

        let mut failed = context(Rc::new(MemoryStore::new()), 1600);
        failed.publish_article(now, Err(anyhow::anyhow!("Could not load article data")));
        assert_eq!(failed.estimated_reading_time, None);
        assert!(!failed.article.is_loading());
    }

    #[test]
    fn estimate_reading_time_for_ten_units() {
        assert_eq!(estimate_reading_time(Some(&article(10))), Some(1));
        assert_eq!(estimate_reading_time(None), None);
    }

    #[test]
    fn activation_restores_theme_and_scroll() -> anyhow::Result<()> {
        let now = Instant::now();
        let store = Rc::new(
            MemoryStore::new()
                .with_item(THEME_KEY, "dark")
                .with_item(SCROLL_POSITION_KEY, "18"),
        );
        let mut ctx = context(store, 1600);
        let metrics = ScrollMetrics {
            scroll_top: 0,
            scroll_height: 40,
            client_height: 20,
        };
        ctx.activate(now, false, metrics);
        ctx.publish_article(now, Ok(article(40)));
        assert_eq!(ctx.theme.theme(), Theme::Dark);
        assert_eq!(ctx.tick(now + SETTLE_DELAY, metrics), Some(ScrollTo(18)));

        let restored = ScrollMetrics {
            scroll_top: 10,
            ..metrics
        };
        let scrolled_at = now + SETTLE_DELAY + Duration::from_millis(1);
        ctx.scroll.on_scroll(scrolled_at, restored);
        ctx.tick(scrolled_at + PROGRESS_DEBOUNCE, restored);
        assert_eq!(ctx.reading_progress(), 50.0);
        Ok(())
    }

    #[test]
    fn saving_words_reports_through_toast() -> anyhow::Result<()> {
        let now = Instant::now();
        let store = Rc::new(MemoryStore::new());
        let mut ctx = context(store.clone(), 1600);
        let item = VocabItem {
            term: "covert".to_string(),
            definition: "hidden".to_string(),
            ..VocabItem::default()
        };

        ctx.save_word(now, SavedWord::from_vocab(&item));
        assert_eq!(ctx.toast.message(), Some("Added \"covert\" to word book"));
        assert!(store.get_item(WORD_BOOK_KEY)?.is_some());

        store.set_read_only(true);
        ctx.update_note(now, "covert", "spy vocabulary");
        assert_eq!(
            ctx.toast.message(),
            Some("save word book: local storage quota exceeded while writing my-word-book")
        );
        Ok(())
    }

    #[test]
    fn resize_to_desktop_closes_drawer() {
        let now = Instant::now();
        let mut ctx = context(Rc::new(MemoryStore::new()), 700);
        ctx.publish_article(now, Ok(article(10)));
        assert!(ctx.focus_term(now, "Word"));
        assert!(ctx.sidebar.is_open());
        assert_eq!(ctx.ui.active_sidebar_view, Some(SidebarView::Vocabulary));

        ctx.handle_resize(now, 1400, ScrollMetrics::default());
        assert!(!ctx.sidebar.is_open());
    }
}
