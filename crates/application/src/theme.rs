use std::rc::Rc;

use anyhow::Context as _;
use duoread_core::Theme;
use duoread_storage::{LocalStore, THEME_KEY};

pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Current colour theme. The applied value is exposed as the `data-theme`
/// document attribute that the style layer keys on.
pub struct ThemeState {
    store: Rc<dyn LocalStore>,
    theme: Theme,
    applied: Option<Theme>,
}

impl std::fmt::Debug for ThemeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeState")
            .field("theme", &self.theme)
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

impl ThemeState {
    pub fn new(store: Rc<dyn LocalStore>) -> Self {
        Self {
            store,
            theme: Theme::default(),
            applied: None,
        }
    }

    /// Picks the initial theme: saved preference, then the system dark-mode
    /// preference, else light.
    pub fn resolve(&mut self, prefers_dark: bool) -> anyhow::Result<()> {
        let saved = self.store.get_item(THEME_KEY)?;
        let saved = saved.and_then(|value| match value.parse::<Theme>() {
            Ok(theme) => Some(theme),
            Err(_) => {
                tracing::warn!(value = %value, "ignoring unknown saved theme");
                None
            }
        });
        match saved {
            Some(theme) => self.set_theme(theme),
            None if prefers_dark => self.set_theme(Theme::Dark),
            None => Ok(()),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        self.theme = theme;
        self.applied = Some(theme);
        self.store
            .set_item(THEME_KEY, theme.as_str())
            .context("save theme")
    }

    pub fn toggle_theme(&mut self) -> anyhow::Result<()> {
        self.set_theme(self.theme.toggled())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// `(name, value)` of the document theme attribute, once a theme has been applied.
    pub fn document_attribute(&self) -> Option<(&'static str, &'static str)> {
        self.applied.map(|theme| (THEME_ATTRIBUTE, theme.as_str()))
    }
}
