use duoread_core::{SidebarView, is_compact_width};

/// Independent reader toggles. None of these are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub active_sidebar_view: Option<SidebarView>,
    pub show_translation: bool,
    pub show_audio_player: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_sidebar_view: Some(SidebarView::Vocabulary),
            show_translation: false,
            show_audio_player: false,
        }
    }
}

impl UiState {
    pub fn set_active_sidebar_view(&mut self, view: Option<SidebarView>) {
        self.active_sidebar_view = view;
    }

    pub fn toggle_sidebar_view(&mut self, view: SidebarView) {
        self.active_sidebar_view = Some(view);
    }

    pub fn toggle_translation(&mut self) {
        self.show_translation = !self.show_translation;
    }

    pub fn toggle_audio_player(&mut self) {
        self.show_audio_player = !self.show_audio_player;
        tracing::debug!(show_audio_player = self.show_audio_player, "audio player toggled");
    }
}

/// Sidebar drawer state. On wide viewports the sidebar is docked and the
/// drawer is always closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarState {
    is_open: bool,
    is_mobile: bool,
}

impl SidebarState {
    pub fn new(viewport_width_px: u32) -> Self {
        Self {
            is_open: false,
            is_mobile: is_compact_width(viewport_width_px),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_mobile(&self) -> bool {
        self.is_mobile
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn handle_resize(&mut self, viewport_width_px: u32) {
        self.is_mobile = is_compact_width(viewport_width_px);
        if !self.is_mobile {
            self.is_open = false;
        }
    }
}
