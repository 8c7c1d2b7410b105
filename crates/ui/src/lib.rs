//! Terminal front end for duoread.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use duoread_application::{ReaderContext, ScrollTo, THEME_ATTRIBUTE, unix_now_millis};
use duoread_core::{ArticleData, SavedWord, ScrollMetrics, SidebarView, Theme};
use duoread_engine::ArticleLoader;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, Gauge, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};

mod text;

use text::{format_saved_at, highlight_line, wrap_text};

/// Approximate width of one terminal cell, used to map columns onto the
/// pixel breakpoint of the compact layout.
pub const CELL_WIDTH_PX: u32 = 8;

const DEFAULT_NOTE_ROWS: f64 = 3.0;
const MIN_NOTE_ROWS: f64 = 2.0;
const MAX_NOTE_ROWS: f64 = 12.0;

/// Current terminal width expressed in pixels.
pub fn viewport_width_px() -> u32 {
    terminal::size()
        .map(|(cols, _)| u32::from(cols) * CELL_WIDTH_PX)
        .unwrap_or(0)
}

/// Best-effort system dark-mode detection from `COLORFGBG` (`fg;bg`).
pub fn prefers_dark_from_env() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().map(str::to_string))
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .is_some_and(|bg| bg < 7 || bg == 8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Article,
    Sidebar,
}

#[derive(Debug, Default)]
struct ReaderPanel {
    offset: u32,
    content_rows: u32,
    viewport_rows: u32,
    /// Set once the rows of a settled article have been laid out.
    measured: bool,
}

impl ReaderPanel {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.offset,
            scroll_height: self.content_rows,
            client_height: self.viewport_rows,
        }
    }

    fn max_offset(&self) -> u32 {
        self.metrics().max_scroll_top()
    }

    fn scroll_by(&mut self, delta: i64) {
        let next = (i64::from(self.offset) + delta).clamp(0, i64::from(self.max_offset()));
        self.offset = u32::try_from(next).unwrap_or(0);
    }

    fn scroll_to(&mut self, offset: u32) {
        self.offset = offset.min(self.max_offset());
    }

    /// Applies a restored offset. Until the settled article has been measured
    /// the offset is kept as is, since the row count still describes the
    /// loading screen.
    fn restore(&mut self, offset: u32) {
        if self.measured {
            self.scroll_to(offset);
        } else {
            self.offset = offset;
        }
    }

    fn measure(&mut self, content_rows: u32, viewport_rows: u32, settled: bool) {
        self.content_rows = content_rows;
        self.viewport_rows = viewport_rows;
        if settled {
            self.offset = self.offset.min(self.max_offset());
            self.measured = true;
        }
    }
}

#[derive(Debug, Default)]
struct SidebarPanel {
    vocab_selected: usize,
    word_selected: usize,
}

#[derive(Debug, Default)]
struct NotePanel {
    open: bool,
    word: String,
    input: String,
}

struct Palette {
    base: Style,
    accent: Color,
    muted: Style,
    marked: Style,
}

impl Palette {
    /// Palette for the applied `data-theme` attribute; light until a theme is applied.
    fn for_attribute(attribute: Option<(&str, &str)>) -> Self {
        let theme = attribute
            .filter(|(name, _)| *name == THEME_ATTRIBUTE)
            .and_then(|(_, value)| value.parse::<Theme>().ok())
            .unwrap_or(Theme::Light);
        Self::for_theme(theme)
    }

    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                muted: Style::default().fg(Color::DarkGray).bg(Color::White),
                marked: Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
            },
            Theme::Dark => Self {
                base: Style::default().fg(Color::White).bg(Color::Black),
                accent: Color::Yellow,
                muted: Style::default().fg(Color::Gray).bg(Color::Black),
                marked: Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            },
        }
    }
}

pub struct Ui {
    ctx: ReaderContext,
    loader: Option<ArticleLoader>,
    prefers_dark: bool,
    focus: Focus,
    reader: ReaderPanel,
    sidebar_panel: SidebarPanel,
    note_panel: NotePanel,
    pending_resize: Option<u32>,
    pending_scroll: bool,
}

impl Ui {
    pub fn new(ctx: ReaderContext, loader: ArticleLoader, prefers_dark: bool) -> Self {
        Self {
            ctx,
            loader: Some(loader),
            prefers_dark,
            focus: Focus::Article,
            reader: ReaderPanel::default(),
            sidebar_panel: SidebarPanel::default(),
            note_panel: NotePanel::default(),
            pending_resize: None,
            pending_scroll: false,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        if let Err(err) = terminal.clear() {
            tracing::warn!(error = %err, "failed to clear terminal");
        }
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        self.ctx.deactivate();
        let restore_result = restore_terminal(&mut terminal);
        if let Err(err) = &restore_result {
            tracing::error!(error = %format!("{err:#}"), "failed to restore terminal");
        }

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let max_wait = Duration::from_millis(25);
        self.ctx
            .activate(Instant::now(), self.prefers_dark, self.reader.metrics());

        loop {
            let now = Instant::now();
            self.poll_loader(now);
            if let Some(ScrollTo(offset)) = self.ctx.tick(now, self.reader.metrics()) {
                tracing::debug!(offset, "restoring scroll position");
                self.reader.restore(offset);
                self.pending_scroll = true;
            }

            terminal.draw(|frame| self.draw(frame.area(), frame))?;

            // Report the restored offset with the geometry of the frame just drawn.
            if std::mem::take(&mut self.pending_scroll) {
                self.scrolled();
            }

            if let Some(width_px) = self.pending_resize.take() {
                self.ctx
                    .handle_resize(Instant::now(), width_px, self.reader.metrics());
            }

            let timeout = self
                .ctx
                .scroll
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .map_or(max_wait, |until| until.min(max_wait));
            if !event::poll(timeout)? {
                continue;
            }

            match event::read()? {
                Event::Resize(cols, _) => {
                    self.pending_resize = Some(u32::from(cols) * CELL_WIDTH_PX);
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let quit = if self.note_panel.open {
                        self.handle_note_key(key)?
                    } else if self.focus == Focus::Sidebar && self.sidebar_visible() {
                        self.handle_sidebar_key(key)?
                    } else {
                        self.focus = Focus::Article;
                        self.handle_article_key(key)?
                    };
                    if quit {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn poll_loader(&mut self, now: Instant) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        if let Some(result) = loader.poll() {
            match &result {
                Ok(_) => tracing::info!(article = %loader.id(), "article published"),
                Err(err) => {
                    tracing::warn!(article = %loader.id(), error = %format!("{err:#}"), "article failed to load")
                }
            }
            self.ctx.publish_article(now, result);
            self.loader = None;
        }
    }

    fn article_settled(&self) -> bool {
        !self.ctx.article.is_loading()
    }

    fn sidebar_visible(&self) -> bool {
        if self.ctx.sidebar.is_mobile() {
            self.ctx.sidebar.is_open()
        } else {
            self.ctx.ui.active_sidebar_view.is_some()
        }
    }

    fn sidebar_view(&self) -> SidebarView {
        self.ctx
            .ui
            .active_sidebar_view
            .unwrap_or(SidebarView::Vocabulary)
    }

    fn scrolled(&mut self) {
        self.ctx
            .scroll
            .on_scroll(Instant::now(), self.reader.metrics());
    }

    fn handle_article_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let page = i64::from(self.reader.viewport_rows.saturating_sub(1).max(1));
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.ctx.focus.active_term().is_none() {
                    return Ok(true);
                }
                self.ctx.go_back();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.reader.scroll_by(1);
                self.scrolled();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.reader.scroll_by(-1);
                self.scrolled();
            }
            KeyCode::PageDown | KeyCode::Char(' ') | KeyCode::Char('f') => {
                self.reader.scroll_by(page);
                self.scrolled();
            }
            KeyCode::PageUp | KeyCode::Char('b') => {
                self.reader.scroll_by(-page);
                self.scrolled();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.reader.scroll_to(0);
                self.scrolled();
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.reader.scroll_to(u32::MAX);
                self.scrolled();
            }
            KeyCode::Char('t') => self.ctx.ui.toggle_translation(),
            KeyCode::Char('a') => self.ctx.ui.toggle_audio_player(),
            KeyCode::Char('d') => self.ctx.toggle_theme(Instant::now()),
            KeyCode::Char('v') => {
                self.ctx.ui.toggle_sidebar_view(SidebarView::Vocabulary);
            }
            KeyCode::Char('w') => {
                self.ctx.ui.toggle_sidebar_view(SidebarView::WordBook);
            }
            KeyCode::Char('s') => {
                if self.ctx.sidebar.is_mobile() {
                    self.ctx.sidebar.toggle();
                } else if self.ctx.ui.active_sidebar_view.is_some() {
                    self.ctx.ui.set_active_sidebar_view(None);
                } else {
                    self.ctx
                        .ui
                        .set_active_sidebar_view(Some(SidebarView::Vocabulary));
                }
            }
            KeyCode::Tab => {
                if self.ctx.sidebar.is_mobile() {
                    self.ctx.sidebar.open();
                } else if self.ctx.ui.active_sidebar_view.is_none() {
                    self.ctx
                        .ui
                        .set_active_sidebar_view(Some(SidebarView::Vocabulary));
                }
                self.focus = Focus::Sidebar;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Tab | KeyCode::Esc => {
                self.focus = Focus::Article;
                if key.code == KeyCode::Esc {
                    self.ctx.go_back();
                }
                return Ok(false);
            }
            KeyCode::Char('v') => {
                self.ctx.ui.toggle_sidebar_view(SidebarView::Vocabulary);
                return Ok(false);
            }
            KeyCode::Char('w') => {
                self.ctx.ui.toggle_sidebar_view(SidebarView::WordBook);
                return Ok(false);
            }
            _ => {}
        }

        match self.sidebar_view() {
            SidebarView::Vocabulary => self.handle_vocabulary_key(key),
            SidebarView::WordBook => self.handle_word_book_key(key),
        }
        Ok(false)
    }

    fn handle_vocabulary_key(&mut self, key: KeyEvent) {
        let len = self
            .ctx
            .article
            .article()
            .map(|a| a.vocabulary.len())
            .unwrap_or(0);
        let selected = &mut self.sidebar_panel.vocab_selected;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    *selected = (*selected + 1).min(len - 1);
                }
            }
            KeyCode::Enter => {
                let Some(term) = self.selected_vocab().map(|v| v.term.clone()) else {
                    return;
                };
                let now = Instant::now();
                if self.ctx.focus_term(now, &term) {
                    self.jump_to_term(&term);
                }
            }
            KeyCode::Char('+') => {
                let Some(item) = self.selected_vocab().cloned() else {
                    return;
                };
                self.ctx
                    .save_word(Instant::now(), SavedWord::from_vocab(&item));
            }
            _ => {}
        }
    }

    fn handle_word_book_key(&mut self, key: KeyEvent) {
        let len = self.ctx.word_book.len();
        let selected = &mut self.sidebar_panel.word_selected;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    *selected = (*selected + 1).min(len - 1);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                let Some(word) = self.selected_word().map(|w| w.word.clone()) else {
                    return;
                };
                self.ctx.remove_word(Instant::now(), &word);
                let len = self.ctx.word_book.len();
                self.sidebar_panel.word_selected =
                    self.sidebar_panel.word_selected.min(len.saturating_sub(1));
            }
            KeyCode::Enter | KeyCode::Char('n') => {
                let Some(word) = self.selected_word().cloned() else {
                    return;
                };
                self.note_panel = NotePanel {
                    open: true,
                    word: word.word,
                    input: word.notes,
                };
            }
            KeyCode::Char('[') | KeyCode::Char(']') => {
                let Some(word) = self.selected_word().cloned() else {
                    return;
                };
                let step = if key.code == KeyCode::Char(']') { 1.0 } else { -1.0 };
                let height = (word.note_height.unwrap_or(DEFAULT_NOTE_ROWS) + step)
                    .clamp(MIN_NOTE_ROWS, MAX_NOTE_ROWS);
                self.ctx
                    .update_note_height(Instant::now(), &word.word, height);
            }
            _ => {}
        }
    }

    fn handle_note_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.note_panel = NotePanel::default();
            }
            KeyCode::Enter => {
                let panel = std::mem::take(&mut self.note_panel);
                self.ctx
                    .update_note(Instant::now(), &panel.word, &panel.input);
            }
            KeyCode::Backspace => {
                self.note_panel.input.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    self.note_panel.input.push(ch);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn selected_vocab(&self) -> Option<&duoread_core::VocabItem> {
        self.ctx
            .article
            .article()?
            .vocabulary
            .get(self.sidebar_panel.vocab_selected)
    }

    fn selected_word(&self) -> Option<&SavedWord> {
        self.ctx
            .word_book
            .words()
            .get(self.sidebar_panel.word_selected)
    }

    /// Scrolls the article to the first wrapped row mentioning `term`.
    fn jump_to_term(&mut self, term: &str) {
        let needle = term.to_ascii_lowercase();
        let row = self
            .article_rows(self.last_article_width())
            .iter()
            .position(|line| line_text(line).to_ascii_lowercase().contains(&needle));
        if let Some(row) = row {
            self.reader.scroll_to(u32::try_from(row).unwrap_or(0));
            self.scrolled();
        }
    }

    fn last_article_width(&self) -> usize {
        let cols = viewport_width_px() / CELL_WIDTH_PX;
        let cols = if self.sidebar_visible() && !self.ctx.sidebar.is_mobile() {
            cols * 3 / 5
        } else {
            cols
        };
        usize::try_from(cols.saturating_sub(2)).unwrap_or(0)
    }

    fn palette(&self) -> Palette {
        Palette::for_attribute(self.ctx.theme.document_attribute())
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let palette = self.palette();
        frame.render_widget(Block::default().style(palette.base), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(layout[0], frame, &palette);
        self.draw_progress(layout[1], frame, &palette);

        let docked = !self.ctx.sidebar.is_mobile() && self.sidebar_visible();
        let body = if docked {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(layout[2])
        } else {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(100)])
                .split(layout[2])
        };

        let mut article_area = body[0];
        if self.ctx.ui.show_audio_player {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(4), Constraint::Min(0)])
                .split(article_area);
            self.draw_audio_player(split[0], frame, &palette);
            article_area = split[1];
        }
        self.draw_article(article_area, frame, &palette);

        if docked {
            self.draw_sidebar(body[1], frame, &palette);
        } else if self.sidebar_visible() {
            let popup = centered_rect(90, 85, layout[2]);
            frame.render_widget(Clear, popup);
            self.draw_sidebar(popup, frame, &palette);
        }

        self.draw_footer(layout[3], frame, &palette);

        if self.note_panel.open {
            self.draw_note_panel(area, frame, &palette);
        }
    }

    fn draw_header(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let title_style = palette
            .base
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD);
        let lines = match self.ctx.article.article() {
            Some(article) => {
                let mut meta = vec![Span::styled(article.source.clone(), palette.muted)];
                if let Some(minutes) = self.ctx.estimated_reading_time {
                    meta.push(Span::styled(format!(" · {minutes} min read"), palette.muted));
                }
                meta.push(Span::styled(
                    format!(" · {} theme", self.ctx.theme.theme()),
                    palette.muted,
                ));
                vec![
                    Line::from(Span::styled(article.title.clone(), title_style)),
                    Line::from(Span::styled(article.subtitle.clone(), palette.base)),
                    Line::from(meta),
                ]
            }
            None => vec![
                Line::from(Span::styled(
                    format!("duoread: {}", self.ctx.article_id),
                    title_style,
                )),
                Line::from(Span::styled(
                    if self.ctx.article.is_loading() {
                        "Loading article…"
                    } else {
                        "No article"
                    },
                    palette.muted,
                )),
            ],
        };
        frame.render_widget(Paragraph::new(Text::from(lines)).style(palette.base), area);
    }

    fn draw_progress(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let percent = self.ctx.reading_progress();
        let gauge = Gauge::default()
            .gauge_style(palette.base.fg(palette.accent))
            .ratio(f64::from(percent / 100.0).clamp(0.0, 1.0))
            .label(format!("{percent:.0}%"));
        frame.render_widget(gauge, area);
    }

    fn draw_audio_player(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let url = self
            .ctx
            .article
            .article()
            .map(|a| a.audio_url.clone())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "(no audio for this article)".to_string());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                "Audio",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .style(palette.base);
        let text = Text::from(vec![
            Line::from(Span::styled(url, palette.base)),
            Line::from(Span::styled(
                "Playback is not available in the terminal.",
                palette.muted,
            )),
        ]);
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn article_rows(&self, width: usize) -> Vec<Line<'static>> {
        let palette = self.palette();
        if let Some(err) = self.ctx.article.error() {
            return vec![Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))];
        }
        let Some(article) = self.ctx.article.article() else {
            return vec![Line::from(Span::styled("Loading article…", palette.muted))];
        };
        article_lines(
            article,
            width,
            self.ctx.ui.show_translation,
            self.ctx.focus.active_term(),
            &palette,
        )
    }

    fn draw_article(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.focus == Focus::Article {
                palette.base.fg(palette.accent)
            } else {
                palette.base
            })
            .style(palette.base);
        let inner = block.inner(area);
        let rows = self.article_rows(usize::from(inner.width));

        let settled = self.article_settled();
        self.reader.measure(
            u32::try_from(rows.len()).unwrap_or(u32::MAX),
            u32::from(inner.height),
            settled,
        );

        let scroll = u16::try_from(self.reader.offset).unwrap_or(u16::MAX);
        let paragraph = Paragraph::new(Text::from(rows))
            .block(block)
            .scroll((scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_sidebar(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let view = self.sidebar_view();
        let title = match view {
            SidebarView::Vocabulary => "Vocabulary".to_string(),
            SidebarView::WordBook => format!("Word book ({})", self.ctx.word_book.len()),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .border_style(if self.focus == Focus::Sidebar {
                palette.base.fg(palette.accent)
            } else {
                palette.base
            })
            .style(palette.base);
        frame.render_widget(block.clone(), area);

        let inner = block.inner(area);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Min(0)])
            .split(inner);

        match view {
            SidebarView::Vocabulary => self.draw_vocabulary(sections[0], sections[1], frame, palette),
            SidebarView::WordBook => self.draw_word_book(sections[0], sections[1], frame, palette),
        }
    }

    fn list_highlight(&self, palette: &Palette) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    fn draw_vocabulary(
        &self,
        list_area: Rect,
        detail_area: Rect,
        frame: &mut ratatui::Frame,
        palette: &Palette,
    ) {
        let vocabulary = self
            .ctx
            .article
            .article()
            .map(|a| a.vocabulary.as_slice())
            .unwrap_or(&[]);

        let items: Vec<ListItem> = if vocabulary.is_empty() {
            vec![ListItem::new(Line::raw("(none)"))]
        } else {
            vocabulary
                .iter()
                .map(|item| {
                    let style = if self.ctx.focus.is_highlighted(&item.term) {
                        palette.marked
                    } else {
                        palette.base
                    };
                    let saved = if self.ctx.word_book.contains(&item.term) {
                        " ★"
                    } else {
                        ""
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(item.term.clone(), style),
                        Span::styled(saved, palette.muted),
                    ]))
                })
                .collect()
        };

        let list = List::new(items)
            .highlight_style(self.list_highlight(palette))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        if !vocabulary.is_empty() {
            state.select(Some(
                self.sidebar_panel.vocab_selected.min(vocabulary.len() - 1),
            ));
        }
        frame.render_stateful_widget(list, list_area, &mut state);

        let Some(item) = self.selected_vocab() else {
            return;
        };
        let label = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled(item.term.clone(), palette.base.fg(palette.accent).add_modifier(Modifier::BOLD))),
            Line::from(vec![Span::styled("Definition: ", label), Span::raw(item.definition.clone())]),
        ];
        if !item.etymology.trim().is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Etymology: ", label),
                Span::raw(item.etymology.clone()),
            ]));
        }
        if !item.role_in_text.trim().is_empty() {
            lines.push(Line::from(vec![
                Span::styled("In context: ", label),
                Span::raw(item.role_in_text.clone()),
            ]));
        }
        if !item.original_sentence.trim().is_empty() {
            lines.push(Line::from(Span::styled(
                format!("“{}”", item.original_sentence.trim()),
                palette.muted.add_modifier(Modifier::ITALIC),
            )));
        }
        if !item.collocations.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Collocations: ", label),
                Span::raw(item.collocations.join(", ")),
            ]));
        }
        let detail = Paragraph::new(Text::from(lines))
            .style(palette.base)
            .wrap(Wrap { trim: true });
        frame.render_widget(detail, detail_area);
    }

    fn draw_word_book(
        &self,
        list_area: Rect,
        detail_area: Rect,
        frame: &mut ratatui::Frame,
        palette: &Palette,
    ) {
        let words = self.ctx.word_book.words();
        let items: Vec<ListItem> = if words.is_empty() {
            vec![ListItem::new(Line::raw("(no saved words)"))]
        } else {
            words
                .iter()
                .map(|w| {
                    let note = if w.notes.trim().is_empty() { "" } else { " ✎" };
                    let gloss = w
                        .first_definition()
                        .map(|d| format!("  {d}"))
                        .unwrap_or_default();
                    ListItem::new(Line::from(vec![
                        Span::styled(w.word.clone(), palette.base),
                        Span::styled(note, palette.muted),
                        Span::styled(gloss, palette.muted),
                    ]))
                })
                .collect()
        };
        let list = List::new(items)
            .highlight_style(self.list_highlight(palette))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        if !words.is_empty() {
            state.select(Some(self.sidebar_panel.word_selected.min(words.len() - 1)));
        }
        frame.render_stateful_widget(list, list_area, &mut state);

        let Some(word) = self.selected_word() else {
            return;
        };
        let note_rows = word
            .note_height
            .unwrap_or(DEFAULT_NOTE_ROWS)
            .clamp(MIN_NOTE_ROWS, MAX_NOTE_ROWS) as u16;
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(note_rows + 2)])
            .split(detail_area);

        let mut lines = vec![Line::from(vec![
            Span::styled(
                word.word.clone(),
                palette.base.fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  saved {}", format_saved_at(word.timestamp, unix_now_millis())),
                palette.muted,
            ),
        ])];
        if let Some(phonetic) = word.phonetics.iter().find_map(|p| p.text.clone()) {
            lines.push(Line::from(Span::styled(phonetic, palette.muted)));
        }
        for meaning in &word.meanings {
            if !meaning.part_of_speech.is_empty() {
                lines.push(Line::from(Span::styled(
                    meaning.part_of_speech.clone(),
                    palette.muted.add_modifier(Modifier::ITALIC),
                )));
            }
            for definition in &meaning.definitions {
                lines.push(Line::from(format!("• {}", definition.definition)));
                if let Some(example) = &definition.example {
                    lines.push(Line::from(Span::styled(
                        format!("  “{example}”"),
                        palette.muted,
                    )));
                }
            }
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .style(palette.base)
                .wrap(Wrap { trim: true }),
            sections[0],
        );

        let notes = Paragraph::new(word.notes.clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Notes")
                    .style(palette.base),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(notes, sections[1]);
    }

    fn draw_note_panel(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        let popup = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                format!("Note: {}", self.note_panel.word),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .style(palette.base);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);
        let input = Paragraph::new(format!("{}▏", self.note_panel.input))
            .style(palette.base)
            .wrap(Wrap { trim: false });
        frame.render_widget(input, sections[0]);

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel  "),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save"),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(footer, sections[1]);
    }

    fn draw_footer(&self, area: Rect, frame: &mut ratatui::Frame, palette: &Palette) {
        if let Some(message) = self.ctx.toast.message() {
            let toast = Paragraph::new(Line::from(Span::styled(
                message.to_string(),
                Style::default()
                    .fg(Color::Black)
                    .bg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(toast, area);
            return;
        }

        let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
        let spans = match (self.focus, self.sidebar_view()) {
            (Focus::Sidebar, SidebarView::Vocabulary) => vec![
                key("Enter"),
                Span::raw(" find in text  "),
                key("+"),
                Span::raw(" save word  "),
                key("w"),
                Span::raw(" word book  "),
                key("Tab"),
                Span::raw(" article"),
            ],
            (Focus::Sidebar, SidebarView::WordBook) => vec![
                key("Enter"),
                Span::raw(" edit note  "),
                key("[ ]"),
                Span::raw(" note size  "),
                key("x"),
                Span::raw(" remove  "),
                key("v"),
                Span::raw(" vocabulary  "),
                key("Tab"),
                Span::raw(" article"),
            ],
            (Focus::Article, _) => vec![
                key("t"),
                Span::raw(" translation  "),
                key("a"),
                Span::raw(" audio  "),
                key("d"),
                Span::raw(" theme  "),
                key("s"),
                Span::raw(" sidebar  "),
                key("Tab"),
                Span::raw(" focus sidebar  "),
                key("q"),
                Span::raw(" quit"),
            ],
        };
        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .style(palette.muted)
                .alignment(Alignment::Center),
            area,
        );
    }
}

fn article_lines(
    article: &ArticleData,
    width: usize,
    show_translation: bool,
    active_term: Option<&str>,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let heading = palette.base.fg(palette.accent).add_modifier(Modifier::BOLD);
    let mut out = Vec::new();

    for paragraph in &article.paragraphs {
        for row in wrap_text(&paragraph.en, width) {
            out.push(highlight_line(&row, active_term, palette.base, palette.marked));
        }
        if show_translation && !paragraph.zh.trim().is_empty() {
            for row in wrap_text(&paragraph.zh, width) {
                out.push(Line::from(Span::styled(row, palette.muted)));
            }
        }
        out.push(Line::raw(""));
    }

    for (title, points) in [
        ("Summary", &article.summary_points),
        ("Critical review", &article.critical_review_points),
    ] {
        if points.is_empty() {
            continue;
        }
        out.push(Line::from(Span::styled(title, heading)));
        for point in points {
            for (i, row) in wrap_text(point, width.saturating_sub(2)).into_iter().enumerate() {
                let bullet = if i == 0 { "• " } else { "  " };
                out.push(Line::from(Span::styled(format!("{bullet}{row}"), palette.base)));
            }
        }
        out.push(Line::raw(""));
    }

    out
}

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
