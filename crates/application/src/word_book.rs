use std::rc::Rc;

use anyhow::Context as _;
use duoread_core::SavedWord;
use duoread_storage::{LocalStore, WORD_BOOK_KEY};

pub type Clock = Box<dyn Fn() -> i64>;

/// The user's saved words. Every mutation writes the whole collection back
/// to the store under [`WORD_BOOK_KEY`].
pub struct WordBook {
    store: Rc<dyn LocalStore>,
    words: Vec<SavedWord>,
    clock: Clock,
}

impl std::fmt::Debug for WordBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordBook")
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

impl WordBook {
    pub fn load(store: Rc<dyn LocalStore>) -> Self {
        Self::with_clock(store, Box::new(unix_now_millis))
    }

    /// Reads the persisted collection. A corrupt value is logged and replaced
    /// by an empty book.
    pub fn with_clock(store: Rc<dyn LocalStore>, clock: Clock) -> Self {
        let words = match store.get_item(WORD_BOOK_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<SavedWord>>(&raw) {
                Ok(words) => words,
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable word book");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "word book unavailable");
                Vec::new()
            }
        };
        Self {
            store,
            words,
            clock,
        }
    }

    pub fn words(&self) -> &[SavedWord] {
        &self.words
    }

    pub fn get(&self, word: &str) -> Option<&SavedWord> {
        self.words.iter().find(|w| w.word == word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Inserts `word`, or replaces the entry with the same key while keeping
    /// its notes. The timestamp is always refreshed.
    pub fn add(&mut self, word: SavedWord) -> anyhow::Result<()> {
        let timestamp = (self.clock)();
        match self.words.iter().position(|w| w.word == word.word) {
            Some(index) => {
                let notes = std::mem::take(&mut self.words[index].notes);
                self.words[index] = SavedWord {
                    timestamp,
                    notes,
                    ..word
                };
            }
            None => self.words.push(SavedWord {
                timestamp,
                notes: String::new(),
                ..word
            }),
        }
        self.persist()
    }

    pub fn remove(&mut self, word: &str) -> anyhow::Result<()> {
        let before = self.words.len();
        self.words.retain(|w| w.word != word);
        if self.words.len() == before {
            return Ok(());
        }
        self.persist()
    }

    pub fn update_note(&mut self, word: &str, text: &str) -> anyhow::Result<()> {
        let Some(entry) = self.words.iter_mut().find(|w| w.word == word) else {
            return Ok(());
        };
        entry.notes = text.to_string();
        self.persist()
    }

    pub fn update_note_height(&mut self, word: &str, height: f64) -> anyhow::Result<()> {
        let Some(entry) = self.words.iter_mut().find(|w| w.word == word) else {
            return Ok(());
        };
        entry.note_height = Some(height);
        self.persist()
    }

    fn persist(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string(&self.words).context("encode word book")?;
        self.store
            .set_item(WORD_BOOK_KEY, &json)
            .context("save word book")
    }
}

/// Milliseconds since the Unix epoch, the unit of saved-word timestamps.
pub fn unix_now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
