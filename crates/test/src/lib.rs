//! Test helpers and fixtures.

use std::path::Path;

use duoread_core::{ArticleData, Paragraph, SavedWord, Settings, VocabItem};

pub fn make_settings(data_root: &str) -> Settings {
    Settings {
        data_root: data_root.to_string(),
        ..Settings::default()
    }
}

pub fn make_vocab(term: &str, definition: &str) -> VocabItem {
    VocabItem {
        term: term.to_string(),
        etymology: String::new(),
        definition: definition.to_string(),
        role_in_text: String::new(),
        original_sentence: String::new(),
        collocations: Vec::new(),
    }
}

/// A two-paragraph article whose vocabulary is listed out of reading order.
pub fn make_article() -> ArticleData {
    ArticleData {
        title: "Reading the Signals".to_string(),
        subtitle: "How analysts sort noise from intent".to_string(),
        source: "Weekly Brief".to_string(),
        audio_url: "audio/signals.mp3".to_string(),
        paragraphs: vec![
            Paragraph {
                en: "Analysts sift raw intercepts before any assessment is written.".to_string(),
                zh: "分析人员在撰写评估之前筛选原始截获信息。".to_string(),
            },
            Paragraph {
                en: "A covert source may still be corroborated by open reporting.".to_string(),
                zh: "隐蔽来源仍可能得到公开报道的佐证。".to_string(),
            },
        ],
        summary_points: vec!["Raw intercepts come first.".to_string()],
        critical_review_points: vec!["Open reporting can be noisy.".to_string()],
        vocabulary: vec![
            make_vocab("corroborate", "confirm or give support to"),
            make_vocab("tradecraft", "techniques used in espionage"),
            make_vocab("covert", "not openly acknowledged"),
            make_vocab("intercepts", "messages picked up in transit"),
            make_vocab("sift", "examine thoroughly"),
        ],
    }
}

pub fn make_saved_word(word: &str) -> SavedWord {
    SavedWord::from_vocab(&make_vocab(word, "fixture definition"))
}

/// Writes `article` where a directory source rooted at `root` will find it.
pub fn write_article(root: &Path, id: &str, article: &ArticleData) -> anyhow::Result<()> {
    let dir = root.join("data");
    std::fs::create_dir_all(&dir)?;
    let body = serde_json::to_vec_pretty(article)?;
    std::fs::write(dir.join(format!("{id}.data.json")), body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Instant;

    use duoread_application::ReaderContext;
    use duoread_core::ArticleId;
    use duoread_engine::{ArticleLoader, ArticleSource, DirSource};
    use duoread_storage::{LocalStore, Storage, WORD_BOOK_KEY};

    use super::*;

    fn terms(article: &ArticleData) -> Vec<&str> {
        article.vocabulary.iter().map(|v| v.term.as_str()).collect()
    }

    #[test]
    fn builds_settings() {
        let settings = make_settings("/srv/reading");
        assert_eq!(settings.data_root, "/srv/reading");
    }

    #[test]
    fn loaded_article_is_published_in_reading_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_article(dir.path(), "signals", &make_article())?;
        let source: Arc<dyn ArticleSource> = Arc::new(DirSource::new(dir.path()));
        let id = ArticleId::from_query("?article=signals");
        let loader = ArticleLoader::spawn(source, id.clone())?;

        let store = Rc::new(Storage::open_in_memory()?);
        let mut ctx = ReaderContext::new(make_settings(""), id, store, 1600);
        assert!(ctx.article.is_loading());
        ctx.publish_article(Instant::now(), loader.wait());

        let article = ctx.article.article().cloned().unwrap_or_default();
        assert_eq!(
            terms(&article),
            vec!["sift", "intercepts", "covert", "corroborate", "tradecraft"]
        );
        assert_eq!(ctx.estimated_reading_time, Some(1));
        assert!(!ctx.article.is_loading());
        Ok(())
    }

    #[test]
    fn invalid_query_loads_default_article() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_article(dir.path(), "intel-analysis", &make_article())?;
        let source: Arc<dyn ArticleSource> = Arc::new(DirSource::new(dir.path()));
        let id = ArticleId::from_query("article=../../etc");
        assert_eq!(id.as_str(), "intel-analysis");
        let article = ArticleLoader::spawn(source, id)?.wait()?;
        assert_eq!(article.title, "Reading the Signals");
        Ok(())
    }

    #[test]
    fn missing_article_surfaces_error_state() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source: Arc<dyn ArticleSource> = Arc::new(DirSource::new(dir.path()));
        let id = ArticleId::from_query("article=unit_test-1");
        let loader = ArticleLoader::spawn(source, id.clone())?;

        let store = Rc::new(Storage::open_in_memory()?);
        let mut ctx = ReaderContext::new(make_settings(""), id, store, 1600);
        ctx.publish_article(Instant::now(), loader.wait());
        assert!(!ctx.article.is_loading());
        assert!(ctx.article.article().is_none());
        assert_eq!(
            ctx.article.error(),
            Some("Could not load article data from data/unit_test-1.data.json")
        );
        Ok(())
    }

    #[test]
    fn word_book_persists_in_sqlite() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let db = dir.path().join("duoread.db");
        {
            let store = Rc::new(Storage::open(&db)?);
            let mut ctx = ReaderContext::new(make_settings(""), ArticleId::default(), store, 1600);
            let now = Instant::now();
            ctx.save_word(now, make_saved_word("covert"));
            ctx.save_word(now, make_saved_word("sift"));
            ctx.update_note(now, "covert", "opposite: overt");
            ctx.remove_word(now, "sift");
        }

        let storage = Storage::open(&db)?;
        let raw = storage.get_item(WORD_BOOK_KEY)?.unwrap_or_default();
        let saved: Vec<SavedWord> = serde_json::from_str(&raw)?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].word, "covert");
        assert_eq!(saved[0].notes, "opposite: overt");
        assert!(saved[0].timestamp > 0);
        Ok(())
    }
}
