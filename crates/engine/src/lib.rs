//! Article loading: resolve, fetch, decode and reorder article documents.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use duoread_core::{ArticleData, ArticleId};

mod worker;

pub use worker::ArticleLoader;

/// Where article documents come from. `path` is the relative resource path,
/// e.g. `data/intel-analysis.data.json`.
pub trait ArticleSource: Send + Sync {
    fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>>;
}

/// Serves resource paths from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArticleSource for DirSource {
    fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full = self.root.join(path);
        if !full.is_file() {
            anyhow::bail!("{} not found", full.display());
        }
        std::fs::read(&full).with_context(|| format!("read {}", full.display()))
    }
}

/// Fetches the article document for `id` and orders its vocabulary by first
/// appearance. The error's top-level message is suitable for display.
pub fn fetch_article(source: &dyn ArticleSource, id: &ArticleId) -> anyhow::Result<ArticleData> {
    let path = id.resource_path();
    let body = source
        .fetch(&path)
        .with_context(|| format!("Could not load article data from {path}"))?;
    let mut article: ArticleData = serde_json::from_slice(&body)
        .with_context(|| format!("Could not parse article data from {path}"))?;
    article.reorder_vocabulary();
    tracing::info!(
        article = %id,
        paragraphs = article.paragraphs.len(),
        vocabulary = article.vocabulary.len(),
        "article loaded"
    );
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "title": "Signals",
        "subtitle": "A short brief",
        "source": "Desk",
        "audioUrl": "audio/signals.mp3",
        "paragraphs": [
            {"en": "Analysts gather signals.", "zh": "分析师收集信号。"},
            {"en": "A Briefing follows.", "zh": "随后是简报。"}
        ],
        "summaryPoints": ["gather", "brief"],
        "criticalReviewPoints": [],
        "vocabulary": [
            {"term": "briefing", "etymology": "", "definition": "a meeting", "roleInText": "", "originalSentence": "", "collocations": []},
            {"term": "absent", "etymology": "", "definition": "", "roleInText": "", "originalSentence": "", "collocations": []},
            {"term": "analysts", "etymology": "", "definition": "", "roleInText": "", "originalSentence": "", "collocations": ["senior analysts"]}
        ]
    }"#;

    fn write_article(root: &Path, name: &str, body: &str) -> anyhow::Result<()> {
        let dir = root.join("data");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("{name}.data.json")), body)?;
        Ok(())
    }

    #[test]
    fn fetch_reorders_vocabulary() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_article(dir.path(), "signals", SAMPLE)?;
        let source = DirSource::new(dir.path());

        let article = fetch_article(&source, &ArticleId::resolve(Some("signals")))?;
        assert_eq!(article.title, "Signals");
        assert_eq!(article.audio_url, "audio/signals.mp3");
        let terms: Vec<_> = article.vocabulary.iter().map(|v| v.term.as_str()).collect();
        assert_eq!(terms, vec!["analysts", "briefing", "absent"]);
        Ok(())
    }

    #[test]
    fn missing_article_reports_resource_path() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = DirSource::new(dir.path());
        let err = fetch_article(&source, &ArticleId::resolve(Some("nowhere"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not load article data from data/nowhere.data.json"
        );
        Ok(())
    }

    #[test]
    fn malformed_article_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_article(dir.path(), "broken", "{ not json")?;
        let source = DirSource::new(dir.path());
        let err = fetch_article(&source, &ArticleId::resolve(Some("broken"))).unwrap_err();
        assert!(err.to_string().contains("data/broken.data.json"));
        Ok(())
    }
}
