use duoread_core::ArticleData;

/// Load state of the article shown by the reader.
#[derive(Debug, Clone)]
pub struct ArticleState {
    article: Option<ArticleData>,
    loading: bool,
    error: Option<String>,
}

impl Default for ArticleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleState {
    pub fn new() -> Self {
        Self {
            article: None,
            loading: true,
            error: None,
        }
    }

    /// Publishes the settled fetch. Loading ends whatever the outcome.
    pub fn settle(&mut self, result: anyhow::Result<ArticleData>) {
        match result {
            Ok(article) => {
                self.article = Some(article);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "article load failed");
                self.article = None;
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
    }

    pub fn article(&self) -> Option<&ArticleData> {
        self.article.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loaded(&self) -> bool {
        self.article.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
