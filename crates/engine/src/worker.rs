use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Context as _;
use duoread_core::{ArticleData, ArticleId};

use crate::{ArticleSource, fetch_article};

/// Runs one article fetch on a background thread so the caller's event loop
/// keeps running while the document loads.
#[derive(Debug)]
pub struct ArticleLoader {
    id: ArticleId,
    rx: Option<Receiver<anyhow::Result<ArticleData>>>,
}

impl ArticleLoader {
    pub fn spawn(source: Arc<dyn ArticleSource>, id: ArticleId) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker_id = id.clone();
        std::thread::Builder::new()
            .name("article-loader".to_string())
            .spawn(move || {
                let result = fetch_article(source.as_ref(), &worker_id);
                // The receiver may already be gone if the reader quit early.
                let _ = tx.send(result);
            })
            .context("spawn article loader thread")?;
        Ok(Self { id, rx: Some(rx) })
    }

    pub fn id(&self) -> &ArticleId {
        &self.id
    }

    /// Returns the outcome exactly once, when the fetch has settled.
    pub fn poll(&mut self) -> Option<anyhow::Result<ArticleData>> {
        let rx = self.rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!(
                "Could not load article data from {}",
                self.id.resource_path()
            )),
        };
        self.rx = None;
        Some(outcome)
    }

    /// Blocks until the fetch settles.
    pub fn wait(mut self) -> anyhow::Result<ArticleData> {
        let rx = self.rx.take().context("article loader already settled")?;
        rx.recv().map_err(|_| {
            anyhow::anyhow!(
                "Could not load article data from {}",
                self.id.resource_path()
            )
        })?
    }
}
