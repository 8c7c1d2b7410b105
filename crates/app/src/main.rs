use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use directories::ProjectDirs;
use duoread_application::ReaderContext;
use duoread_core::Settings;
use duoread_engine::{ArticleLoader, DirSource};
use duoread_storage::{LocalStore, Storage};
use duoread_ui::Ui;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATA_ROOT_ENV: &str = "DUOREAD_DATA_ROOT";

fn main() {
    if let Err(err) = run() {
        tracing::error!(error = %format!("{err:#}"), "duoread failed");
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "duoread", "duoread").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    init_tracing(config_dir)?;

    let db_path = config_dir.join("duoread.db");
    let storage = Storage::open(&db_path)?;
    let mut settings = storage.load_settings()?;

    let data_root = data_root(&mut settings, std::env::var_os(DATA_ROOT_ENV))?;
    storage.save_settings(&settings)?;

    let query = std::env::args().nth(1);
    let article_id = settings.resolve_article(query.as_deref());
    let source = DirSource::new(data_root);
    info!(
        article = %article_id,
        data_root = %source.root().display(),
        "starting reader"
    );

    let loader = ArticleLoader::spawn(Arc::new(source), article_id.clone())?;

    let store: Rc<dyn LocalStore> = Rc::new(storage);
    let ctx = ReaderContext::new(
        settings,
        article_id,
        store,
        duoread_ui::viewport_width_px(),
    );

    let mut ui = Ui::new(ctx, loader, duoread_ui::prefers_dark_from_env());
    ui.run()?;
    info!("reader closed");
    Ok(())
}

/// `DUOREAD_DATA_ROOT`, then the stored setting, then the working directory.
/// The working directory is remembered as the data root on first run; the
/// environment override is never stored.
fn data_root(settings: &mut Settings, env_root: Option<OsString>) -> anyhow::Result<PathBuf> {
    if let Some(root) = env_root.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    if settings.data_root.is_empty() {
        let cwd = std::env::current_dir().context("get cwd")?;
        settings.data_root = cwd.to_string_lossy().to_string();
    }
    Ok(PathBuf::from(&settings.data_root))
}

/// The terminal belongs to the reader, so logs go to a file next to the database.
fn init_tracing(config_dir: &Path) -> anyhow::Result<()> {
    let log_path = config_dir.join("duoread.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_is_not_stored() -> anyhow::Result<()> {
        let mut settings = Settings::default();
        let root = data_root(&mut settings, Some(OsString::from("/tmp/articles")))?;
        assert_eq!(root, PathBuf::from("/tmp/articles"));
        assert_eq!(settings.data_root, "");
        Ok(())
    }

    #[test]
    fn stored_root_wins_over_cwd() -> anyhow::Result<()> {
        let mut settings = Settings {
            data_root: "/srv/reading".to_string(),
            ..Settings::default()
        };
        let root = data_root(&mut settings, Some(OsString::new()))?;
        assert_eq!(root, PathBuf::from("/srv/reading"));
        Ok(())
    }

    #[test]
    fn first_run_remembers_cwd() -> anyhow::Result<()> {
        let mut settings = Settings::default();
        let root = data_root(&mut settings, None)?;
        assert_eq!(root, std::env::current_dir()?);
        assert_eq!(settings.data_root, root.to_string_lossy());
        Ok(())
    }
}
