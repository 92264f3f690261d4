//! `storyteller` command: stream one story to stdout, optionally saving it.

pub mod cli;
pub mod render;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use story_api::{StoryApiClient, StoryApiConfig, StoryApiError, StoryLength};
use story_library::{
    library_file, library_root, load_or_create_user_id, sibling_file, StoryLibrary,
    StoryLibraryError, StoryQuota, QUOTA_FILE, USER_ID_FILE,
};
use story_stream::{
    AssemblerConfig, Collaborators, ControllerError, EnvConfig, LibraryPersistence, QuotaGate,
    StaticIdentity, StoryTellingController, StoryView, StreamState,
};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

pub use cli::Cli;
use render::StoryPrinter;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot locate the story library: set --library, STORY_STREAM_LIBRARY_PATH or HOME")]
    NoLibraryPath,

    #[error("no saved story with id '{0}'")]
    UnknownStory(String),

    #[error(transparent)]
    Library(#[from] StoryLibraryError),

    #[error(transparent)]
    Api(#[from] StoryApiError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// How a run ended, mapped to the process exit code by `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Finished { saved_id: Option<String> },
    Failed(String),
    Cancelled,
    Listed,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Finished { .. } | Self::Listed => 0,
            Self::Failed(_) => 1,
            Self::Cancelled => 130,
        }
    }
}

/// Library path from the flag, then the environment, then `$HOME`.
pub fn resolve_library_path(
    flag: Option<&Path>,
    env: &EnvConfig,
    home: Option<&Path>,
) -> Result<PathBuf, CliError> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &env.library_path {
        return Ok(path.clone());
    }
    home.map(|home| library_file(&library_root(home)))
        .ok_or(CliError::NoLibraryPath)
}

pub async fn run(cli: Cli, env: EnvConfig) -> Result<Outcome, CliError> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let library_path = resolve_library_path(cli.library.as_deref(), &env, home.as_deref())?;

    if cli.list || cli.show.is_some() {
        let library = StoryLibrary::open_or_create(&library_path)?;
        let stdout = io::stdout();
        print_saved(&library, cli.show.as_deref(), &mut stdout.lock())?;
        return Ok(Outcome::Listed);
    }

    let now = OffsetDateTime::now_utc();
    let quota_path = sibling_file(&library_path, QUOTA_FILE);
    let mut quota = StoryQuota::load_or_new(&quota_path, now)?;
    quota.set_subscribed(cli.subscribed, now);
    quota.save(&quota_path)?;

    let user_id = match &cli.user_id {
        Some(user_id) => user_id.clone(),
        None => load_or_create_user_id(&sibling_file(&library_path, USER_ID_FILE))?,
    };
    let mut identity = StaticIdentity::default()
        .with_user_id(user_id)
        .with_language(cli.language.clone());
    if let Some(country) = &cli.country {
        identity = identity.with_country_code(country.clone());
    }

    let mut api_config = env.apply_to_api(StoryApiConfig::default());
    if let Some(base_url) = &cli.base_url {
        api_config = api_config.with_base_url(base_url.clone());
    }
    let mut assembler_config = env.apply_to_assembler(AssemblerConfig::default());
    if let Some(flush_ms) = cli.flush_ms {
        assembler_config = assembler_config.with_flush_interval(Duration::from_millis(flush_ms));
    }

    let library = StoryLibrary::open_or_create(&library_path)?;
    let client = Arc::new(StoryApiClient::new(api_config)?);
    let mut controller = StoryTellingController::new(
        client,
        assembler_config,
        Collaborators {
            identity: Arc::new(identity),
            persistence: Arc::new(LibraryPersistence::new(library)),
            entitlement: Arc::new(QuotaGate::new(quota, Some(quota_path))),
        },
    );

    let request = controller.prepare(cli.request_builder())?;
    controller.begin(request)?;
    info!("story requested");

    let stdout = io::stdout();
    let mut printer = StoryPrinter::new(stdout.lock());
    let view = follow(&mut controller, &mut printer).await?;

    match &view.state {
        StreamState::Finished if !view.cancelled => {
            printer.finish(&view)?;
            let saved_id = if cli.save {
                let id = controller.save()?;
                eprintln!("saved story {id}");
                Some(id)
            } else {
                None
            };
            Ok(Outcome::Finished { saved_id })
        }
        StreamState::Failed(reason) => {
            printer.finish(&view)?;
            Ok(Outcome::Failed(reason.to_string()))
        }
        _ => {
            printer.finish(&view)?;
            Ok(Outcome::Cancelled)
        }
    }
}

/// Print every published view until the session ends or Ctrl-C cancels it.
async fn follow<W: Write>(
    controller: &mut StoryTellingController,
    printer: &mut StoryPrinter<W>,
) -> Result<StoryView, CliError> {
    let mut updates = controller.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let view = updates.borrow_and_update().clone();
        printer.update(&view)?;
        if view.state.is_terminal() || view.cancelled {
            return Ok(view);
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(controller.view());
                }
            }
            _ = &mut ctrl_c => {
                debug!("interrupt received");
                controller.cancel();
                return Ok(controller.view());
            }
        }
    }
}

pub fn print_saved<W: Write>(
    library: &StoryLibrary,
    show: Option<&str>,
    out: &mut W,
) -> Result<(), CliError> {
    if let Some(id) = show {
        let story = library
            .get(id)
            .ok_or_else(|| CliError::UnknownStory(id.to_string()))?;
        let view = StoryView::finished_from_text(story.text.clone());
        writeln!(out, "{}", view.title)?;
        writeln!(out, "{}", "=".repeat(view.title.chars().count()))?;
        writeln!(out, "{}", view.body.trim_start())?;
        return Ok(());
    }

    for story in library.stories() {
        writeln!(
            out,
            "{}  {}  {}  ({}, {})",
            story.id,
            story.created_at,
            story.title,
            story.request.age,
            length_label(&story.request.duration)
        )?;
    }
    Ok(())
}

/// `short, 1-3 min` for known buckets; unknown ones are shown as stored.
fn length_label(duration: &str) -> String {
    match duration.parse::<StoryLength>() {
        Ok(length) => format!("{duration}, {} min", length.reading_minutes()),
        Err(_) => duration.to_string(),
    }
}
