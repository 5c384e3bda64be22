//! Application wiring for folio
//!
//! Builds the query stack (backend, cache, retry policy, logger) from
//! configuration and runs CLI commands against it, producing JSON output.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::QueryCache;
use crate::cli::{CliError, Command, ImageArgs};
use crate::config::SiteConfig;
use crate::data::{ContentBackend, ContentError, ContentQueries, SanityClient, SanityImage};
use crate::dispatch::QueryDispatcher;
use crate::image::{ImageError, ImageOptions, ImageUrlBuilder, DEFAULT_SCALES};
use crate::logging::{QueryLogger, TracingLogger};

/// Errors that can occur while running a command
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Cli(#[from] CliError),

    /// A requested document does not exist
    #[error("No {kind} found with slug '{slug}'")]
    NotFound { kind: &'static str, slug: String },

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Everything the home page shows
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HomePage {
    featured_projects: Vec<crate::data::Project>,
    featured_playlists: Vec<crate::data::Playlist>,
    recent: Vec<crate::data::RecentItem>,
}

/// Main application struct holding the query stack
pub struct App {
    queries: ContentQueries,
    images: ImageUrlBuilder,
}

impl App {
    /// Creates an App talking to the configured Sanity project
    pub fn new(config: &SiteConfig) -> Self {
        let backend = Arc::new(SanityClient::new(config.sanity.clone()));
        Self::with_backend(config, backend, Arc::new(TracingLogger))
    }

    /// Creates an App with a custom backend and logger (for testing)
    pub fn with_backend(
        config: &SiteConfig,
        backend: Arc<dyn ContentBackend>,
        logger: Arc<dyn QueryLogger>,
    ) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache_ttl));
        let dispatcher = QueryDispatcher::new(backend, cache, config.retry.clone(), logger);
        Self {
            queries: ContentQueries::new(dispatcher),
            images: ImageUrlBuilder::new(
                config.sanity.project_id.clone(),
                config.sanity.dataset.clone(),
            ),
        }
    }

    pub fn queries(&self) -> &ContentQueries {
        &self.queries
    }

    /// Runs one command and returns its JSON output
    pub async fn run(&self, command: &Command) -> Result<Value, AppError> {
        let q = &self.queries;
        match command {
            Command::Projects { featured: true } => to_json(q.featured_projects().await?),
            Command::Projects { featured: false } => to_json(q.all_projects().await?),
            Command::Project { slug } => {
                let project = q.project_by_slug(slug).await?;
                to_json(found(project, "project", slug)?)
            }
            Command::Playlists { featured: true } => to_json(q.featured_playlists().await?),
            Command::Playlists { featured: false } => to_json(q.all_playlists().await?),
            Command::Playlist { slug } => {
                let playlist = q.playlist_by_slug(slug).await?;
                to_json(found(playlist, "playlist", slug)?)
            }
            Command::Playground { slug: None } => to_json(q.all_playground().await?),
            Command::Playground { slug: Some(slug) } => {
                let post = q.playground_by_slug(slug).await?;
                to_json(found(post, "playground post", slug)?)
            }
            Command::About => to_json(q.about().await?),
            Command::Recent => to_json(q.recent_content().await?),
            Command::Home => self.home().await,
            Command::Image(args) => self.image(args),
        }
    }

    /// Fetches the three home page queries concurrently
    async fn home(&self) -> Result<Value, AppError> {
        let q = &self.queries;
        let (featured_projects, featured_playlists, recent) = futures::try_join!(
            q.featured_projects(),
            q.featured_playlists(),
            q.recent_content()
        )?;

        to_json(HomePage {
            featured_projects,
            featured_playlists,
            recent,
        })
    }

    fn image(&self, args: &ImageArgs) -> Result<Value, AppError> {
        let size = args.size()?;
        let source = SanityImage::from_ref(args.asset_ref.clone());
        let options = ImageOptions {
            quality: args.quality,
            format: args.format,
            fit: args.fit,
        };

        if args.responsive {
            let base = size.resolve()?;
            let props = self
                .images
                .responsive_image(&source, base, &options, &DEFAULT_SCALES)?;
            return to_json(props);
        }

        let props = self.images.optimized_image(&source, &size, &options)?;
        to_json(props)
    }
}

fn found<T>(doc: Option<T>, kind: &'static str, slug: &str) -> Result<T, AppError> {
    doc.ok_or_else(|| AppError::NotFound {
        kind,
        slug: slug.to_string(),
    })
}

fn to_json<T: Serialize>(value: T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value)?)
}
