//! Typed content queries
//!
//! One method per query the site makes. Each has a fixed GROQ query and a
//! fixed cache key, and decodes the raw JSON result into the document types
//! from [`crate::data`].

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use super::sanity::{BackendError, QueryParams};
use super::{About, Playground, Playlist, Project, RecentItem};
use crate::cache::{CacheKey, Collection};
use crate::dispatch::QueryDispatcher;

const PROJECT_FIELDS: &str = "_id, _type, _createdAt, _updatedAt, _rev, title, featured, year, \
     description, tags, slug, category, image, gallery, content, externalUrl, githubUrl";

const PLAYLIST_FIELDS: &str = "_id, _type, _createdAt, _updatedAt, _rev, featured, name, \
     coverArt, publishedAt, slug, year, spotifyUrl, month, featuredTrack, description";

const PLAYGROUND_FIELDS: &str = "_id, _type, _createdAt, _updatedAt, _rev, title, type, \
     description, content, image, tags, publishedAt, slug, featured, externalUrl, githubUrl";

const ABOUT_FIELDS: &str = "_id, _type, title, bio, shortBio, profileImage, contact";

/// Number of documents returned by the recent-content query
pub const RECENT_CONTENT_LIMIT: usize = 6;

/// Errors that can occur when running a typed query
#[derive(Debug, Error)]
pub enum ContentError {
    /// The backend could not answer the query
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend answered with JSON of an unexpected shape
    #[error("Failed to decode content: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Typed access to the site's content
#[derive(Clone)]
pub struct ContentQueries {
    dispatcher: QueryDispatcher,
}

impl ContentQueries {
    pub fn new(dispatcher: QueryDispatcher) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher behind these queries
    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    /// All projects, newest first
    pub async fn all_projects(&self) -> Result<Vec<Project>, ContentError> {
        let query = format!(
            r#"*[_type == "project"] | order(_createdAt desc) {{ {} }}"#,
            PROJECT_FIELDS
        );
        self.fetch_list(CacheKey::All(Collection::Project), &query).await
    }

    /// Featured projects, newest first
    pub async fn featured_projects(&self) -> Result<Vec<Project>, ContentError> {
        let query = format!(
            r#"*[_type == "project" && featured == true] | order(_createdAt desc) {{ {} }}"#,
            PROJECT_FIELDS
        );
        self.fetch_list(CacheKey::Featured(Collection::Project), &query)
            .await
    }

    pub async fn project_by_slug(&self, slug: &str) -> Result<Option<Project>, ContentError> {
        self.fetch_by_slug(Collection::Project, PROJECT_FIELDS, slug)
            .await
    }

    /// All playlists, most recently published first
    pub async fn all_playlists(&self) -> Result<Vec<Playlist>, ContentError> {
        let query = format!(
            r#"*[_type == "playlist"] | order(publishedAt desc) {{ {} }}"#,
            PLAYLIST_FIELDS
        );
        self.fetch_list(CacheKey::All(Collection::Playlist), &query)
            .await
    }

    pub async fn featured_playlists(&self) -> Result<Vec<Playlist>, ContentError> {
        let query = format!(
            r#"*[_type == "playlist" && featured == true] | order(publishedAt desc) {{ {} }}"#,
            PLAYLIST_FIELDS
        );
        self.fetch_list(CacheKey::Featured(Collection::Playlist), &query)
            .await
    }

    pub async fn playlist_by_slug(&self, slug: &str) -> Result<Option<Playlist>, ContentError> {
        self.fetch_by_slug(Collection::Playlist, PLAYLIST_FIELDS, slug)
            .await
    }

    /// All playground posts, most recently published first
    pub async fn all_playground(&self) -> Result<Vec<Playground>, ContentError> {
        let query = format!(
            r#"*[_type == "playground"] | order(publishedAt desc) {{ {} }}"#,
            PLAYGROUND_FIELDS
        );
        self.fetch_list(CacheKey::All(Collection::Playground), &query)
            .await
    }

    pub async fn playground_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Playground>, ContentError> {
        self.fetch_by_slug(Collection::Playground, PLAYGROUND_FIELDS, slug)
            .await
    }

    /// The about page, if one has been published
    pub async fn about(&self) -> Result<Option<About>, ContentError> {
        let query = format!(r#"*[_type == "about"][0] {{ {} }}"#, ABOUT_FIELDS);
        let value = self
            .dispatcher
            .dispatch(
                Some(&CacheKey::Singleton(Collection::About)),
                &query,
                &QueryParams::new(),
            )
            .await?;
        decode_optional(value)
    }

    /// The newest projects and playlists, mixed
    pub async fn recent_content(&self) -> Result<Vec<RecentItem>, ContentError> {
        let query = format!(
            r#"*[_type in ["project", "playlist"]] | order(_createdAt desc)[0...{}] {{ _id, _type, _createdAt, title, name, slug, featured }}"#,
            RECENT_CONTENT_LIMIT
        );
        self.fetch_list(CacheKey::Recent, &query).await
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        query: &str,
    ) -> Result<Vec<T>, ContentError> {
        let value = self
            .dispatcher
            .dispatch(Some(&key), query, &QueryParams::new())
            .await?;
        // A dataset without any documents of the type answers null
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn fetch_by_slug<T: DeserializeOwned>(
        &self,
        collection: Collection,
        fields: &str,
        slug: &str,
    ) -> Result<Option<T>, ContentError> {
        let query = format!(
            r#"*[_type == "{}" && slug.current == $slug][0] {{ {} }}"#,
            collection.as_str(),
            fields
        );
        let mut params = QueryParams::new();
        params.insert("slug".to_string(), json!(slug));

        let key = CacheKey::document(collection, slug);
        let value = self.dispatcher.dispatch(Some(&key), &query, &params).await?;
        decode_optional(value)
    }
}

fn decode_optional<T: DeserializeOwned>(value: Value) -> Result<Option<T>, ContentError> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}
