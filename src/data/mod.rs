//! Core data models for portfolio content
//!
//! This module contains the document types served by the CMS (projects,
//! playlists, playground posts, the about page) and the clients used to
//! query them.

pub mod queries;
pub mod sanity;

pub use queries::{ContentError, ContentQueries};
pub use sanity::{BackendError, ContentBackend, QueryParams, SanityClient};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Decodes a field that GROQ may send as `null`, falling back to the default
///
/// `#[serde(default)]` only covers a missing key; projections return unset
/// fields as explicit `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// URL-safe document identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Reference to an uploaded image asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    /// Asset id, e.g. `image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg`
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// An image field on a document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SanityImage {
    #[serde(default)]
    pub asset: Option<AssetReference>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl SanityImage {
    /// Image pointing at the given asset reference
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            asset: Some(AssetReference {
                reference: reference.into(),
            }),
            alt: None,
        }
    }
}

/// A run of text inside a rich-text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub marks: Vec<String>,
}

/// Annotation referenced from span marks (links and the like)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub blank: Option<bool>,
}

/// One block of rich text
///
/// Non-text blocks (inline images) deserialize with no children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableTextBlock {
    #[serde(rename = "_type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(rename = "_key", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Span>,
    #[serde(rename = "markDefs", default, deserialize_with = "null_as_default")]
    pub mark_defs: Vec<MarkDef>,
}

impl PortableTextBlock {
    /// Concatenated text of every span in the block
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|span| span.text.as_str()).collect()
    }
}

/// A portfolio project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(rename = "_createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Revision id, changes on every edit
    #[serde(rename = "_rev", default)]
    pub rev: Option<String>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub slug: Option<Slug>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<SanityImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gallery: Vec<SanityImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<PortableTextBlock>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
}

/// A curated monthly playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(rename = "_createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "_rev", default)]
    pub rev: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    pub name: String,
    #[serde(default)]
    pub cover_art: Option<SanityImage>,
    pub published_at: Option<DateTime<Utc>>,
    pub slug: Option<Slug>,
    pub year: Option<i32>,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub featured_track: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Contact links on the about page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

/// The about page (a single document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: Vec<PortableTextBlock>,
    #[serde(default)]
    pub short_bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<SanityImage>,
    pub contact: Option<Contact>,
}

/// Kinds of playground post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaygroundKind {
    Image,
    Writing,
    Experiment,
}

/// An experimental post: an image, a piece of writing or an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playground {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PlaygroundKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<PortableTextBlock>,
    #[serde(default)]
    pub image: Option<SanityImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub slug: Option<Slug>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
}

/// A recently created project or playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentItem {
    #[serde(rename = "_id")]
    pub id: String,
    /// Document type, "project" or "playlist"
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
}

impl RecentItem {
    /// Projects carry a title, playlists a name
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }
}
