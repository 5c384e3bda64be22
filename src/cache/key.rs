//! Typed cache keys for content queries

use std::fmt;

/// Content collections stored in the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Project,
    Playlist,
    Playground,
    About,
}

impl Collection {
    /// Document `_type` name used by the CMS
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Project => "project",
            Collection::Playlist => "playlist",
            Collection::Playground => "playground",
            Collection::About => "about",
        }
    }

    /// Plural form used in list keys (e.g. "all-projects")
    pub fn plural(&self) -> &'static str {
        match self {
            Collection::Project => "projects",
            Collection::Playlist => "playlists",
            Collection::Playground => "playground",
            Collection::About => "about",
        }
    }
}

/// Identifies one cached query result
///
/// Keys are compared structurally, so `Document { Project, "all" }` can never
/// collide with `All(Project)` even though both mention projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Every document of a collection
    All(Collection),
    /// Documents of a collection flagged as featured
    Featured(Collection),
    /// One document looked up by slug
    Document { collection: Collection, slug: String },
    /// Newest documents across collections
    Recent,
    /// A collection holding exactly one document
    Singleton(Collection),
}

impl CacheKey {
    /// Shorthand for a by-slug key
    pub fn document(collection: Collection, slug: impl Into<String>) -> Self {
        CacheKey::Document {
            collection,
            slug: slug.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::All(c) => write!(f, "all-{}", c.plural()),
            CacheKey::Featured(c) => write!(f, "featured-{}", c.plural()),
            CacheKey::Document { collection, slug } => {
                write!(f, "{}-{}", collection.as_str(), slug)
            }
            CacheKey::Recent => f.write_str("recent-content"),
            CacheKey::Singleton(c) => f.write_str(c.as_str()),
        }
    }
}
