//! Cache module for content query results
//!
//! This module provides an in-memory cache that keeps query results for a
//! configurable TTL (time-to-live), keyed by typed `CacheKey`s. An expired entry
//! behaves exactly like a missing one.

mod key;
mod manager;

pub use key::{CacheKey, Collection};
pub use manager::{CachedData, Clock, ManualClock, QueryCache, SystemClock, DEFAULT_TTL};
