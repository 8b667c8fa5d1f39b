//! Episode module - identity of a resolved current location
//!
//! An episode spans the time a single resolved location stays active. Each
//! reminder is notified at most once per episode; a new episode key starts
//! over with an empty notified set.

use crate::Coordinate;
use std::fmt;

/// Opaque identity of a notification episode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeKey(String);

impl EpisodeKey {
    /// Create an episode key from an arbitrary identity string
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Episode key for a location reached by resolving `query`
    ///
    /// `sequence` is the resolution counter of the caller. Two resolutions of
    /// the same query therefore start two distinct episodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoping_domain::EpisodeKey;
    ///
    /// let a = EpisodeKey::for_query(" sw1a 1aa ", 1);
    /// let b = EpisodeKey::for_query("SW1A1AA", 1);
    /// assert_eq!(a, b);
    /// assert_ne!(a, EpisodeKey::for_query("SW1A1AA", 2));
    /// ```
    pub fn for_query(query: &str, sequence: u64) -> Self {
        Self(format!("q{}:{}", sequence, normalize_query(query)))
    }

    /// Episode key derived from the exact coordinate value
    pub fn for_coordinate(coordinate: &Coordinate) -> Self {
        Self(format!(
            "c:{:016x}:{:016x}",
            coordinate.latitude.to_bits(),
            coordinate.longitude.to_bits()
        ))
    }

    /// Borrow the key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a location query: uppercase with whitespace removed
pub fn normalize_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A resolved current location together with its episode identity
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    /// Where the user currently is
    pub coordinate: Coordinate,

    /// Episode this location belongs to
    pub episode: EpisodeKey,
}

impl ResolvedPoint {
    /// Create a resolved point with an explicit episode key
    pub fn new(coordinate: Coordinate, episode: EpisodeKey) -> Self {
        Self { coordinate, episode }
    }

    /// Create a resolved point keyed on the coordinate value itself
    pub fn at(coordinate: Coordinate) -> Self {
        let episode = EpisodeKey::for_coordinate(&coordinate);
        Self { coordinate, episode }
    }
}
