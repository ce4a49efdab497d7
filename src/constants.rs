//! Constants module for the 9anime scraper
//!
//! Contains endpoint URL builders and the fixed word lists used by the
//! extraction heuristics.

/// URL builder functions for all listing endpoints
pub mod endpoints {
    fn join(base_url: &str, path: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    /// Home page URL
    pub fn home(base_url: &str) -> String {
        base_url.to_string()
    }

    /// "Updated" listing URL
    pub fn updated(base_url: &str) -> String {
        join(base_url, "/updated")
    }

    /// "Added" listing URL
    pub fn added(base_url: &str) -> String {
        join(base_url, "/added")
    }

    /// Ongoing anime listing URL
    pub fn ongoing(base_url: &str) -> String {
        join(base_url, "/ongoing")
    }

    /// Upcoming anime listing URL
    pub fn upcoming(base_url: &str) -> String {
        join(base_url, "/upcoming")
    }

    /// Genre listing URL, e.g. "Sci-Fi & Fantasy" -> `/genre/sci-fi-and-fantasy`
    pub fn genre(base_url: &str, genre: &str) -> String {
        join(base_url, &format!("/genre/{}", super::genre_slug(genre)))
    }

    /// Recently updated listing URL
    pub fn recently_updated(base_url: &str) -> String {
        join(base_url, "/recently-updated")
    }

    /// Recently added listing URL; page 1 uses the bare path
    pub fn recently_added(base_url: &str, page: u32) -> String {
        if page <= 1 {
            join(base_url, "/recently-added")
        } else {
            join(base_url, &format!("/recently-added?page={}", page))
        }
    }
}

/// Convert a genre display name into its URL path segment
pub fn genre_slug(genre: &str) -> String {
    genre.to_lowercase().replace(' ', "-").replace('&', "and")
}

/// Titles that are navigation labels rather than anime names
pub const NAV_WORDS: &[&str] = &["updated", "added", "ongoing", "upcoming", "home"];

/// Genres scraped by a full run
pub const POPULAR_GENRES: &[&str] = &["Action", "Comedy", "Drama", "Romance", "Fantasy"];

/// Records kept per genre in a full run
pub const GENRE_LIMIT: usize = 10;

/// Path marker every accepted anime link carries
pub const WATCH_MARKER: &str = "/watch/";
