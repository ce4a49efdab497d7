//! Data models for the 9anime scraper
//!
//! An [`AnimeRecord`] is a bag of optional fields: every lookup during
//! extraction may fail independently, and serialization only emits the
//! fields that were found.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Listing a record was scraped from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Homepage,
    Updated,
    Added,
    Ongoing,
    Upcoming,
    /// Lowercased genre display name
    Genre(String),
    RecentlyUpdated,
    RecentlyAdded,
}

impl Category {
    /// Category for a genre listing
    pub fn genre(name: &str) -> Self {
        Category::Genre(name.to_lowercase())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Homepage => f.write_str("homepage"),
            Category::Updated => f.write_str("updated"),
            Category::Added => f.write_str("added"),
            Category::Ongoing => f.write_str("ongoing"),
            Category::Upcoming => f.write_str("upcoming"),
            Category::Genre(name) => write!(f, "genre_{}", name),
            Category::RecentlyUpdated => f.write_str("recently_updated"),
            Category::RecentlyAdded => f.write_str("recently_added"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "homepage" => Category::Homepage,
            "updated" => Category::Updated,
            "added" => Category::Added,
            "ongoing" => Category::Ongoing,
            "upcoming" => Category::Upcoming,
            "recently_updated" => Category::RecentlyUpdated,
            "recently_added" => Category::RecentlyAdded,
            other => match other.strip_prefix("genre_") {
                Some(name) => Category::Genre(name.to_string()),
                None => return Err(format!("unknown category: {}", other)),
            },
        })
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One anime entry extracted from a listing element
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimeRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absolute URL of the watch page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Final path segment of `url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// From the link's `data-jname` attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub japanese_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub anime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Genre display name, set only for genre listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Listing page number, set only for recently added
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl AnimeRecord {
    /// Whether the record carries a usable title (present and longer than 3 chars)
    pub fn has_title(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| t.chars().count() > 3)
    }

    /// Dedup key: (lowercased title, url). `None` if either part is missing
    /// or the title is too short to be accepted.
    pub fn dedup_key(&self) -> Option<(String, String)> {
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        if !self.has_title() {
            return None;
        }
        let title = self.title.as_deref()?.to_lowercase();
        Some((title, url.to_string()))
    }

    /// Present fields as (column name, cell text), in declaration order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("title", &self.title),
            ("url", &self.url),
            ("id", &self.id),
            ("japanese_name", &self.japanese_name),
            ("image_url", &self.image_url),
            ("alt_text", &self.alt_text),
            ("episodes", &self.episodes),
            ("status", &self.status),
            ("year", &self.year),
            ("type", &self.anime_type),
            ("rating", &self.rating),
        ];

        let mut fields: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name, v.clone())))
            .collect();

        if let Some(genres) = &self.genres {
            fields.push(("genres", genres.join(", ")));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(category) = &self.category {
            fields.push(("category", category.to_string()));
        }
        if let Some(genre) = &self.genre {
            fields.push(("genre", genre.clone()));
        }
        if let Some(page) = self.page {
            fields.push(("page", page.to_string()));
        }

        fields
    }
}

/// Episode entry listed on a detail page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRef {
    pub number: String,
    pub title: String,
    pub url: String,
}

/// Extra information scraped from an anime's detail page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimeDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Label/value pairs from info blocks, labels lowercased
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub info: IndexMap<String, String>,
    /// Total number of episode entries on the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<usize>,
    /// First ten episode entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<EpisodeRef>,
}

impl AnimeDetails {
    pub fn is_empty(&self) -> bool {
        self == &AnimeDetails::default()
    }
}
