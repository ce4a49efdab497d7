//! Crawler module tying fetching and extraction together
//!
//! Every site section is described by a [`Section`] value; one routine
//! fetches it, picks candidate elements, extracts records and stamps the
//! category. [`Crawler::scrape_all`] runs the standard set of sections and
//! deduplicates the combined output.

use std::collections::HashSet;
use std::num::NonZeroU32;

use scraper::Html;
use tracing::info;
use url::Url;

use crate::constants::{endpoints, GENRE_LIMIT, POPULAR_GENRES};
use crate::models::{AnimeDetails, AnimeRecord, Category};
use crate::parser::{
    extract_anime_info, links_to_nav, parse_anime_details, select_candidates, CandidateRule,
    HOME_BLOCK_CLASS, ITEM_CLASS, ITEM_OR_MOVIE_CLASS,
};
use crate::scraper::{HttpSource, PageSource, Scraper};

const LISTING_TAGS: &[&str] = &["div", "article", "li"];

/// One listing page family on the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Homepage,
    Updated,
    Added,
    Ongoing,
    Upcoming,
    /// Genre by display name, e.g. "Action"
    Genre(String),
    RecentlyUpdated,
    /// Recently added, by page number (1-based)
    RecentlyAdded(NonZeroU32),
}

impl Section {
    /// Absolute URL of the section page
    pub fn url(&self, base_url: &str) -> String {
        match self {
            Section::Homepage => endpoints::home(base_url),
            Section::Updated => endpoints::updated(base_url),
            Section::Added => endpoints::added(base_url),
            Section::Ongoing => endpoints::ongoing(base_url),
            Section::Upcoming => endpoints::upcoming(base_url),
            Section::Genre(name) => endpoints::genre(base_url, name),
            Section::RecentlyUpdated => endpoints::recently_updated(base_url),
            Section::RecentlyAdded(page) => endpoints::recently_added(base_url, page.get()),
        }
    }

    /// Category stamped on every record from this section
    pub fn category(&self) -> Category {
        match self {
            Section::Homepage => Category::Homepage,
            Section::Updated => Category::Updated,
            Section::Added => Category::Added,
            Section::Ongoing => Category::Ongoing,
            Section::Upcoming => Category::Upcoming,
            Section::Genre(name) => Category::genre(name),
            Section::RecentlyUpdated => Category::RecentlyUpdated,
            Section::RecentlyAdded(_) => Category::RecentlyAdded,
        }
    }

    /// How candidate elements are picked on this section's pages
    pub fn candidate_rule(&self) -> CandidateRule {
        match self {
            Section::Homepage => CandidateRule::Nested {
                block_tags: &["section", "div"],
                block_pattern: &HOME_BLOCK_CLASS,
                item_tags: LISTING_TAGS,
                item_pattern: &ITEM_CLASS,
            },
            Section::Updated | Section::Added | Section::Ongoing => CandidateRule::Heuristic {
                tags: LISTING_TAGS,
                class_pattern: &ITEM_CLASS,
            },
            Section::Upcoming | Section::Genre(_) | Section::RecentlyUpdated => {
                CandidateRule::Heuristic {
                    tags: LISTING_TAGS,
                    class_pattern: &ITEM_OR_MOVIE_CLASS,
                }
            }
            // one film-detail block per listing entry on this page family
            Section::RecentlyAdded(_) => CandidateRule::ExactClass {
                tag: "div",
                class: "film-detail",
            },
        }
    }

    /// Whether candidates linking to top-level navigation are skipped
    pub fn skips_nav_links(&self) -> bool {
        matches!(self, Section::Upcoming | Section::RecentlyUpdated)
    }

    fn label(&self) -> String {
        match self {
            Section::Genre(name) => format!("{} genre", name),
            Section::RecentlyAdded(page) => format!("recently added (page {})", page),
            other => other.category().to_string().replace('_', " "),
        }
    }

    fn stamp(&self, anime: &mut AnimeRecord) {
        anime.category = Some(self.category());
        match self {
            Section::Genre(name) => anime.genre = Some(name.clone()),
            Section::RecentlyAdded(page) => anime.page = Some(page.get()),
            _ => {}
        }
    }
}

/// Extract tagged records for `section` from an already parsed page
pub fn collect_records(document: &Html, section: &Section, base: &Url) -> Vec<AnimeRecord> {
    select_candidates(document, &section.candidate_rule())
        .into_iter()
        .filter(|element| !(section.skips_nav_links() && links_to_nav(*element)))
        .map(|element| extract_anime_info(element, base))
        .filter(AnimeRecord::has_title)
        .map(|mut anime| {
            section.stamp(&mut anime);
            anime
        })
        .collect()
}

/// Drop records without a usable (title, url) pair and every repeat of a
/// pair already seen. The first occurrence wins and order is preserved.
pub fn dedup_records(records: impl IntoIterator<Item = AnimeRecord>) -> Vec<AnimeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|anime| match anime.dedup_key() {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

/// Runs section scrapes against one site
pub struct Crawler<S = HttpSource> {
    scraper: Scraper<S>,
    base: Url,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(scraper: Scraper<S>, base: Url) -> Self {
        Self { scraper, base }
    }

    /// Underlying page fetcher
    pub fn scraper(&self) -> &Scraper<S> {
        &self.scraper
    }

    /// Scrape one section. A failed fetch yields no records.
    pub async fn scrape_section(&self, section: &Section) -> Vec<AnimeRecord> {
        let label = section.label();
        info!("Scraping {} anime...", label);

        let url = section.url(self.base.as_str());
        let Some(document) = self.scraper.fetch_document(&url).await else {
            return Vec::new();
        };
        let records = collect_records(&document, section, &self.base);

        info!("Found {} {} anime", records.len(), label);
        records
    }

    /// Scrape recently added pages 1..=max_pages and dedup across them
    pub async fn scrape_recently_added_pages(&self, max_pages: u32) -> Vec<AnimeRecord> {
        info!("Scraping recently added anime from {} pages...", max_pages);

        let mut all = Vec::new();
        for page in (1..=max_pages).filter_map(NonZeroU32::new) {
            if page > NonZeroU32::MIN {
                self.scraper.pause().await;
            }
            all.extend(self.scrape_section(&Section::RecentlyAdded(page)).await);
            info!("Completed page {}/{}", page, max_pages);
        }

        let unique = dedup_records(all);
        info!(
            "Total unique recently added anime found across {} pages: {}",
            max_pages,
            unique.len()
        );
        unique
    }

    /// Scrape extra information from one anime's detail page
    pub async fn scrape_anime_details(&self, url: &str) -> AnimeDetails {
        match self.scraper.fetch_page(url).await {
            Some(result) => parse_anime_details(&result.html, &self.base),
            None => AnimeDetails::default(),
        }
    }

    /// Scrape the standard sections and return the deduplicated records.
    ///
    /// Order: homepage, recently updated, recently added (page 1), ongoing,
    /// upcoming, then the first few records of each popular genre.
    pub async fn scrape_all(&self) -> Vec<AnimeRecord> {
        info!("Starting comprehensive anime scraping...");

        let mut all = Vec::new();
        for section in [
            Section::Homepage,
            Section::RecentlyUpdated,
            Section::RecentlyAdded(NonZeroU32::MIN),
            Section::Ongoing,
            Section::Upcoming,
        ] {
            all.extend(self.scrape_section(&section).await);
        }

        for (i, genre) in POPULAR_GENRES.iter().enumerate() {
            if i > 0 {
                self.scraper.pause().await;
            }
            let records = self.scrape_section(&Section::Genre(genre.to_string())).await;
            all.extend(records.into_iter().take(GENRE_LIMIT));
        }

        let unique = dedup_records(all);
        info!("Total unique anime found: {}", unique.len());
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{instant_config, StaticSource};

    const BASE: &str = "https://9animetv.to";

    fn base() -> Url {
        Url::parse(BASE).unwrap()
    }

    fn crawler(source: StaticSource) -> Crawler<StaticSource> {
        Crawler::new(Scraper::with_source(source, instant_config()), base())
    }

    fn record(title: &str, url: &str) -> AnimeRecord {
        AnimeRecord {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            ..AnimeRecord::default()
        }
    }

    /// A listing item in the site's usual card layout
    fn card(class: &str, title: &str, slug: &str) -> String {
        format!(
            r#"<div class="{class}">
                <div class="film-poster"><img data-src="/poster/{slug}.jpg" alt="{title}"></div>
                <div class="film-detail">
                    <h3 class="film-name"><a class="dynamic-name" href="/watch/{slug}" data-jname="{title} JP">{title}</a></h3>
                    <span class="fdi-type">TV</span>
                </div>
            </div>"#
        )
    }

    fn page_number(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn page(body: &str) -> String {
        format!("<html><body>{}</body></html>", body)
    }

    #[test]
    fn test_section_urls() {
        assert_eq!(Section::Homepage.url(BASE), "https://9animetv.to");
        assert_eq!(Section::Updated.url(BASE), "https://9animetv.to/updated");
        assert_eq!(
            Section::Genre("Sci-Fi & Fantasy".to_string()).url(BASE),
            "https://9animetv.to/genre/sci-fi-and-fantasy"
        );
        assert_eq!(
            Section::RecentlyAdded(page_number(2)).url(BASE),
            "https://9animetv.to/recently-added?page=2"
        );
    }

    #[test]
    fn test_section_categories() {
        assert_eq!(Section::RecentlyUpdated.category().to_string(), "recently_updated");
        assert_eq!(
            Section::Genre("Action".to_string()).category().to_string(),
            "genre_action"
        );
        assert!(Section::Upcoming.skips_nav_links());
        assert!(!Section::Ongoing.skips_nav_links());
    }

    #[test]
    fn test_collect_records_filters_titleless() {
        let html = page(&format!(
            r#"{}<div class="item"><span class="rating">7.7</span></div>"#,
            card("flw-item", "Blue Lock", "blue-lock-17")
        ));
        let document = Html::parse_document(&html);
        let records = collect_records(&document, &Section::Ongoing, &base());

        assert_eq!(records.len(), 1);
        let anime = &records[0];
        assert_eq!(anime.title.as_deref(), Some("Blue Lock"));
        assert_eq!(anime.category, Some(Category::Ongoing));
        assert_eq!(anime.anime_type.as_deref(), Some("TV"));
        assert!(anime.genre.is_none());
        assert!(anime.page.is_none());
    }

    #[test]
    fn test_collect_records_skips_nav_candidates() {
        let html = page(&format!(
            r#"<ul><li class="nav-item"><a href="/ongoing">Ongoing Series</a></li></ul>{}"#,
            card("anime-card", "Dandadan", "dandadan-19")
        ));
        let document = Html::parse_document(&html);

        let upcoming = collect_records(&document, &Section::Upcoming, &base());
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title.as_deref(), Some("Dandadan"));

        let ongoing = collect_records(&document, &Section::Ongoing, &base());
        assert_eq!(ongoing.len(), 2);
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let mut first = record("Bocchi the Rock", "https://9animetv.to/watch/bocchi-1");
        first.year = Some("2022".to_string());
        let mut second = record("BOCCHI THE ROCK", "https://9animetv.to/watch/bocchi-1");
        second.year = Some("2023".to_string());
        let other = record("Bocchi the Rock", "https://9animetv.to/watch/bocchi-movie-2");

        let unique = dedup_records(vec![first.clone(), second, other.clone()]);
        assert_eq!(unique, vec![first, other]);
    }

    #[test]
    fn test_dedup_drops_incomplete_records() {
        let no_url = AnimeRecord {
            title: Some("Made in Abyss".to_string()),
            ..AnimeRecord::default()
        };
        let short = record("Abc", "https://9animetv.to/watch/abc-1");
        let empty_url = record("Made in Abyss", "");
        assert!(dedup_records(vec![no_url, short, empty_url]).is_empty());
    }

    #[tokio::test]
    async fn test_scrape_section_stamps_genre() {
        let html = page(&card("movie-card", "Your Name", "your-name-10"));
        let source = StaticSource::new().page("https://9animetv.to/genre/romance", &html);
        let crawler = crawler(source);

        let records = crawler
            .scrape_section(&Section::Genre("Romance".to_string()))
            .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, Some(Category::genre("Romance")));
        assert_eq!(records[0].genre.as_deref(), Some("Romance"));
        assert_eq!(records[0].id.as_deref(), Some("your-name-10"));
    }

    #[tokio::test]
    async fn test_scrape_section_fetch_failure_is_empty() {
        let crawler = crawler(StaticSource::new());
        assert!(crawler.scrape_section(&Section::Ongoing).await.is_empty());
        assert_eq!(crawler.scraper().request_count(), 3);
    }

    #[tokio::test]
    async fn test_scrape_recently_added_pages() {
        let page1 = page(&format!(
            "{}{}",
            card("flw-item", "Kaiju No. 8", "kaiju-no-8-1"),
            card("flw-item", "Wind Breaker", "wind-breaker-2")
        ));
        let page2 = page(&format!(
            "{}{}",
            card("flw-item", "Wind Breaker", "wind-breaker-2"),
            card("flw-item", "Solo Leveling", "solo-leveling-3")
        ));
        let source = StaticSource::new()
            .page("https://9animetv.to/recently-added", &page1)
            .page("https://9animetv.to/recently-added?page=2", &page2);
        let crawler = crawler(source);

        let records = crawler.scrape_recently_added_pages(3).await;
        let titles: Vec<_> = records.iter().filter_map(|a| a.title.as_deref()).collect();
        assert_eq!(titles, vec!["Kaiju No. 8", "Wind Breaker", "Solo Leveling"]);
        assert_eq!(records[0].page, Some(1));
        assert_eq!(records[2].page, Some(2));
        assert!(records
            .iter()
            .all(|a| a.category == Some(Category::RecentlyAdded)));
    }

    #[tokio::test]
    async fn test_zero_pages_fetches_nothing() {
        let crawler = crawler(StaticSource::new());
        assert!(crawler.scrape_recently_added_pages(0).await.is_empty());
        assert_eq!(crawler.scraper().request_count(), 0);
    }

    #[test]
    fn test_recently_added_stamps_positive_page() {
        let html = page(&card("flw-item", "Oshi no Ko", "oshi-no-ko-3"));
        let document = Html::parse_document(&html);

        let first = collect_records(&document, &Section::RecentlyAdded(NonZeroU32::MIN), &base());
        assert_eq!(first[0].page, Some(1));
        let third = collect_records(&document, &Section::RecentlyAdded(page_number(3)), &base());
        assert_eq!(third[0].page, Some(3));
    }

    #[tokio::test]
    async fn test_scrape_anime_details() {
        let html = r#"<html><body><div class="synopsis">Space cowboys.</div></body></html>"#;
        let source = StaticSource::new().page("https://9animetv.to/cowboy-bebop-1", html);
        let crawler = crawler(source);

        let details = crawler
            .scrape_anime_details("https://9animetv.to/cowboy-bebop-1")
            .await;
        assert_eq!(details.description.as_deref(), Some("Space cowboys."));

        let missing = crawler
            .scrape_anime_details("https://9animetv.to/missing")
            .await;
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_all_merges_sections() {
        let homepage = page(&format!(
            r#"<section class="block_area trending">{}{}</section>"#,
            card("flw-item", "Attack on Titan", "attack-on-titan-112"),
            card("flw-item", "Demon Slayer", "demon-slayer-47")
        ));
        let ongoing = page(&card("flw-item", "Demon Slayer", "demon-slayer-47"));
        let action: String = (1..=12)
            .map(|n| card("flw-item", &format!("Action Show {}", n), &format!("action-show-{}", n)))
            .collect();

        let source = StaticSource::new()
            .page("https://9animetv.to/", &homepage)
            .page("https://9animetv.to/ongoing", &ongoing)
            .page("https://9animetv.to/genre/action", &page(&action));
        let crawler = crawler(source);

        let records = crawler.scrape_all().await;

        assert_eq!(records.len(), 2 + 10);
        assert_eq!(records[0].title.as_deref(), Some("Attack on Titan"));
        assert_eq!(records[0].category, Some(Category::Homepage));
        assert_eq!(records[1].category, Some(Category::Homepage));
        assert_eq!(records[2].title.as_deref(), Some("Action Show 1"));
        assert_eq!(records[11].title.as_deref(), Some("Action Show 10"));

        let keys: HashSet<_> = records.iter().filter_map(AnimeRecord::dedup_key).collect();
        assert_eq!(keys.len(), records.len());
    }
}
