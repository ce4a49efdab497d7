//! Parser module for extracting structured data from HTML
//!
//! Listing markup on the site is inconsistent, so every field is found by a
//! short cascade of lookups. A lookup either yields a value or is skipped;
//! one field failing never prevents the others from being filled in.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use crate::constants::{NAV_WORDS, WATCH_MARKER};
use crate::models::{AnimeDetails, AnimeRecord, EpisodeRef};

static META_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(episode|status|year|genre|rating|ep|type)").unwrap());
static RATING_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(rating|score|star)").unwrap());
static GENRE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(genre|tag)").unwrap());
static DESC_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(desc|summary|synopsis)").unwrap());
static YEAR_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}").unwrap());
static NAV_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(home|updated|added|ongoing|upcoming)$").unwrap());

/// Class pattern for listing items on most section pages
pub static ITEM_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"anime|item|card|show").unwrap());
/// Item pattern for sections that also list movies
pub static ITEM_OR_MOVIE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"anime|item|card|show|movie").unwrap());
/// Class pattern for homepage blocks that wrap listing items
pub static HOME_BLOCK_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"anime|show|movie|trending|popular|latest").unwrap());

static DETAIL_DESC_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"description|summary|synopsis").unwrap());
static DETAIL_INFO_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"info|details|metadata").unwrap());
static LABEL_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"label").unwrap());
static VALUE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"value").unwrap());
static EPISODE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"episode").unwrap());
static EPISODE_NUMBER_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"number|ep").unwrap());
static TITLE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"title").unwrap());

/// Episodes kept from a detail page
const DETAIL_EPISODE_LIMIT: usize = 10;

/// Extract slug from a URL
///
/// Takes a URL like "https://9animetv.to/watch/one-piece-100"
/// and returns "one-piece-100"
fn extract_slug_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Descendant elements in document order, excluding `element` itself
fn descendants<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Every element of the document, root included
fn all_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.root_element().descendants().filter_map(ElementRef::wrap)
}

fn is_tag(element: &ElementRef, tags: &[&str]) -> bool {
    tags.contains(&element.value().name())
}

fn has_class(element: &ElementRef, name: &str) -> bool {
    element.value().classes().any(|c| c == name)
}

/// Any single class token matches the pattern
fn class_matches(element: &ElementRef, pattern: &Regex) -> bool {
    element.value().classes().any(|c| pattern.is_match(c))
}

fn class_list(element: &ElementRef) -> Vec<String> {
    element.value().classes().map(str::to_lowercase).collect()
}

/// Text content with each text node trimmed and joined without separator
fn text_of(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

fn find_tagged<'a>(element: ElementRef<'a>, tags: &[&str], pattern: &Regex) -> Option<ElementRef<'a>> {
    descendants(element).find(|d| is_tag(d, tags) && class_matches(d, pattern))
}

/// A single cascade step: locate a sub-element or give up
type Lookup = for<'a> fn(ElementRef<'a>) -> Option<ElementRef<'a>>;

/// Run lookups in order and keep the first hit
fn first_hit<'a>(element: ElementRef<'a>, lookups: &[Lookup]) -> Option<ElementRef<'a>> {
    lookups.iter().find_map(|lookup| lookup(element))
}

fn dynamic_name(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| has_class(d, "dynamic-name"))
}

fn film_name(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| has_class(d, "film-name"))
}

fn heading_like(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| {
        is_tag(d, &["h3", "h2", "a"]) || has_class(d, "title") || has_class(d, "name")
    })
}

const TITLE_LOOKUPS: &[Lookup] = &[dynamic_name, film_name, heading_like];

fn anchor_dynamic_name(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| is_tag(d, &["a"]) && has_class(d, "dynamic-name"))
}

fn anchor_to_watch(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| {
        is_tag(d, &["a"]) && d.value().attr("href").is_some_and(|h| h.contains(WATCH_MARKER))
    })
}

fn anchor_poster(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| is_tag(d, &["a"]) && has_class(d, "film-poster-ahref"))
}

fn any_anchor(element: ElementRef) -> Option<ElementRef> {
    descendants(element).find(|d| is_tag(d, &["a"]))
}

const LINK_LOOKUPS: &[Lookup] = &[anchor_dynamic_name, anchor_to_watch, anchor_poster, any_anchor];

/// Whether `title` could be an anime name rather than a navigation label
pub fn is_acceptable_title(title: &str) -> bool {
    title.chars().count() > 3 && !NAV_WORDS.contains(&title.to_lowercase().as_str())
}

/// Resolve `href` against the base, keeping only same-origin results
fn resolve_same_origin(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(url) if url.origin() == base.origin() => Some(url),
        Ok(url) => {
            tracing::debug!("Skipping off-site link {}", url);
            None
        }
        Err(e) => {
            tracing::warn!("Could not resolve link '{}': {}", href, e);
            None
        }
    }
}

fn extract_title(element: ElementRef, anime: &mut AnimeRecord) {
    let Some(title_element) = first_hit(element, TITLE_LOOKUPS) else {
        return;
    };
    let title = text_of(title_element);
    if is_acceptable_title(&title) {
        anime.title = Some(title);
    }
}

fn extract_link(element: ElementRef, base: &Url, anime: &mut AnimeRecord) {
    let Some(link) = first_hit(element, LINK_LOOKUPS) else {
        return;
    };
    let Some(href) = link.value().attr("href") else {
        return;
    };
    if !href.contains(WATCH_MARKER) {
        return;
    }
    let Some(url) = resolve_same_origin(base, href) else {
        return;
    };

    anime.id = Some(extract_slug_from_url(url.path()));
    anime.url = Some(url.to_string());
    if let Some(jname) = link.value().attr("data-jname") {
        anime.japanese_name = Some(jname.to_string());
    }
}

fn extract_image(element: ElementRef, base: &Url, anime: &mut AnimeRecord) {
    // the element itself, then its parent, then its grandparent
    let image = std::iter::successors(Some(element), |el| el.parent().and_then(ElementRef::wrap))
        .take(3)
        .find_map(|scope| descendants(scope).find(|d| is_tag(d, &["img"])));

    let Some(image) = image else {
        return;
    };

    let src = image
        .value()
        .attr("src")
        .or_else(|| image.value().attr("data-src"));
    if let Some(src) = src {
        match base.join(src) {
            Ok(url) => anime.image_url = Some(url.to_string()),
            Err(e) => tracing::warn!("Could not resolve image '{}': {}", src, e),
        }
    }
    anime.alt_text = Some(image.value().attr("alt").unwrap_or_default().to_string());
}

/// Secondary metadata a tag may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Episodes,
    Status,
    Year,
    Type,
}

/// Classify one metadata tag by its class tokens and text shape.
///
/// Rules are tried in a fixed order and the first match decides.
fn classify_meta(classes: &[String], text: &str) -> Option<MetaField> {
    let joined = classes.join(" ");
    if classes.iter().any(|c| c.contains("ep")) || text.contains("Ep") {
        Some(MetaField::Episodes)
    } else if joined.contains("status") {
        Some(MetaField::Status)
    } else if YEAR_TEXT.is_match(text) {
        Some(MetaField::Year)
    } else if joined.contains("type") {
        Some(MetaField::Type)
    } else {
        None
    }
}

fn extract_metadata(element: ElementRef, anime: &mut AnimeRecord) {
    let tags = descendants(element)
        .filter(|d| is_tag(d, &["span", "div", "p"]) && class_matches(d, &META_CLASS));

    for tag in tags {
        let text = text_of(tag);
        let slot = match classify_meta(&class_list(&tag), &text) {
            Some(MetaField::Episodes) => &mut anime.episodes,
            Some(MetaField::Status) => &mut anime.status,
            Some(MetaField::Year) => &mut anime.year,
            Some(MetaField::Type) => &mut anime.anime_type,
            None => continue,
        };
        // outermost match wins; nested tags repeat their ancestor's text
        if slot.is_none() {
            *slot = Some(text);
        }
    }
}

fn extract_rating(element: ElementRef, anime: &mut AnimeRecord) {
    if let Some(rating) = descendants(element).find(|d| class_matches(d, &RATING_CLASS)) {
        anime.rating = Some(text_of(rating));
    }
}

fn extract_genres(element: ElementRef, anime: &mut AnimeRecord) {
    let genres: Vec<String> = descendants(element)
        .filter(|d| class_matches(d, &GENRE_CLASS))
        .flat_map(|d| {
            let text = text_of(d);
            if text.contains(',') {
                text.split(',').map(|g| g.trim().to_string()).collect()
            } else {
                vec![text]
            }
        })
        .filter(|g| !g.is_empty())
        .collect();

    if !genres.is_empty() {
        anime.genres = Some(genres);
    }
}

fn extract_description(element: ElementRef, anime: &mut AnimeRecord) {
    if let Some(desc) = find_tagged(element, &["p", "div"], &DESC_CLASS) {
        anime.description = Some(text_of(desc));
    }
}

/// Extract an anime record from a single candidate element
///
/// Any field may be missing from the result. A record without a `title`
/// means the element did not look like an anime entry.
pub fn extract_anime_info(element: ElementRef, base: &Url) -> AnimeRecord {
    let mut anime = AnimeRecord::default();

    extract_title(element, &mut anime);
    extract_link(element, base, &mut anime);
    extract_image(element, base, &mut anime);
    extract_metadata(element, &mut anime);
    extract_rating(element, &mut anime);
    extract_genres(element, &mut anime);
    extract_description(element, &mut anime);

    anime
}

/// How candidate elements are picked out of a listing page
#[derive(Debug, Clone, Copy)]
pub enum CandidateRule {
    /// Elements of the given tags whose class matches the pattern
    Heuristic {
        tags: &'static [&'static str],
        class_pattern: &'static Lazy<Regex>,
    },
    /// Items inside matching block elements (homepage layout)
    Nested {
        block_tags: &'static [&'static str],
        block_pattern: &'static Lazy<Regex>,
        item_tags: &'static [&'static str],
        item_pattern: &'static Lazy<Regex>,
    },
    /// Elements of one tag carrying an exact class
    ExactClass {
        tag: &'static str,
        class: &'static str,
    },
}

/// Select candidate elements from a document in document order.
///
/// Each element is yielded once even if several blocks contain it.
pub fn select_candidates<'a>(document: &'a Html, rule: &CandidateRule) -> Vec<ElementRef<'a>> {
    match *rule {
        CandidateRule::Heuristic { tags, class_pattern } => all_elements(document)
            .filter(|el| is_tag(el, tags) && class_matches(el, class_pattern))
            .collect(),
        CandidateRule::Nested {
            block_tags,
            block_pattern,
            item_tags,
            item_pattern,
        } => {
            let mut seen = HashSet::new();
            all_elements(document)
                .filter(|el| is_tag(el, block_tags) && class_matches(el, block_pattern))
                .flat_map(|block| {
                    descendants(block)
                        .filter(|el| is_tag(el, item_tags) && class_matches(el, item_pattern))
                        .collect::<Vec<_>>()
                })
                .filter(|el| seen.insert(el.id()))
                .collect()
        }
        CandidateRule::ExactClass { tag, class } => all_elements(document)
            .filter(|el| el.value().name() == tag && has_class(el, class))
            .collect(),
    }
}

/// Whether the element links to one of the site's top-level navigation pages
pub fn links_to_nav(element: ElementRef) -> bool {
    descendants(element).any(|d| {
        is_tag(&d, &["a"]) && d.value().attr("href").is_some_and(|h| NAV_HREF.is_match(h))
    })
}

/// Parse an anime detail page
///
/// Extracts the description, label/value info pairs and up to ten episode
/// entries. Missing parts are left empty.
pub fn parse_anime_details(html: &str, base: &Url) -> AnimeDetails {
    let document = Html::parse_document(html);
    let mut details = AnimeDetails::default();

    if let Some(desc) = all_elements(&document)
        .find(|el| is_tag(el, &["div", "section"]) && class_matches(el, &DETAIL_DESC_CLASS))
    {
        details.description = Some(text_of(desc));
    }

    let info_blocks = all_elements(&document)
        .filter(|el| is_tag(el, &["div", "dl"]) && class_matches(el, &DETAIL_INFO_CLASS));
    for block in info_blocks {
        let labels = descendants(block)
            .filter(|el| is_tag(el, &["dt", "span"]) && class_matches(el, &LABEL_CLASS));
        let values = descendants(block)
            .filter(|el| is_tag(el, &["dd", "span"]) && class_matches(el, &VALUE_CLASS));

        for (label, value) in labels.zip(values) {
            details
                .info
                .insert(text_of(label).to_lowercase(), text_of(value));
        }
    }

    let episodes: Vec<ElementRef> = all_elements(&document)
        .filter(|el| is_tag(el, &["div", "li"]) && class_matches(el, &EPISODE_CLASS))
        .collect();

    if !episodes.is_empty() {
        details.episode_count = Some(episodes.len());
        details.episodes = episodes
            .iter()
            .take(DETAIL_EPISODE_LIMIT)
            .map(|ep| {
                let number = descendants(*ep)
                    .find(|d| class_matches(d, &EPISODE_NUMBER_CLASS))
                    .map(text_of)
                    .unwrap_or_default();
                let title = descendants(*ep)
                    .find(|d| class_matches(d, &TITLE_CLASS))
                    .map(text_of)
                    .unwrap_or_default();
                let url = descendants(*ep)
                    .find(|d| is_tag(d, &["a"]))
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| base.join(href).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_default();
                EpisodeRef { number, title, url }
            })
            .collect();
    }

    details
}
