//! Console summary of a finished scrape

use indexmap::IndexMap;

use crate::models::AnimeRecord;

const SAMPLE_SIZE: usize = 5;

fn category_name(anime: &AnimeRecord, fallback: &str) -> String {
    anime
        .category
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// Render the human-readable run summary
pub fn render_summary(records: &[AnimeRecord]) -> String {
    if records.is_empty() {
        return "No anime data found\n".to_string();
    }

    let mut lines = vec![
        String::new(),
        "=== 9ANIME.TO SCRAPING SUMMARY ===".to_string(),
        format!("Total anime found: {}", records.len()),
    ];

    // categories in first-seen order
    let mut categories: IndexMap<String, usize> = IndexMap::new();
    for anime in records {
        *categories.entry(category_name(anime, "unknown")).or_insert(0) += 1;
    }

    lines.push(String::new());
    lines.push("By category:".to_string());
    lines.extend(
        categories
            .iter()
            .map(|(category, count)| format!("  {}: {}", category, count)),
    );

    lines.push(String::new());
    lines.push("Sample anime:".to_string());
    for (i, anime) in records.iter().take(SAMPLE_SIZE).enumerate() {
        lines.push(format!(
            "  {}. {} - {}",
            i + 1,
            anime.title.as_deref().unwrap_or("Unknown"),
            category_name(anime, "Unknown")
        ));
        if let Some(anime_type) = anime.anime_type.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("      Type: {}", anime_type));
        }
        if let Some(episodes) = anime.episodes.as_deref().filter(|e| !e.is_empty()) {
            lines.push(format!("      Episodes: {}", episodes));
        }
    }

    if records.len() > SAMPLE_SIZE {
        lines.push(format!("  ... and {} more", records.len() - SAMPLE_SIZE));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
