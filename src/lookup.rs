//! Helpers around the movie-title lookup.
//!
//! The lookup itself happens elsewhere; it hands back raw candidate strings.
//! This module turns them into filesystem-safe names and builds the query
//! used when renaming an already-ripped file.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// Most candidates ever offered to the user.
pub const MAX_CANDIDATES: usize = 11;

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#x?[0-9A-Fa-f]+;").expect("BUG: Failed to compile entity regex")
});

static RESULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<title>.* \(.\d+\))").expect("BUG: Failed to compile search result regex")
});

static QUERY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<query>[ A-Za-z0-9']+)").expect("BUG: Failed to compile query regex")
});

/// Makes one candidate safe to use as a filename: drops numeric character
/// references and maps `:` and `/` to `-`.
pub fn sanitize_candidate(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, "")
        .replace([':', '/'], "-")
        .trim()
        .to_string()
}

/// Sanitizes, drops blanks and duplicates, and keeps at most [`MAX_CANDIDATES`].
pub fn normalize_candidates<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates: Vec<String> = Vec::new();
    for c in raw {
        let c = sanitize_candidate(c.as_ref());
        if !c.is_empty() && !candidates.contains(&c) {
            candidates.push(c);
        }
        if candidates.len() == MAX_CANDIDATES {
            break;
        }
    }
    candidates
}

/// Pulls `Name (Year)` out of a search result's text, skipping media-gallery hits.
pub fn candidate_from_result_text(text: &str) -> Option<String> {
    let squeezed = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    let caps = RESULT_RE.captures(&squeezed)?;
    let title = &caps["title"];
    if title.starts_with("Media from") {
        return None;
    }
    Some(title.to_string())
}

/// Turns raw search results into candidates: `Name (Year)` when the text carries
/// one, the text itself otherwise. Media-gallery hits are dropped.
pub fn candidates_from_results<I, S>(results: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    normalize_candidates(results.into_iter().filter_map(|r| {
        let r = r.as_ref();
        if r.trim_start().starts_with("Media from") {
            return None;
        }
        Some(candidate_from_result_text(r).unwrap_or_else(|| r.to_string()))
    }))
}

/// The leading run of plain words in a file's name, used as the lookup query.
pub fn rename_query(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let caps = QUERY_RE.captures(name)?;
    let query = caps["query"].trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

/// Where `path` ends up when renamed to `title`: same directory, same extension.
pub fn renamed_path(path: &Path, title: &str) -> PathBuf {
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", title, ext),
        None => title.to_string(),
    };
    path.with_file_name(file_name)
}
