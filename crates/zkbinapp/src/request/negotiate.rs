//! # Content Negotiation
//!
//! Decides whether a request wants the JSON API or the HTML frontend.
//!
//! A request is a JSON API call if it carries the script marker header
//! (`X-Requested-With: JSONHttpRequest`), or if its `Accept` header, once
//! ranked, lists a JSON media type before any HTML or XHTML one.
//!
//! Ranking follows RFC 7231 media ranges: entries are sorted by their `q`
//! weight, highest first, keeping header order among equal weights. Entries
//! weighted `q=0` are refused by the client and dropped. Entries that do not
//! parse (bad media range, `q` outside `0..=1`) are dropped as well. If
//! neither JSON nor HTML shows up, the answer is HTML.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIME_JSON: &str = "application/json";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XHTML: &str = "application/xhtml+xml";

/// Header set by the JavaScript client on every API call.
pub const SCRIPT_MARKER_HEADER: &str = "X-Requested-With";
pub const SCRIPT_MARKER_VALUE: &str = "JSONHttpRequest";

static MEDIA_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*/\*|[a-z0-9!#$&^_.+\-]+/(?:\*|[a-z0-9!#$&^_.+\-]+))$")
        .expect("media range pattern is valid")
});

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// Lowercased media range, parameters other than `q` included.
    pub range: String,
    pub quality: f32,
}

impl MediaRange {
    /// Parses a single comma-separated entry. None if it is malformed.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split(';').map(str::trim);
        let media = parts.next()?.to_ascii_lowercase();
        if !MEDIA_RANGE.is_match(&media) {
            return None;
        }

        let mut range = media;
        let mut quality = 1.0;
        for param in parts {
            match param.split_once('=') {
                Some((name, value)) if name.trim().eq_ignore_ascii_case("q") => {
                    quality = value.trim().parse::<f32>().ok()?;
                    if !(0.0..=1.0).contains(&quality) {
                        return None;
                    }
                }
                _ => {
                    range.push(';');
                    range.push_str(&param.to_ascii_lowercase());
                }
            }
        }
        Some(Self { range, quality })
    }

    fn is_json(&self) -> bool {
        self.range.starts_with(MIME_JSON)
    }

    fn is_html(&self) -> bool {
        self.range.starts_with(MIME_HTML) || self.range.starts_with(MIME_XHTML)
    }
}

/// Accepted media ranges, best first. Refused (`q=0`) and malformed entries
/// are left out.
pub fn ranked(accept: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = accept
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(MediaRange::parse)
        .filter(|range| range.quality > 0.0)
        .collect();
    // sort_by is stable, so header order survives among equal weights
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

/// True if the `Accept` header ranks JSON above HTML and XHTML.
pub fn prefers_json(accept: &str) -> bool {
    for range in ranked(accept) {
        if range.is_html() {
            return false;
        }
        if range.is_json() {
            return true;
        }
    }
    false
}

/// Full decision from the two relevant headers.
pub fn is_json_request(requested_with: Option<&str>, accept: Option<&str>) -> bool {
    requested_with == Some(SCRIPT_MARKER_VALUE) || accept.is_some_and(prefers_json)
}
