// src/extract.rs
//! Line-oriented text heuristics over translated Markdown.
//!
//! No Markdown parse: every extractor scans raw lines. Counting is in
//! `char`s, never bytes, so full-width text truncates correctly. Empty or
//! blank input always yields the documented fallback.

use once_cell::sync::Lazy;
use regex::Regex;

/// Title used when no heading is found.
pub const DEFAULT_TITLE: &str = "AIニュース";
/// Placeholder when no localized date is found.
pub const DEFAULT_DATE_LABEL: &str = "Latest";
/// Head-of-document window for title, date and quiet-day detection.
pub const HEAD_LINES: usize = 10;
pub const ELLIPSIS: &str = "...";

/// Digest budget for chat embeds.
pub const DIGEST_MAX_CHARS: usize = 1500;
/// Fallback paragraphs must be longer than this to count as a news item.
const MIN_PARAGRAPH_CHARS: usize = 30;
/// How far back from the cut point a full-width comma may sit.
const COMMA_LOOKBACK: usize = 20;

/// X counts any URL as this many characters.
pub const TWEET_URL_BUDGET: usize = 24;
pub const TWEET_MAX_CHARS: usize = 140;

const QUIET_DAY_MARKERS: [&str; 2] = ["静かな一日", "quiet day"];
const SENTENCE_TERMINATORS: [char; 3] = ['。', '！', '？'];
const FULLWIDTH_COMMAS: [char; 2] = ['、', '，'];

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static RE_LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([-*+・]|\d+[.)])\s").unwrap());
static RE_BOLD_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*+]\s+\*\*(.+?)\*\*").unwrap());
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([-*_]\s*){3,}$").unwrap());
static RE_JA_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日").unwrap());

fn head(md: &str) -> impl Iterator<Item = &str> {
    md.trim().lines().take(HEAD_LINES)
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('＃')
}

/// A trimmed line that carries body prose: not blank, heading, image,
/// list item, quote or horizontal rule.
fn is_paragraph_line(t: &str) -> bool {
    !(t.is_empty()
        || is_heading(t)
        || t.starts_with("![")
        || t.starts_with('>')
        || RE_LIST_ITEM.is_match(t)
        || RE_RULE.is_match(t))
}

/// `[text](url)` → `text`, `**text**` → `text`.
pub fn strip_inline_markup(line: &str) -> String {
    let no_links = RE_LINK.replace_all(line, "$1");
    RE_BOLD.replace_all(&no_links, "$1").into_owned()
}

/// First heading within the head window, markers and whitespace stripped.
pub fn find_title(md: &str) -> Option<String> {
    head(md)
        .map(str::trim_start)
        .filter(|l| is_heading(l))
        .map(|l| l.trim_start_matches(['#', '＃']).trim().to_string())
        .find(|t| !t.is_empty())
}

/// Like [`find_title`], with [`DEFAULT_TITLE`] as fallback.
pub fn extract_title(md: &str) -> String {
    find_title(md).unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Quiet-day marker anywhere in the head window (English match is
/// case-insensitive).
pub fn is_quiet_day(md: &str) -> bool {
    head(md).any(|l| {
        let lower = l.to_lowercase();
        QUIET_DAY_MARKERS.iter().any(|m| lower.contains(m))
    })
}

/// First `YYYY年M月D日` within the head window.
pub fn extract_date(md: &str) -> Option<String> {
    head(md).find_map(|l| RE_JA_DATE.find(l).map(|m| m.as_str().to_string()))
}

/// Archive summary: accumulate cleaned prose lines up to `max_chars`.
///
/// When the next line would overflow, stop if something was collected,
/// otherwise hard-cut that first line at `max_chars`. A non-empty result
/// always ends with an ellipsis; zero eligible lines give `""`.
pub fn archive_summary(md: &str, max_chars: usize) -> String {
    let mut summary = String::new();
    let mut count = 0usize;

    for line in md.lines() {
        let t = line.trim();
        if !is_paragraph_line(t) {
            continue;
        }
        let clean = strip_inline_markup(t);
        let clean = clean.trim();
        if clean.is_empty() {
            continue;
        }
        let n = clean.chars().count();
        if count + n <= max_chars {
            summary.push_str(clean);
            count += n;
            continue;
        }
        if summary.is_empty() {
            summary = clean.chars().take(max_chars).collect();
        }
        break;
    }

    if !summary.is_empty() && !summary.ends_with(ELLIPSIS) && !summary.ends_with('…') {
        summary.push_str(ELLIPSIS);
    }
    summary
}

/// Social-post summary: the bold lead of the first `- **...**` bullet, or
/// else the first sentence of the first substantial paragraph.
/// Truncated to `max_chars` via [`truncate_at_comma`].
pub fn news_item_summary(md: &str, max_chars: usize) -> Option<String> {
    let from_bullet = md.lines().find_map(|l| {
        RE_BOLD_BULLET
            .captures(l)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty())
    });
    if let Some(s) = from_bullet {
        return Some(truncate_at_comma(&s, max_chars));
    }

    md.lines()
        .map(str::trim)
        .filter(|t| is_paragraph_line(t))
        .map(|t| strip_inline_markup(t).trim().to_string())
        .find(|t| t.chars().count() > MIN_PARAGRAPH_CHARS)
        .map(|p| truncate_at_comma(&first_sentence(&p), max_chars))
}

/// Text up to and including the first `。`, `！` or `？`; whole line if none.
pub fn first_sentence(line: &str) -> String {
    match line.char_indices().find(|(_, c)| SENTENCE_TERMINATORS.contains(c)) {
        Some((i, c)) => line[..i + c.len_utf8()].to_string(),
        None => line.to_string(),
    }
}

/// Cap `s` at `max_chars` including the ellipsis. Prefers cutting at a
/// full-width comma near the end of the kept window; otherwise hard cuts.
pub fn truncate_at_comma(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let window = &chars[..keep];
    let floor = keep.saturating_sub(COMMA_LOOKBACK);
    let cut = window
        .iter()
        .rposition(|c| FULLWIDTH_COMMAS.contains(c))
        .filter(|&i| i >= floor && i > 0)
        .unwrap_or(keep);
    let mut out: String = window[..cut].iter().collect();
    out.push_str(ELLIPSIS);
    out
}

/// `summary + " " + url`, with the summary cut so the post fits
/// [`TWEET_MAX_CHARS`] given the shortened-URL budget.
pub fn compose_tweet(summary: &str, url: &str) -> String {
    let available = TWEET_MAX_CHARS - TWEET_URL_BUDGET - 1;
    let summary = summary.trim();
    let body = if summary.chars().count() > available {
        let mut cut: String = summary.chars().take(available - ELLIPSIS.len()).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        summary.to_string()
    };
    format!("{body} {url}")
}

/// Paragraph digest for chat embeds: whole paragraphs up to `max_chars`,
/// plus a word-cut partial paragraph when more than 50 chars of room remain.
pub fn paragraph_digest(md: &str, max_chars: usize) -> String {
    let lines: Vec<&str> = md.trim().lines().collect();
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .unwrap_or(0);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in &lines[start..] {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else if !line.starts_with('#') && !line.starts_with('[') {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    let mut summary = String::new();
    for para in paragraphs {
        let used = summary.chars().count();
        if used + para.chars().count() + 2 <= max_chars {
            if !summary.is_empty() {
                summary.push_str("\n\n");
            }
            summary.push_str(&para);
            continue;
        }
        let remaining = max_chars.saturating_sub(used + 5);
        if remaining > 50 {
            let mut partial = String::new();
            for word in para.split_whitespace() {
                if partial.chars().count() + word.chars().count() + 1 <= remaining {
                    if !partial.is_empty() {
                        partial.push(' ');
                    }
                    partial.push_str(word);
                } else {
                    break;
                }
            }
            if !partial.is_empty() {
                summary.push_str("\n\n");
                summary.push_str(&partial);
                summary.push_str(ELLIPSIS);
            }
        }
        break;
    }
    summary.trim().to_string()
}
