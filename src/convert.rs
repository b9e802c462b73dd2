// src/convert.rs
//! HTML → Markdown conversion over a parsed DOM.
//!
//! Keeps headings, links, emphasis, images and lists. Never wraps lines.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::fs;
use std::path::Path;

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Convert an HTML fragment (or document) to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(doc.root_element(), &mut out);

    let trimmed_lines: Vec<&str> = out.lines().map(str::trim_end).collect();
    let joined = trimmed_lines.join("\n");
    RE_BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}

/// Read an HTML file and convert it. Empty input or empty output is an error.
pub fn convert_file(path: &Path) -> Result<String> {
    let html =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if html.trim().is_empty() {
        bail!("HTML file {} is empty", path.display());
    }
    let md = html_to_markdown(&html);
    if md.trim().is_empty() {
        bail!("conversion of {} resulted in empty content", path.display());
    }
    Ok(md)
}

fn render_children(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_text(out, text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            render_element(child_el, out);
        }
    }
}

fn render_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    match name {
        "script" | "style" | "head" | "noscript" | "template" | "title" | "meta" | "link" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let inner = inline_of(el);
            if !inner.is_empty() {
                push_block(out, &format!("{} {}", "#".repeat(level), inner));
            }
        }
        "p" => push_block(out, &inline_of(el)),
        "br" => out.push('\n'),
        "hr" => push_block(out, "* * *"),
        "strong" | "b" => wrap_inline(el, "**", out),
        "em" | "i" => wrap_inline(el, "_", out),
        "del" | "s" | "strike" => wrap_inline(el, "~~", out),
        "code" => {
            let code: String = el.text().collect();
            if !code.is_empty() {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
        }
        "pre" => {
            let code: String = el.text().collect();
            push_block(out, &format!("```\n{}\n```", code.trim_end()));
        }
        "a" => {
            let inner = inline_of(el);
            match el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                Some(href) => {
                    out.push_str(&format!("[{inner}]({href})"));
                }
                None => out.push_str(&inner),
            }
        }
        "img" => {
            if let Some(src) = el.value().attr("src").filter(|s| !s.trim().is_empty()) {
                let alt = el.value().attr("alt").unwrap_or_default().trim();
                out.push_str(&format!("![{alt}]({})", src.trim()));
            }
        }
        "ul" | "ol" => {
            let list = render_list(el, name == "ol", 0);
            push_block(out, list.trim_end());
        }
        "blockquote" => {
            let mut inner = String::new();
            render_children(el, &mut inner);
            let quoted: Vec<String> = inner
                .trim()
                .lines()
                .map(|l| {
                    let l = l.trim_end();
                    if l.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {l}")
                    }
                })
                .collect();
            push_block(out, &quoted.join("\n"));
        }
        "table" => push_block(out, &render_table(el)),
        "div" | "section" | "article" | "main" | "header" | "footer" | "aside" | "figure"
        | "body" | "html" | "center" => {
            let mut inner = String::new();
            render_children(el, &mut inner);
            push_block(out, inner.trim());
        }
        "figcaption" | "li" | "dd" | "dt" => push_block(out, &inline_of(el)),
        _ => render_children(el, out),
    }
}

/// Render children and flatten to one line.
fn inline_of(el: ElementRef<'_>) -> String {
    let mut inner = String::new();
    render_children(el, &mut inner);
    inner.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn wrap_inline(el: ElementRef<'_>, marker: &str, out: &mut String) {
    let inner = inline_of(el);
    if inner.is_empty() {
        return;
    }
    out.push_str(marker);
    out.push_str(&inner);
    out.push_str(marker);
}

fn render_list(el: ElementRef<'_>, ordered: bool, depth: usize) -> String {
    let mut lines = String::new();
    let mut n: u32 = el
        .value()
        .attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);

    for li in el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "li")
    {
        let mut text = String::new();
        let mut nested = String::new();
        for child in li.children() {
            if let Some(t) = child.value().as_text() {
                push_text(&mut text, t);
            } else if let Some(child_el) = ElementRef::wrap(child) {
                match child_el.value().name() {
                    "ul" => nested.push_str(&render_list(child_el, false, depth + 1)),
                    "ol" => nested.push_str(&render_list(child_el, true, depth + 1)),
                    "p" | "div" => {
                        text.push(' ');
                        text.push_str(&inline_of(child_el));
                    }
                    _ => render_element(child_el, &mut text),
                }
            }
        }
        let marker = if ordered {
            format!("{n}.")
        } else {
            "*".to_string()
        };
        let body = text.split_whitespace().collect::<Vec<_>>().join(" ");
        lines.push_str(&format!("{}{marker} {body}\n", "  ".repeat(depth)));
        lines.push_str(&nested);
        n = n.saturating_add(1);
    }
    lines
}

fn render_table(el: ElementRef<'_>) -> String {
    let mut rows = Vec::new();
    for tr in el.descendants().filter_map(ElementRef::wrap) {
        if tr.value().name() != "tr" {
            continue;
        }
        let cells: Vec<String> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .map(inline_of)
            .collect();
        if !cells.is_empty() {
            rows.push(cells.join(" | "));
        }
    }
    rows.join("\n")
}

/// Append a block separated from what precedes it by one blank line.
fn push_block(out: &mut String, block: &str) {
    let block = block.trim_matches('\n');
    if block.trim().is_empty() {
        return;
    }
    if !out.trim().is_empty() {
        while !out.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(block);
    out.push_str("\n\n");
}

/// Append text with HTML whitespace collapsing.
fn push_text(out: &mut String, text: &str) {
    if text.trim().is_empty() {
        if !text.is_empty() && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }
    let starts_ws = text.starts_with(char::is_whitespace);
    let ends_ws = text.ends_with(char::is_whitespace);
    if starts_ws && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    if ends_ws {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_headings_links_emphasis_and_images() {
        let html = r#"<h2>Top <a href="https://x.example/story">story</a></h2>
<p>Some <strong>bold</strong> and <em>soft</em> text.</p>
<p><img src="https://x.example/a.png" alt="Chart"></p>"#;
        let md = html_to_markdown(html);
        assert!(md.contains("## Top [story](https://x.example/story)"), "{md}");
        assert!(md.contains("Some **bold** and _soft_ text."), "{md}");
        assert!(md.contains("![Chart](https://x.example/a.png)"), "{md}");
    }

    #[test]
    fn lists_nest_with_indentation() {
        let html = "<ul><li>One</li><li>Two<ul><li>Nested</li></ul></li></ul><ol><li>First</li><li>Second</li></ol>";
        let md = html_to_markdown(html);
        assert!(md.contains("* One\n* Two\n  * Nested"), "{md}");
        assert!(md.contains("1. First\n2. Second"), "{md}");
    }

    #[test]
    fn ordered_list_start_at_u32_max_does_not_overflow() {
        let md = html_to_markdown(r#"<ol start="4294967295"><li>a</li><li>b</li></ol>"#);
        assert!(md.contains("4294967295. a"), "{md}");
        assert!(md.contains("4294967295. b"), "{md}");
    }

    #[test]
    fn long_paragraphs_are_not_wrapped() {
        let sentence = "word ".repeat(200);
        let md = html_to_markdown(&format!("<p>{sentence}</p>"));
        assert_eq!(md.lines().count(), 1);
        assert_eq!(md, sentence.trim());
    }

    #[test]
    fn scripts_dropped_and_blockquotes_prefixed() {
        let html = "<script>alert(1)</script><blockquote><p>quoted</p></blockquote><hr><p>after</p>";
        let md = html_to_markdown(html);
        assert!(!md.contains("alert"));
        assert!(md.contains("> quoted"), "{md}");
        assert!(md.contains("* * *"));
        assert!(md.ends_with("after"));
    }

    #[test]
    fn entities_are_decoded_and_blank_runs_collapsed() {
        let md = html_to_markdown("<p>A &amp; B</p>\n\n\n<div></div><p>C</p>");
        assert_eq!(md, "A & B\n\nC");
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("issue.html");
        fs::write(&p, "   \n").unwrap();
        assert!(convert_file(&p).is_err());
        fs::write(&p, "<script>x</script>").unwrap();
        assert!(convert_file(&p).is_err());
        fs::write(&p, "<p>hi</p>").unwrap();
        assert_eq!(convert_file(&p).unwrap(), "hi");
    }
}
