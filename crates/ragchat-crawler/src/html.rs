//! Text and link extraction from HTML pages.

use ragchat_core::chunk::netloc;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never belongs to the page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "header", "footer", "nav"];

/// Extract the readable text of an HTML document.
///
/// Every non-blank line of text becomes its own paragraph, separated by a blank line.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    collect_lines(document.root_element(), &mut lines);
    lines.join("\n\n")
}

fn collect_lines<'a>(element: ElementRef<'a>, lines: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            lines.extend(text.lines().map(str::trim).filter(|l| !l.is_empty()));
        } else if let Some(child) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child.value().name()) {
                collect_lines(child, lines);
            }
        }
    }
}

/// Extract the links of a page that stay on the page's site.
///
/// Links are resolved against `base`, stripped of fragments and deduplicated
/// in order of first appearance.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let site = netloc(base);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let hrefs = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| el.value().attr("href"));

    for href in hrefs {
        let Ok(mut link) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(link.scheme(), "http" | "https") || netloc(&link) != site {
            continue;
        }
        link.set_fragment(None);
        if seen.insert(link.to_string()) {
            links.push(link);
        }
    }
    links
}
