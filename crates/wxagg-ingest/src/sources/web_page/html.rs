//! Heuristic title and publish-date extraction from arbitrary pages.

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};

/// Where a candidate value lives on the matched element.
#[derive(Clone, Copy)]
enum Field {
    Text,
    Attr(&'static str),
}

/// Ordered title candidates; the first non-empty value wins.
const TITLE_CANDIDATES: [(&str, Field); 5] = [
    ("title", Field::Text),
    (r#"meta[property="og:title"]"#, Field::Attr("content")),
    (r#"meta[name="twitter:title"]"#, Field::Attr("content")),
    ("h1", Field::Text),
    (r#"h1[class*="title"], h1[id*="title"]"#, Field::Text),
];

/// Ordered publish-date candidates; the first value that parses wins.
const DATE_CANDIDATES: [(&str, Field); 6] = [
    (
        r#"meta[property="article:published_time"]"#,
        Field::Attr("content"),
    ),
    (r#"meta[name="pubdate"]"#, Field::Attr("content")),
    ("time[datetime]", Field::Attr("datetime")),
    (r#"meta[name="DC.date.issued"]"#, Field::Attr("content")),
    (
        r#"span[class*="date"], span[class*="time"], span[id*="date"], span[id*="time"]"#,
        Field::Text,
    ),
    (
        r#"p[class*="date"], p[class*="time"], p[id*="date"], p[id*="time"]"#,
        Field::Text,
    ),
];

fn compiled(candidates: &[(&str, Field)]) -> Vec<(Selector, Field)> {
    candidates
        .iter()
        .map(|(css, field)| (Selector::parse(css).expect("valid candidate selector"), *field))
        .collect()
}

fn title_selectors() -> &'static [(Selector, Field)] {
    static SEL: OnceLock<Vec<(Selector, Field)>> = OnceLock::new();
    SEL.get_or_init(|| compiled(&TITLE_CANDIDATES))
}

fn date_selectors() -> &'static [(Selector, Field)] {
    static SEL: OnceLock<Vec<(Selector, Field)>> = OnceLock::new();
    SEL.get_or_init(|| compiled(&DATE_CANDIDATES))
}

fn any_element_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("*").expect("valid universal selector"))
}

pub(super) fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Whether the document has any element beyond the implied html/head/body.
pub(super) fn has_markup(doc: &Html) -> bool {
    doc.select(any_element_selector())
        .any(|el| !matches!(el.value().name(), "html" | "head" | "body"))
}

pub(super) fn extract_title(doc: &Html) -> Option<String> {
    title_selectors()
        .iter()
        .find_map(|(sel, field)| doc.select(sel).next().and_then(|el| read(el, *field)))
}

/// Date strings in candidate order, first match per candidate.
pub(super) fn date_candidates(doc: &Html) -> Vec<String> {
    date_selectors()
        .iter()
        .filter_map(|(sel, field)| doc.select(sel).next().and_then(|el| read(el, *field)))
        .collect()
}

fn read(el: ElementRef<'_>, field: Field) -> Option<String> {
    let raw = match field {
        Field::Text => el.text().collect::<String>(),
        Field::Attr(name) => el.value().attr(name)?.to_string(),
    };
    let cleaned = clean_text(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

pub(super) fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prefers_title_tag() {
        let doc = parse(
            r#"<html><head><title> Page  Title </title>
            <meta property="og:title" content="OG"></head><body><h1>H</h1></body></html>"#,
        );
        assert_eq!(extract_title(&doc).as_deref(), Some("Page Title"));
    }

    #[test]
    fn title_falls_through_candidates_in_order() {
        let og = parse(r#"<head><title>  </title><meta property="og:title" content="OG"></head>"#);
        assert_eq!(extract_title(&og).as_deref(), Some("OG"));

        let twitter = parse(r#"<head><meta name="twitter:title" content="TW"></head><h1>H</h1>"#);
        assert_eq!(extract_title(&twitter).as_deref(), Some("TW"));

        let h1 = parse("<body><h1>Thread <b>42</b></h1></body>");
        assert_eq!(extract_title(&h1).as_deref(), Some("Thread 42"));
    }

    #[test]
    fn no_title_candidates_yields_none() {
        let doc = parse("<body><p>just text</p></body>");
        assert_eq!(extract_title(&doc), None);
    }

    #[test]
    fn date_candidates_are_ordered() {
        let doc = parse(
            r#"<head><meta name="pubdate" content="2024-05-06"></head>
            <body><time datetime="2024-01-01T00:00:00Z">Jan</time>
            <span class="post-date">2023-12-31</span></body>"#,
        );
        assert_eq!(
            date_candidates(&doc),
            vec!["2024-05-06", "2024-01-01T00:00:00Z", "2023-12-31"]
        );
    }

    #[test]
    fn has_markup_ignores_implied_elements() {
        assert!(!has_markup(&parse("plain text body")));
        assert!(has_markup(&parse("<p>x</p>")));
    }
}
