use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::models::ExtractedPage;
use crate::url_utils::convert_to_absolute_url;

lazy_static! {
    static ref LINK_SELECTOR: Selector = Selector::parse("a[href]").expect("Invalid CSS selector");
    static ref TEXT_SELECTOR: Selector =
        Selector::parse("title, h1, h2, h3, h4, h5, h6, p").expect("Invalid CSS selector");
    static ref TITLE_SELECTOR: Selector = Selector::parse("title").expect("Invalid CSS selector");
    static ref DESCRIPTION_SELECTOR: Selector =
        Selector::parse(".shortdescription").expect("Invalid CSS selector");
}

/// Extract all hyperlink URLs from HTML content
///
/// # Examples
/// ```
/// use wiki_tfidf::parser::extract_links;
///
/// let html = r#"<html><body><a href="/wiki/Evolution">Evolution</a></body></html>"#;
/// let links = extract_links(html);
/// assert_eq!(links, vec!["/wiki/Evolution"]);
/// ```
pub fn extract_links(html_body: &str) -> Vec<String> {
    let document = Html::parse_document(html_body);
    links_in(&document)
}

fn links_in(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        if let Some(href) = element.value().attr("href") {
            let cleaned_href = href.trim();

            // Skip empty links, javascript links, mailto, tel, etc.
            if !cleaned_href.is_empty()
                && !cleaned_href.starts_with("javascript:")
                && !cleaned_href.starts_with("mailto:")
                && !cleaned_href.starts_with("tel:")
                && !cleaned_href.starts_with("data:")
                && !cleaned_href.starts_with("file:")
            {
                links.push(cleaned_href.to_string());
            }
        }
    }

    links
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Pull the four values the indexer consumes out of a fetched page: the
/// visible text of title, heading and paragraph elements in document order,
/// the `<title>`, the short description, and every outbound link resolved
/// against `base_url`. Links that cannot be resolved are dropped.
pub fn extract_page(html_body: &str, base_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html_body);

    let text = document
        .select(&TEXT_SELECTOR)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let links = links_in(&document)
        .into_iter()
        .filter_map(|href| convert_to_absolute_url(&href, base_url).ok())
        .collect();

    ExtractedPage {
        text,
        title: first_text(&document, &TITLE_SELECTOR),
        description: first_text(&document, &DESCRIPTION_SELECTOR),
        links,
    }
}
