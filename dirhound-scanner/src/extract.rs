use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Element/attribute pairs that can point at another resource.
const LINK_ATTRIBUTES: [(&str, &str); 5] = [
    ("a[href]", "href"),
    ("link[href]", "href"),
    ("area[href]", "href"),
    ("[src]", "src"),
    ("form[action]", "action"),
];

const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Extensions that are never worth crawling into.
const STATIC_EXTENSIONS: [&str; 27] = [
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".webp", ".mp3", ".mp4", ".wav",
    ".avi", ".mov", ".flv", ".wmv", ".zip", ".tar", ".gz", ".rar", ".7z", ".pdf", ".doc",
    ".docx", ".xls", ".xlsx", ".pptx", ".exe",
];

/// Collect same-origin links referenced by an HTML document.
///
/// Relative references are resolved against `source` and fragments are
/// dropped. Content that is not HTML at all simply yields nothing.
pub fn extract_links(html: &str, source: &Url) -> HashSet<Url> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    for (css, attribute) in LINK_ATTRIBUTES {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(reference) = element.value().attr(attribute)
                && let Some(url) = resolve(source, reference)
                && same_origin(source, &url)
            {
                links.insert(url);
            }
        }
    }

    links
}

fn resolve(source: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    let lowered = reference.to_ascii_lowercase();
    if reference.is_empty()
        || reference.starts_with('#')
        || SKIPPED_SCHEMES.iter().any(|s| lowered.starts_with(s))
    {
        return None;
    }

    let mut url = source.join(reference).ok()?;
    url.set_fragment(None);
    Some(url)
}

fn same_origin(source: &Url, candidate: &Url) -> bool {
    source.scheme() == candidate.scheme()
        && source.host_str() == candidate.host_str()
        && source.port_or_known_default() == candidate.port_or_known_default()
}

pub fn is_static_asset(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
