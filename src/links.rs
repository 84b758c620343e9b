// src/links.rs
use url::Url;

/// Dataset id is the last non-empty path segment, e.g.
/// `https://open-reaction-database.org/dataset/ord_dataset-abc` -> `ord_dataset-abc`.
pub fn dataset_id_from_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(last) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return last.to_string();
        }
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// Makes a (possibly relative) href absolute against the page it was found on.
pub fn resolve_href(base: &str, href: &str) -> String {
    let href = href.trim();
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Pulls the first quoted URL or absolute path out of an inline click handler such as
/// `window.open('https://...')` or `location.href="/reaction/ord-1"`.
pub fn url_from_click_handler(handler: &str) -> Option<String> {
    let mut rest = handler;
    while let Some(open) = rest.find(['\'', '"']) {
        let quote = rest[open..].chars().next()?;
        let after = &rest[open + 1..];
        let close = after.find(quote)?;
        let candidate = after[..close].trim();
        if candidate.starts_with("http://")
            || candidate.starts_with("https://")
            || candidate.starts_with('/')
        {
            return Some(candidate.to_string());
        }
        rest = &after[close + 1..];
    }
    None
}
