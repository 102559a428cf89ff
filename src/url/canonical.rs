use crate::url::CrawlTarget;
use url::Url;

/// Returns the trailing-slash variant of a URL
///
/// A path ending in `/` loses its trailing slashes, any other path gains one.
/// Root paths have no variant.
///
/// # Examples
///
/// ```
/// use civic_harvest::url::toggle_trailing_slash;
/// use url::Url;
///
/// let url = Url::parse("https://www.amsterdam.nl/subsidies").unwrap();
/// assert_eq!(
///     toggle_trailing_slash(&url).unwrap().as_str(),
///     "https://www.amsterdam.nl/subsidies/"
/// );
/// assert!(toggle_trailing_slash(&Url::parse("https://www.amsterdam.nl/").unwrap()).is_none());
/// ```
pub fn toggle_trailing_slash(url: &Url) -> Option<Url> {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return None;
    }

    let toggled = if path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        trimmed.to_string()
    } else {
        format!("{}/", path)
    };

    let mut variant = url.clone();
    variant.set_path(&toggled);
    Some(variant)
}

/// Derives the canonical HTML file name for a target on `site_host`
///
/// The path is stripped of its trailing slash (root excepted), every `/` becomes `_`,
/// one leading `_` is dropped, and `.html` is appended. Targets on other hosts have
/// no file name.
///
/// # Examples
///
/// ```
/// use civic_harvest::url::{html_file_name, CrawlTarget};
///
/// let target = CrawlTarget::parse("https://www.amsterdam.nl/subsidies/kunst/").unwrap();
/// assert_eq!(
///     html_file_name(&target, "www.amsterdam.nl").as_deref(),
///     Some("subsidies_kunst.html")
/// );
/// ```
pub fn html_file_name(target: &CrawlTarget, site_host: &str) -> Option<String> {
    if !target.is_on_site(site_host) {
        return None;
    }

    let path = target.url().path();
    let path = if path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    } else {
        path
    };

    let underscored = path.replace('/', "_");
    let name = underscored.strip_prefix('_').unwrap_or(&underscored);
    Some(format!("{}.html", name))
}

/// Derives the image file name from the basename of the URL path
///
/// A path ending in `/` has no basename.
pub fn image_file_name(url: &Url) -> Option<String> {
    url.path()
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}
