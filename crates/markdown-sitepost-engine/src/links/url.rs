use regex::Regex;
use std::sync::OnceLock;

/// Strip a trailing `.md` (before any `#fragment`) and append `extension`.
///
/// Links keep their `.md` suffix in the sources so they also work in the
/// repository browser; the published site serves them without it.
/// URLs that do not end in `.md` are returned unchanged.
pub fn remove_md(url: &str, extension: &str) -> String {
    static MD_RE: OnceLock<Regex> = OnceLock::new();
    let md_re = MD_RE.get_or_init(|| Regex::new(r"^([^#]*)\.md(#.*)?$").expect("Invalid md regex"));

    match md_re.captures(url) {
        Some(caps) => {
            let mut out = caps[1].to_string();
            out.push_str(extension);
            if let Some(fragment) = caps.get(2) {
                out.push_str(fragment.as_str());
            }
            out
        }
        None => url.to_string(),
    }
}

/// Drop a `#fragment` suffix.
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(path, _)| path)
}

/// The part of `url` before any `?query` or `#fragment`.
pub fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Whether `url` starts with a URI scheme such as `ftp:` or `tel:`.
pub fn has_scheme(url: &str) -> bool {
    static SCHEME_RE: OnceLock<Regex> = OnceLock::new();
    SCHEME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("Invalid scheme regex"))
        .is_match(url)
}

/// Resolve `target` against the directory `base_path`, returning the
/// joined segments without a leading slash.
///
/// Empty and `.` segments are dropped; `..` removes the previous segment.
/// A `..` with nothing left to remove is ignored.
pub fn resolve_segments(base_path: &str, target: &str) -> String {
    let mut segments: Vec<&str> = vec![];
    for segment in base_path.split('/').chain(target.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    log::debug!("'..' in {target:?} climbs above the site root from {base_path:?}");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// POSIX-style relative path from the directory `start` to `path`.
///
/// Both are compared segment by segment, so absolute URLs sharing a scheme
/// and host work as well as plain paths. Identical inputs give `"."`.
pub fn relpath(path: &str, start: &str) -> String {
    let path_segments = normalized_segments(path);
    let start_segments = normalized_segments(start);

    let common = path_segments
        .iter()
        .zip(&start_segments)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; start_segments.len() - common];
    parts.extend(&path_segments[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn normalized_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = vec![];
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}
