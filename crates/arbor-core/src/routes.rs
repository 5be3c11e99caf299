//! Filesystem-derived URL routes and request matching.
//!
//! Every component source file under the routing root maps to exactly one
//! [`Route`]. Derivation is a pure function of the root and the file path:
//! Pascal-case path segments become kebab-case URL segments, `Index.<ext>`
//! files collapse into their parent folder, and `[Name]` / `[-Name]` bracket
//! segments become `:name` parameters.
//!
//! Matching is segment-wise and trailing-slash insensitive; parameter
//! segments match any value, literal segments must match exactly. The table
//! is scanned in insertion order so overlapping shapes resolve
//! deterministically to the first registered route.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// A URL route derived from a component source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Normalized URL pattern, lowercase, `:name` parameter segments.
    pub url: String,
    /// Parameter names in order of appearance in the pattern.
    pub param_names: Vec<String>,
    /// Absolute path of the component source file.
    pub source_file: PathBuf,
    /// Path relative to the routing root, case-preserved. Used as the
    /// human-readable build name.
    pub relative_path: String,
}

/// Convert a PascalCase identifier to a kebab-case URL segment.
///
/// Non-alphabetic characters pass through unchanged, so bracket markers and
/// digits survive the conversion.
pub fn pascal_to_kebab(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (idx, ch) in input.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a kebab-case or snake_case name to PascalCase.
///
/// Used when a file stem has to become a valid module identifier.
pub fn kebab_to_pascal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = true;
    for ch in input.chars() {
        if ch == '-' || ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Derive the [`Route`] for a source file under `root`.
///
/// Pure: consults only the two paths given, never the filesystem. Calling it
/// twice with the same inputs yields identical routes.
pub fn derive_route(root: &Path, file: &Path) -> Route {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let relative_path = relative.to_string_lossy().replace('\\', "/");

    let extension = file
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let raw_segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    let last_idx = raw_segments.len().saturating_sub(1);

    let mut segments = Vec::with_capacity(raw_segments.len());
    let mut param_names = Vec::new();

    for (idx, raw) in raw_segments.iter().enumerate() {
        // The filename segment loses its extension before anything else.
        let mut segment = (*raw).to_string();
        if idx == last_idx && !extension.is_empty() {
            if let Some(stripped) = segment.strip_suffix(&format!(".{extension}")) {
                segment = stripped.to_string();
            }
        }

        if let Some(inner) = bracket_param(&segment) {
            let name = pascal_to_kebab(inner.trim_start_matches('-'));
            segments.push(format!(":{name}"));
            param_names.push(name);
            continue;
        }

        let kebab = pascal_to_kebab(&segment);
        if kebab.is_empty() || (idx == last_idx && kebab == "index") {
            continue;
        }
        segments.push(kebab);
    }

    let url = if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    };

    Route {
        url,
        param_names,
        source_file: file.to_path_buf(),
        relative_path,
    }
}

/// Extract the inner name of a `[Name]` bracket segment, if it is one.
fn bracket_param(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|s| !s.is_empty())
}

/// Check whether a route pattern matches a request URL.
///
/// Both sides are split on `/` with empty segments discarded, which makes
/// trailing slashes insignificant. Parameter segments (`:name`) match any
/// value; everything else must match exactly.
pub fn routes_match(pattern: &str, url: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let url_segments: Vec<&str> = url.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != url_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(url_segments.iter())
        .all(|(p, u)| p.starts_with(':') || p == u)
}

/// Extract parameter values from a URL that already matched `route`.
///
/// Returns `None` for a route with no parameter segments, so callers can
/// tell "no params expected" apart from an empty mapping.
pub fn extract_params(route: &Route, url: &str) -> Option<FxHashMap<String, String>> {
    if route.param_names.is_empty() {
        return None;
    }

    let pattern_segments = route.url.split('/').filter(|s| !s.is_empty());
    let url_segments: Vec<&str> = url.split('/').filter(|s| !s.is_empty()).collect();

    let mut params = FxHashMap::default();
    for (idx, pattern) in pattern_segments.enumerate() {
        if let Some(name) = pattern.strip_prefix(':') {
            if let Some(value) = url_segments.get(idx) {
                params.insert(name.to_string(), (*value).to_string());
            }
        }
    }
    Some(params)
}

/// Insertion-ordered collection of routes, one per source file.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, replacing any existing route for the same source
    /// file in place. Keeps the invariant of exactly one route per file
    /// without disturbing scan order for unrelated routes.
    pub fn insert(&mut self, route: Route) {
        match self
            .routes
            .iter_mut()
            .find(|r| r.source_file == route.source_file)
        {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    /// Remove and return the route derived from `file`, if present.
    pub fn remove_by_source(&mut self, file: &Path) -> Option<Route> {
        let idx = self.routes.iter().position(|r| r.source_file == file)?;
        Some(self.routes.remove(idx))
    }

    /// Find the first route matching `url`, scanning in insertion order.
    pub fn match_url(&self, url: &str) -> Option<&Route> {
        self.routes.iter().find(|r| routes_match(&r.url, url))
    }

    pub fn contains_source(&self, file: &Path) -> bool {
        self.routes.iter().any(|r| r.source_file == file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(pattern: &str, params: &[&str]) -> Route {
        Route {
            url: pattern.to_string(),
            param_names: params.iter().map(|p| p.to_string()).collect(),
            source_file: PathBuf::from("/root/pages/Test.svelte"),
            relative_path: "Test.svelte".to_string(),
        }
    }

    #[test]
    fn converts_pascal_to_kebab() {
        assert_eq!(pascal_to_kebab("ThisIsATest"), "this-is-a-test");
        assert_eq!(pascal_to_kebab("About"), "about");
        assert_eq!(pascal_to_kebab("already-kebab"), "already-kebab");
    }

    #[test]
    fn converts_kebab_to_pascal() {
        assert_eq!(kebab_to_pascal("this-is-a-test"), "ThisIsATest");
        assert_eq!(kebab_to_pascal("nav_bar"), "NavBar");
        assert_eq!(kebab_to_pascal("Index"), "Index");
    }

    #[test]
    fn index_file_collapses_to_parent() {
        let route = derive_route(Path::new("/root/pages"), Path::new("/root/pages/Index.svelte"));
        assert_eq!(route.url, "/");
        assert!(route.param_names.is_empty());
        assert_eq!(route.relative_path, "Index.svelte");
    }

    #[test]
    fn nested_index_collapses_to_folder() {
        let route = derive_route(
            Path::new("/root/pages"),
            Path::new("/root/pages/Posts/Index.svelte"),
        );
        assert_eq!(route.url, "/posts");
    }

    #[test]
    fn pascal_filenames_become_kebab_urls() {
        let route = derive_route(
            Path::new("/root/pages"),
            Path::new("/root/pages/AboutUs.svelte"),
        );
        assert_eq!(route.url, "/about-us");
    }

    #[test]
    fn only_exact_index_stems_collapse() {
        let route = derive_route(
            Path::new("/root/pages"),
            Path::new("/root/pages/BlogIndex.svelte"),
        );
        assert_eq!(route.url, "/blog-index");
    }

    #[test]
    fn bracket_segments_become_parameters() {
        let route = derive_route(
            Path::new("/root/pages"),
            Path::new("/root/pages/Authors/[Author]/Posts/[-Post]/Tests/[-Test]/Index.svelte"),
        );
        assert_eq!(route.url, "/authors/:author/posts/:post/tests/:test");
        assert_eq!(route.param_names, vec!["author", "post", "test"]);
    }

    #[test]
    fn bracket_filename_is_a_parameter() {
        let route = derive_route(
            Path::new("/root/pages"),
            Path::new("/root/pages/posts/[Slug].svelte"),
        );
        assert_eq!(route.url, "/posts/:slug");
        assert_eq!(route.param_names, vec!["slug"]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let root = Path::new("/root/pages");
        let file = Path::new("/root/pages/Authors/[Author]/Index.svelte");
        assert_eq!(derive_route(root, file), derive_route(root, file));
    }

    #[test]
    fn matches_parameter_routes() {
        assert!(routes_match(
            "/authors/:author/posts/:post",
            "/authors/reed-jones/posts/getting-started"
        ));
    }

    #[test]
    fn matches_regardless_of_trailing_slash() {
        assert!(routes_match("/authors/:author/", "/authors/reed-jones"));
        assert!(routes_match("/authors/:author", "/authors/reed-jones/"));
        assert!(routes_match("/about", "/about/"));
        assert!(routes_match("/about/", "/about"));
    }

    #[test]
    fn segment_count_mismatch_never_matches() {
        assert!(!routes_match(
            "/authors/:author/posts/:post",
            "/authors/reed-jones/posts"
        ));
    }

    #[test]
    fn literal_segment_mismatch_never_matches() {
        assert!(!routes_match(
            "/authors/:author/posts/:post",
            "/users/reed-jones/posts/getting-started"
        ));
    }

    #[test]
    fn extracts_parameters_into_a_map() {
        let r = route("/authors/:author/posts/:post", &["author", "post"]);
        let params =
            extract_params(&r, "/authors/reed-jones/posts/getting-started").expect("params");
        assert_eq!(params.get("author").map(String::as_str), Some("reed-jones"));
        assert_eq!(
            params.get("post").map(String::as_str),
            Some("getting-started")
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn paramless_route_yields_absent_params() {
        let r = route("/authors/author/posts/post", &[]);
        assert!(extract_params(&r, "/authors/reed-jones/posts/getting-started").is_none());
    }

    #[test]
    fn table_scans_in_insertion_order() {
        let mut table = RouteTable::new();
        let mut first = route("/posts/:slug", &["slug"]);
        first.source_file = PathBuf::from("/root/pages/posts/[Slug].svelte");
        let mut second = route("/posts/:id", &["id"]);
        second.source_file = PathBuf::from("/root/pages/posts/[Id].svelte");
        table.insert(first);
        table.insert(second);

        let matched = table.match_url("/posts/hello").expect("match");
        assert_eq!(matched.url, "/posts/:slug");
    }

    #[test]
    fn table_keeps_one_route_per_source_file() {
        let mut table = RouteTable::new();
        let file = PathBuf::from("/root/pages/About.svelte");
        let mut a = route("/about", &[]);
        a.source_file = file.clone();
        let mut b = route("/about-v2", &[]);
        b.source_file = file.clone();
        table.insert(a);
        table.insert(b);

        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next().map(|r| r.url.as_str()), Some("/about-v2"));
    }

    #[test]
    fn table_removal_by_source_file() {
        let mut table = RouteTable::new();
        table.insert(route("/about", &[]));
        let removed = table.remove_by_source(Path::new("/root/pages/Test.svelte"));
        assert!(removed.is_some());
        assert!(table.is_empty());
        assert!(table
            .remove_by_source(Path::new("/root/pages/Test.svelte"))
            .is_none());
    }
}
