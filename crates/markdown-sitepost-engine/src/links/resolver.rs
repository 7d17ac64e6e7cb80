use regex::Regex;

use crate::tree::Element;

use super::context::ResolutionConfig;
use super::diagnostics::{Diagnostic, DiagnosticSink};
use super::registry::LinkRegistry;
use super::url::{has_scheme, relpath, remove_md, resolve_segments, strip_fragment, url_path};

/// Marker an author adds to a link whose target page does not exist yet.
pub const NOLINK_MARKER: &str = ".nolink";

/// Local directory that replaces the image host when static images are on.
pub const STATIC_IMAGE_DIR: &str = "static/image/";

/// Outcome of rewriting one `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    /// The new `href` in absolute form.
    pub href: String,
    /// The link leaves the site and should open in a new browsing context.
    pub external: bool,
    /// Site path to check against the registry, if the link is internal.
    pub check_path: Option<String>,
}

/// Rewrites links and image sources of one document.
///
/// The registry, when given, is only read. Without one no link is
/// validated or demoted.
pub struct LinkResolver<'a> {
    config: &'a ResolutionConfig,
    registry: Option<&'a dyn LinkRegistry>,
    base_url: String,
    url_base: String,
    url_current: String,
    url_current_base: String,
    image_base: String,
    hosted_image_re: Regex,
}

impl<'a> LinkResolver<'a> {
    pub fn new(config: &'a ResolutionConfig, registry: Option<&'a dyn LinkRegistry>) -> Self {
        let repo = regex::escape(&config.image_repo);
        let hosted_image_re = Regex::new(&format!(
            r"^https?://(?:raw\.github\.com/{repo}/master|github\.com/{repo}/raw)/"
        ))
        .expect("Invalid hosted image regex");

        Self {
            config,
            registry,
            base_url: config.trimmed_base_url().to_string(),
            url_base: config.url_base(),
            url_current: config.url_current(),
            url_current_base: config.url_current_base(),
            image_base: config.image_base(),
            hosted_image_re,
        }
    }

    /// Rewrite every link and image below `root`, reporting validation
    /// findings to `sink`.
    pub fn resolve(&self, root: &mut Element, sink: &mut dyn DiagnosticSink) {
        root.walk_mut(&mut |el: &mut Element| self.adjust(el, sink));
    }

    fn adjust(&self, el: &mut Element, sink: &mut dyn DiagnosticSink) {
        self.to_absolute(el, sink);
        // Links are made absolute first so validation sees canonical paths.
        if self.config.use_relative_link {
            self.to_relative(el);
        }
        self.resolve_image(el);
    }

    fn to_absolute(&self, el: &mut Element, sink: &mut dyn DiagnosticSink) {
        if el.tag != "a" {
            return;
        }
        let Some(href) = el.attr("href").map(str::to_string) else {
            return;
        };

        let rewrite = self.rewrite_link(&href);
        if rewrite.external {
            el.set_attr("target", "_blank");
        }
        if rewrite.href != href {
            log::debug!("{}: {href} -> {}", self.config.full_path, rewrite.href);
            el.set_attr("href", rewrite.href);
        }

        if let (Some(registry), Some(check_path)) = (self.registry, rewrite.check_path) {
            if let Some(diagnostic) = self.validate(registry, &href, &check_path) {
                log::debug!("demoting link {href} in {}", self.config.full_path);
                sink.report(diagnostic);
                el.tag = "span".to_string();
            }
        }
    }

    /// Compute the absolute form of `href` and the path to validate.
    pub fn rewrite_link(&self, href: &str) -> LinkRewrite {
        let extension = &self.config.extension;
        let unchanged = |check_path: Option<String>, external: bool| LinkRewrite {
            href: href.to_string(),
            external,
            check_path,
        };

        if let Some(url_body) = href
            .strip_prefix("http://")
            .or_else(|| href.strip_prefix("https://"))
        {
            return match self.site_relative(url_body) {
                Some(rest) => unchanged(Some(rest.to_string()), false),
                None => unchanged(None, true),
            };
        }

        if href.starts_with('/') {
            return LinkRewrite {
                href: remove_md(&format!("{}{href}", self.base_url), extension),
                external: false,
                check_path: Some(remove_md(href, extension)),
            };
        }

        if href.starts_with('#') {
            let current = remove_md(&self.config.full_path, extension);
            return LinkRewrite {
                href: format!("{}/{current}{href}", self.base_url),
                external: false,
                check_path: Some(format!("/{current}")),
            };
        }

        // mailto:, ftp:, tel:, protocol-relative and other schemes pass through.
        if href.starts_with("//") || has_scheme(href) {
            return unchanged(None, false);
        }

        let joined = resolve_segments(&self.config.base_path, href);
        LinkRewrite {
            href: remove_md(&format!("{}/{joined}", self.base_url), extension),
            external: false,
            check_path: Some(remove_md(&format!("/{joined}"), extension)),
        }
    }

    /// The part of an absolute URL body below `base_url`, when it is on this site.
    fn site_relative<'u>(&self, url_body: &'u str) -> Option<&'u str> {
        let base_body = self
            .base_url
            .split_once("//")
            .map_or(self.base_url.as_str(), |(_, body)| body);
        if base_body.is_empty() {
            return None;
        }

        let rest = url_body.strip_prefix(base_body)?;
        if rest.is_empty() || rest.starts_with(['/', '#', '?']) {
            Some(rest)
        } else {
            None
        }
    }

    fn validate(
        &self,
        registry: &dyn LinkRegistry,
        href: &str,
        check_path: &str,
    ) -> Option<Diagnostic> {
        let check_path = url_path(check_path);
        let document = self.config.full_path.clone();

        if check_path.ends_with(NOLINK_MARKER) {
            let pending = check_path.replace(NOLINK_MARKER, "");
            let page = remove_md(&pending, &self.config.extension);
            if registry.contains(&page) {
                return Some(Diagnostic::StalePending {
                    document,
                    href: href.to_string(),
                    path: page,
                });
            }
            return Some(Diagnostic::CreatablePage {
                document,
                path: pending,
            });
        }

        if registry.contains(check_path) {
            None
        } else {
            Some(Diagnostic::BrokenLink {
                document,
                href: href.to_string(),
                path: check_path.to_string(),
            })
        }
    }

    fn to_relative(&self, el: &mut Element) {
        if el.tag != "a" {
            return;
        }
        let Some(href) = el.attr("href") else {
            return;
        };

        let relative = if strip_fragment(href) == self.url_current {
            href[self.url_current.len()..].to_string()
        } else if href.starts_with(&self.url_base) {
            relpath(href, &self.url_current_base)
        } else {
            return;
        };
        el.set_attr("href", relative);
    }

    fn resolve_image(&self, el: &mut Element) {
        if el.tag != "img" {
            return;
        }
        let Some(src) = el.attr("src") else {
            return;
        };

        let mut resolved = self
            .hosted_image_re
            .replace(src, regex::NoExpand(&self.image_base))
            .into_owned();

        if self.config.use_static_image
            && let Some(rest) = resolved.strip_prefix(&self.image_base)
        {
            let local = format!("{STATIC_IMAGE_DIR}{rest}");
            resolved = if self.config.use_relative_link {
                relpath(&format!("{}{local}", self.url_base), &self.url_current_base)
            } else {
                format!("/{local}")
            };
        }

        if resolved != src {
            log::debug!("{}: image {src} -> {resolved}", self.config.full_path);
            el.set_attr("src", resolved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::registry::PageRegistry;
    use crate::tree::{parse_document, serialize};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn config() -> ResolutionConfig {
        ResolutionConfig {
            base_url: "https://ex.org/".to_string(),
            base_path: "guide/ref".to_string(),
            full_path: "guide/ref/index.md".to_string(),
            ..ResolutionConfig::default()
        }
    }

    fn link(href: &str) -> Element {
        Element::new("div").with_child(Element::new("a").with_attr("href", href).with_text("x"))
    }

    fn resolve(
        config: &ResolutionConfig,
        registry: Option<&dyn LinkRegistry>,
        root: &mut Element,
    ) -> Vec<Diagnostic> {
        let mut sink: Vec<Diagnostic> = vec![];
        LinkResolver::new(config, registry).resolve(root, &mut sink);
        sink
    }

    #[rstest]
    #[case("/guide/intro.md#usage", "https://ex.org/guide/intro#usage", Some("/guide/intro#usage"))]
    #[case("../x/y.md", "https://ex.org/guide/x/y", Some("/guide/x/y"))]
    #[case("./page.md", "https://ex.org/guide/ref/page", Some("/guide/ref/page"))]
    #[case("#top", "https://ex.org/guide/ref/index#top", Some("/guide/ref/index"))]
    #[case("mailto:a@ex.org", "mailto:a@ex.org", None)]
    #[case("https://ex.org/guide/intro", "https://ex.org/guide/intro", Some("/guide/intro"))]
    #[case("https://other.org/page", "https://other.org/page", None)]
    fn rewrites_hrefs(
        #[case] href: &str,
        #[case] expected_href: &str,
        #[case] expected_check: Option<&str>,
    ) {
        let config = config();
        let rewrite = LinkResolver::new(&config, None).rewrite_link(href);

        assert_eq!(rewrite.href, expected_href);
        assert_eq!(rewrite.check_path.as_deref(), expected_check);
    }

    #[rstest]
    #[case("ftp://files.ex.org/a.tar")]
    #[case("tel:+15551234")]
    #[case("javascript:void(0)")]
    #[case("//cdn.ex.org/x.js")]
    fn other_schemes_are_left_alone(#[case] href: &str) {
        let registry = PageRegistry::from_paths(["/guide/intro"]);
        let mut root = link(href);
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        let a = &root.children[0];
        assert_eq!(a.tag, "a");
        assert_eq!(a.attr("href"), Some(href));
        assert_eq!(a.attr("target"), None);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn query_is_ignored_when_validating() {
        let registry = PageRegistry::from_paths(["/guide/intro"]);
        let mut root = link("https://ex.org/guide/intro?x=1#top");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert!(diagnostics.is_empty());
        assert_eq!(root.children[0].tag, "a");
    }

    #[test]
    fn relative_link_from_nested_base() {
        let config = ResolutionConfig {
            base_path: "a/b/c".to_string(),
            full_path: "a/b/c/page.md".to_string(),
            ..config()
        };
        let rewrite = LinkResolver::new(&config, None).rewrite_link("../x/y.md");

        assert_eq!(rewrite.href, "https://ex.org/a/b/x/y");
        assert_eq!(rewrite.check_path.as_deref(), Some("/a/b/x/y"));
    }

    #[test]
    fn extension_is_applied_to_internal_links() {
        let config = ResolutionConfig {
            extension: ".html".to_string(),
            ..config()
        };
        let rewrite = LinkResolver::new(&config, None).rewrite_link("/guide/intro.md#usage");

        assert_eq!(rewrite.href, "https://ex.org/guide/intro.html#usage");
        assert_eq!(rewrite.check_path.as_deref(), Some("/guide/intro.html#usage"));
    }

    #[test]
    fn external_link_opens_in_new_window() {
        let mut root = link("https://other.org/page");
        resolve(&config(), None, &mut root);

        let a = &root.children[0];
        assert_eq!(a.attr("target"), Some("_blank"));
        assert_eq!(a.attr("href"), Some("https://other.org/page"));
    }

    #[test]
    fn lookalike_domain_is_external() {
        let config = ResolutionConfig {
            base_url: "https://ex.org".to_string(),
            ..config()
        };
        let rewrite = LinkResolver::new(&config, None).rewrite_link("https://ex.organic.com/x");
        assert!(rewrite.external);
    }

    #[test]
    fn same_site_absolute_link_is_validated_but_not_rewritten() {
        let registry = PageRegistry::from_paths(["/guide/other"]);
        let mut root = link("http://ex.org/guide/missing");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        let a = &root.children[0];
        assert_eq!(a.tag, "span");
        assert_eq!(a.attr("href"), Some("http://ex.org/guide/missing"));
        assert_eq!(a.attr("target"), None);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::BrokenLink {
                document: "guide/ref/index.md".into(),
                href: "http://ex.org/guide/missing".into(),
                path: "/guide/missing".into(),
            }]
        );
    }

    #[test]
    fn existing_link_stays_a_link() {
        let registry = PageRegistry::from_paths(["/guide/intro"]);
        let mut root = link("/guide/intro.md#usage");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert!(diagnostics.is_empty());
        assert_eq!(root.children[0].tag, "a");
        assert_eq!(
            root.children[0].attr("href"),
            Some("https://ex.org/guide/intro#usage")
        );
    }

    #[test]
    fn broken_link_is_demoted_with_warning() {
        let registry = PageRegistry::from_paths(["/guide/intro"]);
        let mut root = link("missing.md");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert_eq!(root.children[0].tag, "span");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::BrokenLink {
                document: "guide/ref/index.md".into(),
                href: "missing.md".into(),
                path: "/guide/ref/missing".into(),
            }]
        );
    }

    #[test]
    fn pending_link_with_existing_page_warns() {
        let registry = PageRegistry::from_paths(["/a/b"]);
        let mut root = link("/a/b.nolink.md");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert_eq!(root.children[0].tag, "span");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::StalePending {
                document: "guide/ref/index.md".into(),
                href: "/a/b.nolink.md".into(),
                path: "/a/b".into(),
            }]
        );
    }

    #[test]
    fn pending_link_without_page_is_a_notice() {
        let registry = PageRegistry::from_paths(["/somewhere/else"]);
        let mut root = link("/a/b.nolink.md");
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert_eq!(root.children[0].tag, "span");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::CreatablePage {
                document: "guide/ref/index.md".into(),
                path: "/a/b".into(),
            }]
        );
    }

    #[test]
    fn mailto_and_external_links_are_never_validated() {
        let registry = PageRegistry::default();
        let mut root = Element::new("div")
            .with_child(Element::new("a").with_attr("href", "mailto:x@ex.org"))
            .with_child(Element::new("a").with_attr("href", "https://other.org/"));
        let diagnostics = resolve(&config(), Some(&registry), &mut root);

        assert!(diagnostics.is_empty());
        assert!(root.children.iter().all(|a| a.tag == "a"));
    }

    #[test]
    fn without_registry_nothing_is_demoted() {
        let mut root = link("missing.md");
        let diagnostics = resolve(&config(), None, &mut root);

        assert!(diagnostics.is_empty());
        assert_eq!(root.children[0].tag, "a");
    }

    #[test]
    fn relative_mode_rewrites_under_base_path() {
        let config = ResolutionConfig {
            use_relative_link: true,
            ..config()
        };
        let mut root = link("/guide/intro.md#usage");
        resolve(&config, None, &mut root);

        assert_eq!(root.children[0].attr("href"), Some("../intro#usage"));
    }

    #[test]
    fn relative_mode_turns_self_links_into_fragments() {
        let config = ResolutionConfig {
            use_relative_link: true,
            ..config()
        };
        let mut root = Element::new("div")
            .with_child(Element::new("a").with_attr("href", "#top"))
            .with_child(Element::new("a").with_attr("href", "index.md"));
        resolve(&config, None, &mut root);

        assert_eq!(root.children[0].attr("href"), Some("#top"));
        assert_eq!(root.children[1].attr("href"), Some(""));
    }

    #[test]
    fn relative_mode_leaves_demoted_and_external_links() {
        let config = ResolutionConfig {
            use_relative_link: true,
            ..config()
        };
        let registry = PageRegistry::default();
        let mut root = Element::new("div")
            .with_child(Element::new("a").with_attr("href", "/gone.md"))
            .with_child(Element::new("a").with_attr("href", "https://other.org/x"));
        resolve(&config, Some(&registry), &mut root);

        assert_eq!(root.children[0].tag, "span");
        assert_eq!(root.children[0].attr("href"), Some("https://ex.org/gone"));
        assert_eq!(root.children[1].attr("href"), Some("https://other.org/x"));
    }

    fn image(src: &str) -> Element {
        Element::new("p").with_child(Element::new("img").with_attr("src", src))
    }

    #[rstest]
    #[case("https://raw.github.com/cpprefjp/image/master/a/b.png")]
    #[case("https://github.com/cpprefjp/image/raw/a/b.png")]
    #[case("http://github.com/cpprefjp/image/raw/a/b.png")]
    fn hosted_images_are_canonicalized(#[case] src: &str) {
        let mut root = image(src);
        resolve(&config(), None, &mut root);

        assert_eq!(
            root.children[0].attr("src"),
            Some("https://raw.githubusercontent.com/cpprefjp/image/master/a/b.png")
        );
    }

    #[test]
    fn other_images_are_untouched() {
        let mut root = image("https://github.com/someone/else/raw/a.png");
        resolve(&config(), None, &mut root);

        assert_eq!(
            root.children[0].attr("src"),
            Some("https://github.com/someone/else/raw/a.png")
        );
    }

    #[test]
    fn static_images_become_site_absolute() {
        let config = ResolutionConfig {
            use_static_image: true,
            ..config()
        };
        let mut root = image("https://github.com/cpprefjp/image/raw/a/b.png");
        resolve(&config, None, &mut root);

        assert_eq!(root.children[0].attr("src"), Some("/static/image/a/b.png"));
    }

    #[test]
    fn static_images_relative_to_base_path() {
        let config = ResolutionConfig {
            use_static_image: true,
            use_relative_link: true,
            ..config()
        };
        let mut root =
            image("https://raw.githubusercontent.com/cpprefjp/image/master/a/b.png");
        resolve(&config, None, &mut root);

        assert_eq!(
            root.children[0].attr("src"),
            Some("../../static/image/a/b.png")
        );
    }

    #[test]
    fn second_pass_is_a_fixed_point() {
        let config = ResolutionConfig {
            use_static_image: true,
            extension: ".html".to_string(),
            ..config()
        };
        let source = concat!(
            r#"<div><p><a href="/guide/intro.md#usage">a</a> <a href="../x.md">b</a> "#,
            r##"<a href="#top">c</a> <a href="mailto:m@ex.org">d</a> "##,
            r#"<a href="https://other.org/">e</a> "#,
            r#"<img src="https://github.com/cpprefjp/image/raw/p.png" /></p></div>"#
        );
        let mut root = parse_document(source).unwrap();

        resolve(&config, None, &mut root);
        let once = serialize(&root);
        resolve(&config, None, &mut root);
        let twice = serialize(&root);

        assert_eq!(once, twice);
        assert!(once.contains(r#"href="https://ex.org/guide/intro.html#usage""#));
        assert!(once.contains(r#"src="/static/image/p.png""#));
    }
}
