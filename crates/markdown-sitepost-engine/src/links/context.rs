use markdown_sitepost_config::Config;
use relative_path::RelativePath;

/// Settings for resolving the links of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    /// Site root URL; leading and trailing slashes are stripped on use.
    pub base_url: String,
    /// Site-relative directory of the current document.
    pub base_path: String,
    /// Site-relative path of the current document, with its `.md` suffix.
    pub full_path: String,
    /// Appended to internal links once `.md` is removed. May be empty.
    pub extension: String,
    pub use_relative_link: bool,
    /// `owner/name` of the repository hosting images.
    pub image_repo: String,
    pub use_static_image: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            base_path: String::new(),
            full_path: String::new(),
            extension: String::new(),
            use_relative_link: false,
            image_repo: "cpprefjp/image".to_string(),
            use_static_image: false,
        }
    }
}

impl ResolutionConfig {
    /// Settings for the page at `full_path` (site-relative, `.md` suffix).
    ///
    /// `base_path` becomes the directory holding the page.
    pub fn for_document(site: &Config, full_path: &str) -> Self {
        let full_path = full_path.trim_start_matches('/');
        let base_path = RelativePath::new(full_path)
            .parent()
            .map(|parent| parent.as_str().to_string())
            .unwrap_or_default();

        Self {
            base_url: site.base_url.clone(),
            base_path,
            full_path: full_path.to_string(),
            extension: site.extension.clone(),
            use_relative_link: site.use_relative_link,
            image_repo: site.image_repo.clone(),
            use_static_image: site.use_static_image,
        }
    }

    /// `base_url` without surrounding slashes.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_matches('/')
    }

    /// `base_url` with exactly one trailing slash.
    pub fn url_base(&self) -> String {
        format!("{}/", self.trimmed_base_url())
    }

    /// Absolute URL of the current document, `.md` removed.
    pub fn url_current(&self) -> String {
        format!(
            "{}{}",
            self.url_base(),
            super::url::remove_md(&self.full_path, &self.extension)
        )
    }

    /// Absolute URL of the current document's directory.
    pub fn url_current_base(&self) -> String {
        format!("{}{}", self.url_base(), self.base_path.trim_matches('/'))
    }

    /// Prefix of images hosted in `image_repo`, in canonical form.
    pub fn image_base(&self) -> String {
        format!("https://raw.githubusercontent.com/{}/master/", self.image_repo)
    }
}
