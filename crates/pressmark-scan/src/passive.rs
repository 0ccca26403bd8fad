//! Passive page heuristics.
//!
//! String matching over an already-fetched homepage; no network I/O
//! happens here. The hints are weaker than hash evidence and are
//! reported separately: a `?ver=` query string is routinely wrong on
//! sites that bump it for cache busting.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

fn generator_meta() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<meta\s+name=["']generator["']\s+content=["']([^"']+)["']"#)
            .expect("valid regex")
    })
}

fn feed_generator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<generator[^>]*>([^<]+)</generator>").expect("valid regex"))
}

fn wordpress_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)wordpress(?:\s+|/|\.org/\?v=)([0-9]+\.[0-9]+(?:\.[0-9]+)?)")
            .expect("valid regex")
    })
}

fn plugin_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)/wp-content/plugins/([^/"'?]+)/[^"']*?(?:\?ver=([0-9]+\.[0-9]+(?:\.[0-9]+)?))?["']"#)
            .expect("valid regex")
    })
}

fn theme_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)/wp-content/themes/([^/"'?]+)/[^"']*?(?:\?ver=([0-9]+\.[0-9]+(?:\.[0-9]+)?))?["']"#)
            .expect("valid regex")
    })
}

/// A component mentioned by the page markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassiveHit {
    /// Component slug as it appears in the asset path
    pub slug: String,

    /// Version from a `?ver=` query string, when one was present
    pub version: Option<String>,
}

/// Everything the homepage markup gave away
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageHints {
    /// Core version from a generator tag, if advertised
    pub core_version: Option<String>,

    /// Plugins referenced by asset paths
    pub plugins: Vec<PassiveHit>,

    /// Themes referenced by asset paths
    pub themes: Vec<PassiveHit>,
}

impl PageHints {
    /// True if the page gave away nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core_version.is_none() && self.plugins.is_empty() && self.themes.is_empty()
    }
}

/// Extract component hints from homepage HTML
#[must_use]
pub fn inspect_page(html: &str) -> PageHints {
    PageHints {
        core_version: core_version(html),
        plugins: collect_hits(plugin_path(), html),
        themes: collect_hits(theme_path(), html),
    }
}

fn core_version(html: &str) -> Option<String> {
    for re in [generator_meta(), feed_generator()] {
        for caps in re.captures_iter(html) {
            let content = caps.get(1)?.as_str();
            if let Some(version) = wordpress_version()
                .captures(content)
                .and_then(|c| c.get(1))
            {
                return Some(version.as_str().to_string());
            }
        }
    }
    None
}

fn collect_hits(re: &Regex, html: &str) -> Vec<PassiveHit> {
    // keyed by slug; a hit with a version beats one without
    let mut hits: BTreeMap<String, Option<String>> = BTreeMap::new();

    for caps in re.captures_iter(html) {
        let Some(slug) = caps.get(1) else { continue };
        let version = caps.get(2).map(|m| m.as_str().to_string());

        let entry = hits.entry(slug.as_str().to_string()).or_default();
        if entry.is_none() {
            *entry = version;
        }
    }

    hits.into_iter()
        .map(|(slug, version)| PassiveHit { slug, version })
        .collect()
}
