//! Site navigation menu

use serde::Serialize;

use crate::config::SiteConfig;
use crate::helpers::{collection_url, url_for};

/// Where the page being rendered sits in the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    Home,
    Section(&'a str),
    /// Pages outside any section, such as the not-found page
    Elsewhere,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub title: String,
    pub href: String,
    pub active: bool,
}

/// Home followed by every configured section
pub fn navigation_menu(config: &SiteConfig, location: Location<'_>) -> Vec<NavItem> {
    let home = NavItem {
        title: "Home".to_string(),
        href: url_for(config, ""),
        active: location == Location::Home,
    };

    std::iter::once(home)
        .chain(config.sections.iter().map(|(key, section)| NavItem {
            title: section.title.clone(),
            href: collection_url(config, key),
            active: location == Location::Section(key),
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionConfig;

    #[test]
    fn test_active_section() {
        let mut config = SiteConfig::default();
        config.sections.insert(
            "notes".to_string(),
            SectionConfig {
                title: "Notes".to_string(),
                description: String::new(),
            },
        );

        let menu = navigation_menu(&config, Location::Section("notes"));
        let summary: Vec<_> = menu
            .iter()
            .map(|i| (i.title.as_str(), i.href.as_str(), i.active))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Home", "/", false),
                ("Blog", "/blog", false),
                ("Notes", "/notes", true),
            ]
        );

        let nothing_active = navigation_menu(&config, Location::Elsewhere);
        assert!(nothing_active.iter().all(|i| !i.active));
    }
}
