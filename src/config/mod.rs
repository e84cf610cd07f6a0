//! Configuration module - site settings and theme tokens

mod site;
mod theme;

pub use site::{is_section_name, HighlightConfig, HomeConfig, SectionConfig, SiteConfig};
pub use theme::{PageColors, ThemeConfig, Typography, TypographyRules, PROSE_CLASS};
