//! Theme tokens and the stylesheet generated from them
//!
//! The palette becomes CSS custom properties plus `bg-*` / `text-*`
//! utility classes (with `dark:` variants active under `html.dark`).
//! Typography rules style rendered markdown inside `.prose`, once for the
//! light theme and once, inverted, for the dark one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// CSS declarations keyed by selector, e.g. `"p code" -> {"padding": "0.25rem"}`
pub type TypographyRules = IndexMap<String, IndexMap<String, String>>;

/// Class wrapping rendered markdown
pub const PROSE_CLASS: &str = "prose";

/// Styling tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Named colours, referenced elsewhere as `colors.<name>`
    pub colors: IndexMap<String, String>,
    #[serde(default)]
    pub page: PageColors,
    #[serde(default)]
    pub typography: Typography,
}

/// Which palette entries colour the page chrome in each mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageColors {
    pub background: String,
    pub text: String,
    pub accent: String,
    pub dark_background: String,
    pub dark_text: String,
    pub dark_accent: String,
}

impl Default for PageColors {
    fn default() -> Self {
        Self {
            background: "outone".to_string(),
            text: "outtext".to_string(),
            accent: "outa".to_string(),
            dark_background: "doutone".to_string(),
            dark_text: "douttext".to_string(),
            dark_accent: "douta".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    /// Light mode rules
    pub default: TypographyRules,
    /// Dark mode overrides
    pub invert: TypographyRules,
}

fn rules(entries: Vec<(&str, Vec<(&str, &str)>)>) -> TypographyRules {
    entries
        .into_iter()
        .map(|(selector, decls)| {
            let decls = decls
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (selector.to_string(), decls)
        })
        .collect()
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            default: rules(vec![
                (
                    "h1",
                    vec![
                        ("font-weight", "700"),
                        ("font-size", "2.25rem"),
                        ("margin-bottom", "0.5rem"),
                    ],
                ),
                (
                    "h2",
                    vec![
                        ("font-weight", "700"),
                        ("font-size", "1.5rem"),
                        ("margin-top", "2rem"),
                        ("margin-bottom", "0.5rem"),
                    ],
                ),
                (
                    "h3",
                    vec![
                        ("font-weight", "700"),
                        ("font-size", "1.25rem"),
                        ("margin-top", "1.5rem"),
                        ("margin-bottom", "0.5rem"),
                    ],
                ),
                (
                    "p",
                    vec![
                        ("color", "colors.outtext"),
                        ("line-height", "1.625"),
                        ("margin-bottom", "1rem"),
                    ],
                ),
                (
                    "p code",
                    vec![
                        ("font-style", "italic"),
                        ("border-radius", "0.125rem"),
                        ("padding", "0.25rem"),
                    ],
                ),
                (
                    "pre",
                    vec![
                        ("color", "colors.douta"),
                        ("line-height", "1.625"),
                        ("margin-bottom", "0.5rem"),
                        ("padding", "1rem"),
                        ("overflow-x", "auto"),
                    ],
                ),
            ]),
            invert: rules(vec![
                ("p", vec![("color", "colors.douttext")]),
                ("p code", vec![("background-color", "colors.doutp")]),
                (
                    "pre",
                    vec![
                        ("color", "colors.douta"),
                        ("background-color", "colors.doutp"),
                    ],
                ),
            ]),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let colors = [
            ("outone", "#E8E1D9"),
            ("outtext", "#5C4B3F"),
            ("outp", "#BDB2A5"),
            ("outs", "#A7A9AC"),
            ("outa", "#FA4616"),
            ("doutone", "#404241"),
            ("douttext", "#E5E8E3"),
            ("doutp", "#2D3033"),
            ("douts", "#767A7B"),
            ("douta", "#60625B"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            colors,
            page: PageColors::default(),
            typography: Typography::default(),
        }
    }
}

impl ThemeConfig {
    /// Turn a token value into CSS. `colors.<name>` becomes a custom
    /// property reference; anything else is passed through.
    fn resolve(&self, value: &str) -> String {
        match value.strip_prefix("colors.") {
            Some(name) if self.colors.contains_key(name) => color_var(name),
            Some(name) => {
                tracing::warn!("Theme references unknown colour {:?}", name);
                "inherit".to_string()
            }
            None => value.to_string(),
        }
    }

    fn write_rules(&self, css: &mut String, scope: &str, rules: &TypographyRules) {
        for (selector, decls) in rules {
            let _ = writeln!(css, "{} .{} {} {{", scope, PROSE_CLASS, selector);
            for (property, value) in decls {
                let _ = writeln!(css, "  {}: {};", property, self.resolve(value));
            }
            css.push_str("}\n");
        }
    }

    /// Render the full stylesheet
    pub fn stylesheet(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.colors {
            let _ = writeln!(css, "  --color-{}: {};", name, value);
        }
        css.push_str("}\n\n");

        let page = &self.page;
        let _ = writeln!(
            css,
            "body {{\n  background-color: {};\n  color: {};\n}}\na {{ color: {}; }}",
            self.resolve(&format!("colors.{}", page.background)),
            self.resolve(&format!("colors.{}", page.text)),
            self.resolve(&format!("colors.{}", page.accent)),
        );
        let _ = writeln!(
            css,
            "html.dark body {{\n  background-color: {};\n  color: {};\n}}\nhtml.dark a {{ color: {}; }}\n",
            self.resolve(&format!("colors.{}", page.dark_background)),
            self.resolve(&format!("colors.{}", page.dark_text)),
            self.resolve(&format!("colors.{}", page.dark_accent)),
        );

        for name in self.colors.keys() {
            let var = color_var(name);
            let _ = writeln!(css, ".bg-{} {{ background-color: {}; }}", name, var);
            let _ = writeln!(css, ".text-{} {{ color: {}; }}", name, var);
            let _ = writeln!(css, "html.dark .dark\\:bg-{} {{ background-color: {}; }}", name, var);
            let _ = writeln!(css, "html.dark .dark\\:text-{} {{ color: {}; }}", name, var);
        }
        css.push('\n');

        self.write_rules(&mut css, "", &self.typography.default);
        self.write_rules(&mut css, "html.dark", &self.typography.invert);

        css
    }
}

fn color_var(name: &str) -> String {
    format!("var(--color-{})", name)
}
