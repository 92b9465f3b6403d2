use serde::Serialize;

pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub template_dir: &'static str,
    pub stylesheet: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme {
        name: DEFAULT_THEME,
        template_dir: "templates/themes/default",
        stylesheet: "/static/themes/default/style.css",
    },
    Theme {
        name: "minimal",
        template_dir: "templates/themes/minimal",
        stylesheet: "/static/themes/minimal/style.css",
    },
];

pub fn find_theme(name: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.name == name)
}

/// Unknown names get the default theme
pub fn get_theme(name: &str) -> &'static Theme {
    find_theme(name).unwrap_or(&THEMES[0])
}
