//! Light/dark theme selection.

use std::fmt;

use crate::store::Storage;

/// Local storage key remembering the visitor's choice.
pub const THEME_KEY: &str = "color-theme";

/// Class set on the root element while the dark theme is active.
pub const DARK_CLASS: &str = "dark";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// The theme to show on load: the saved choice, else the system preference.
    pub fn resolve(saved: Option<&str>, prefers_dark: bool) -> Self {
        match saved {
            Some("dark") => Theme::Dark,
            Some("light") => Theme::Light,
            _ if prefers_dark => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// Resolve from storage.
    pub fn load(store: &impl Storage, prefers_dark: bool) -> Self {
        Self::resolve(store.get(THEME_KEY).as_deref(), prefers_dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Switch theme and remember the choice.
    pub fn toggle(self, store: &mut impl Storage) -> Self {
        let next = self.toggled();
        store.set(THEME_KEY, next.to_string());
        next
    }

    /// Root element class for this theme, if any.
    pub fn root_class(self) -> Option<&'static str> {
        match self {
            Theme::Dark => Some(DARK_CLASS),
            Theme::Light => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}
