//! Persisted UI preferences.
//!
//! SYSTEM CONTEXT
//! ==============
//! Small per-browser settings that survive reloads: display language, the
//! remember-me username, the new-post editor toggle, and sticky header/footer
//! pins. Each lives under its own storage key.

#[cfg(test)]
#[path = "prefs_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persist::bridge::{PersistError, load_slice, save_slice};
use crate::persist::storage::{
    I18N_LANGUAGE_KEY, KeyValueStore, LANGUAGE_KEY, REMEMBER_ME_KEY, SHOW_NEW_BOARD_KEY, USERNAME_KEY, pin_key,
};

/// Sticky regions whose pin state is remembered.
pub const PIN_NAMES: [&str; 2] = ["header", "footer"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

impl Language {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefs {
    pub language: Language,
    /// Language handed to the translation layer; follows `language` unless set.
    pub i18n_language: Language,
    pub remember_me: bool,
    /// Username prefilled on the login form when `remember_me` is on.
    pub remembered_username: Option<String>,
    pub show_new_board: bool,
    pub pins: BTreeMap<String, bool>,
}

impl Prefs {
    /// Read every preference, falling back to defaults per key.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let language = load_slice(store, LANGUAGE_KEY).unwrap_or_default();
        let pins = PIN_NAMES
            .iter()
            .filter_map(|name| load_slice::<bool, _>(store, &pin_key(name)).map(|pinned| ((*name).to_owned(), pinned)))
            .collect();
        Self {
            language,
            i18n_language: load_slice(store, I18N_LANGUAGE_KEY).unwrap_or(language),
            remember_me: load_slice(store, REMEMBER_ME_KEY).unwrap_or(false),
            remembered_username: load_slice(store, USERNAME_KEY),
            show_new_board: load_slice(store, SHOW_NEW_BOARD_KEY).unwrap_or(false),
            pins,
        }
    }

    /// Write every preference. The username is only kept while remember-me is on.
    ///
    /// # Errors
    ///
    /// Returns the first [`PersistError`] encountered.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), PersistError> {
        save_slice(store, LANGUAGE_KEY, &self.language)?;
        save_slice(store, I18N_LANGUAGE_KEY, &self.i18n_language)?;
        save_slice(store, REMEMBER_ME_KEY, &self.remember_me)?;
        save_slice(store, SHOW_NEW_BOARD_KEY, &self.show_new_board)?;
        match (&self.remembered_username, self.remember_me) {
            (Some(username), true) => save_slice(store, USERNAME_KEY, username)?,
            _ => store.remove_item(USERNAME_KEY)?,
        }
        for (name, pinned) in &self.pins {
            let raw = if *pinned { "true" } else { "false" };
            store.set_item(&pin_key(name), raw)?;
        }
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.i18n_language = language;
    }

    /// Record a pin flag. Returns `false` for regions outside [`PIN_NAMES`].
    pub fn set_pin(&mut self, name: &str, pinned: bool) -> bool {
        if !PIN_NAMES.contains(&name) {
            return false;
        }
        self.pins.insert(name.to_owned(), pinned);
        true
    }

    #[must_use]
    pub fn is_pinned(&self, name: &str) -> bool {
        self.pins.get(name).copied().unwrap_or(false)
    }
}
