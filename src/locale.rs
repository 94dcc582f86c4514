//! Localized "exercise not found" text.

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

const BUILTIN: &[(&str, &str)] = &[
    ("en", "Exercise not found"),
    ("es", "Ejercicio no encontrado"),
    ("fr", "Exercice introuvable"),
    ("de", "Übung nicht gefunden"),
    ("pt", "Exercício não encontrado"),
];

#[derive(Debug, Clone)]
pub struct Locales {
    messages: HashMap<String, String>,
    default_lang: String,
}

impl Default for Locales {
    fn default() -> Self {
        Self::new(DEFAULT_LANG)
    }
}

impl Locales {
    /// The built-in table with the given fallback language.
    pub fn new(default_lang: impl Into<String>) -> Self {
        Self {
            messages: BUILTIN
                .iter()
                .map(|(lang, text)| (lang.to_string(), text.to_string()))
                .collect(),
            default_lang: normalize(&default_lang.into()),
        }
    }

    /// Adds or replaces the text for a language.
    pub fn with_message(mut self, lang: &str, text: impl Into<String>) -> Self {
        self.messages.insert(normalize(lang), text.into());
        self
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Exact code, then primary subtag (`es-MX` to `es`), then the default
    /// language, then English.
    pub fn not_found(&self, lang: Option<&str>) -> &str {
        let requested = lang.map(normalize);
        let primary = requested
            .as_deref()
            .and_then(|code| code.split(['-', '_']).next())
            .map(str::to_string);

        [requested, primary, Some(self.default_lang.clone())]
            .into_iter()
            .flatten()
            .find_map(|code| self.messages.get(&code))
            .map(String::as_str)
            .unwrap_or(BUILTIN[0].1)
    }
}

fn normalize(lang: &str) -> String {
    lang.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_through_subtag_and_default() {
        let locales = Locales::default();
        assert_eq!(locales.not_found(Some("es")), "Ejercicio no encontrado");
        assert_eq!(locales.not_found(Some("es-MX")), "Ejercicio no encontrado");
        assert_eq!(locales.not_found(Some("PT_br")), "Exercício não encontrado");
        assert_eq!(locales.not_found(Some("ja")), "Exercise not found");
        assert_eq!(locales.not_found(None), "Exercise not found");
    }

    #[test]
    fn overrides_and_default_language() {
        let locales = Locales::new("fr").with_message("it", "Esercizio non trovato");
        assert_eq!(locales.not_found(Some("it")), "Esercizio non trovato");
        assert_eq!(locales.not_found(Some("ja")), "Exercice introuvable");
        let unknown_default = Locales::new("xx");
        assert_eq!(unknown_default.not_found(None), "Exercise not found");
    }
}
