//! Static resources shared by commands and handlers.

use serenity::all::Colour;

pub mod colors {
    use super::Colour;

    pub const MAIN: Colour = Colour::new(0x7289DA);
    pub const SUCCESS: Colour = Colour::new(0x57F287);
    pub const ERROR: Colour = Colour::new(0xED4245);
    pub const WARNING: Colour = Colour::new(0xFEE75C);
    pub const JOIN_LOG: Colour = Colour::new(0x3BA55C);
    pub const LEAVE_LOG: Colour = Colour::new(0xE67E22);
}

pub mod emojis {
    pub const PLAY: &str = "▶️";
    pub const PAUSE: &str = "⏸️";
    pub const SKIP: &str = "⏭️";
    pub const PREVIOUS: &str = "⏮️";
    pub const STOP: &str = "⏹️";
    pub const VOLUME_UP: &str = "🔊";
    pub const VOLUME_DOWN: &str = "🔉";
    pub const LOOP: &str = "🔁";
    pub const SHUFFLE: &str = "🔀";
}

/// A locale guilds can switch to.
#[derive(Debug, Clone, Copy)]
pub struct Locale {
    pub code: &'static str,
    pub name: &'static str,
    pub native: &'static str,
}

pub const LOCALES: &[Locale] = &[
    Locale { code: "en-US", name: "English", native: "English" },
    Locale { code: "pt-BR", name: "Portuguese", native: "Português" },
    Locale { code: "es-ES", name: "Spanish", native: "Español" },
    Locale { code: "fr", name: "French", native: "Français" },
    Locale { code: "de", name: "German", native: "Deutsch" },
    Locale { code: "hi", name: "Hindi", native: "हिन्दी" },
    Locale { code: "ja", name: "Japanese", native: "日本語" },
    Locale { code: "tr", name: "Turkish", native: "Türkçe" },
];

pub fn find_locale(code: &str) -> Option<&'static Locale> {
    LOCALES
        .iter()
        .find(|locale| locale.code.eq_ignore_ascii_case(code))
}

/// Locales whose code, English name or native name contain `query`.
pub fn search_locales(query: &str) -> impl Iterator<Item = &'static Locale> + '_ {
    let query = query.to_lowercase();
    LOCALES.iter().filter(move |locale| {
        query.is_empty()
            || locale.code.to_lowercase().contains(&query)
            || locale.name.to_lowercase().contains(&query)
            || locale.native.to_lowercase().contains(&query)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_lookup_ignores_case() {
        assert_eq!(find_locale("PT-br").map(|l| l.name), Some("Portuguese"));
        assert!(find_locale("xx").is_none());
    }

    #[test]
    fn locale_search_matches_native_names() {
        let found: Vec<_> = search_locales("españ").map(|l| l.code).collect();
        assert_eq!(found, vec!["es-ES"]);
        assert_eq!(search_locales("").count(), LOCALES.len());
    }
}
