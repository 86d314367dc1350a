//! Coarse region detection from locale and timezone.
//!
//! This only decides which regional mirrors join the official ones in the
//! probe set, so a wrong guess costs a few extra probes and nothing else.

use droidenv_schema::Region;

/// Locale hints read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSignals {
    /// `LC_ALL` or `LANG`, e.g. `zh_CN.UTF-8`.
    pub lang: Option<String>,
    /// `TZ`, e.g. `Europe/Berlin`.
    pub tz: Option<String>,
}

impl LocaleSignals {
    /// Read `LC_ALL` (falling back to `LANG`) and `TZ`, ignoring empty values.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            lang: non_empty("LC_ALL").or_else(|| non_empty("LANG")),
            tz: non_empty("TZ"),
        }
    }
}

const CHINA_ZONES: &[&str] = &[
    "Asia/Shanghai",
    "Asia/Chongqing",
    "Asia/Chungking",
    "Asia/Harbin",
    "Asia/Urumqi",
    "Asia/Kashgar",
    "PRC",
];

const EUROPE_LANGS: &[&str] = &[
    "de", "fr", "es", "it", "nl", "pl", "pt_PT", "sv", "fi", "da", "nb", "nn", "no", "cs", "sk",
    "hu", "ro", "el", "bg", "hr", "sl", "et", "lv", "lt", "uk", "en_GB", "en_IE", "ca", "is",
];

const ASIA_LANGS: &[&str] = &[
    "ja", "ko", "zh_TW", "zh_HK", "hi", "bn", "ta", "te", "mr", "th", "vi", "id", "ms", "fil",
    "en_IN", "en_SG",
];

/// Classify the signals into a region. The timezone is consulted first since
/// it is the more specific hint; anything unrecognised is [`Region::Global`].
pub fn detect_region(signals: &LocaleSignals) -> Region {
    signals
        .tz
        .as_deref()
        .and_then(region_from_tz)
        .or_else(|| signals.lang.as_deref().and_then(region_from_lang))
        .unwrap_or_default()
}

fn region_from_tz(tz: &str) -> Option<Region> {
    let tz = tz.trim().trim_start_matches(':');
    if CHINA_ZONES.contains(&tz) {
        Some(Region::China)
    } else if tz.starts_with("Europe/") {
        Some(Region::Europe)
    } else if tz.starts_with("Asia/") {
        Some(Region::Asia)
    } else {
        None
    }
}

fn region_from_lang(lang: &str) -> Option<Region> {
    // zh_CN.UTF-8@pinyin -> zh_CN
    let locale = lang.split(['.', '@']).next().unwrap_or_default().trim();
    let language = locale.split(['_', '-']).next().unwrap_or_default();
    let locale = locale.replace('-', "_");

    let matches = |table: &[&str]| table.iter().any(|t| *t == locale || *t == language);

    if locale == "zh_CN" || locale == "zh_SG" || locale == "zh" {
        Some(Region::China)
    } else if matches(ASIA_LANGS) {
        Some(Region::Asia)
    } else if matches(EUROPE_LANGS) {
        Some(Region::Europe)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(lang: Option<&str>, tz: Option<&str>) -> LocaleSignals {
        LocaleSignals {
            lang: lang.map(str::to_string),
            tz: tz.map(str::to_string),
        }
    }

    #[test]
    fn test_china_from_either_signal() {
        assert_eq!(detect_region(&signals(Some("zh_CN.UTF-8"), None)), Region::China);
        assert_eq!(detect_region(&signals(None, Some("Asia/Shanghai"))), Region::China);
    }

    #[test]
    fn test_timezone_wins_over_language() {
        assert_eq!(
            detect_region(&signals(Some("en_US.UTF-8"), Some("Europe/Berlin"))),
            Region::Europe
        );
        assert_eq!(
            detect_region(&signals(Some("de_DE.UTF-8"), Some("Asia/Tokyo"))),
            Region::Asia
        );
    }

    #[test]
    fn test_regional_languages() {
        assert_eq!(detect_region(&signals(Some("ja_JP.UTF-8"), None)), Region::Asia);
        assert_eq!(detect_region(&signals(Some("zh_TW"), None)), Region::Asia);
        assert_eq!(detect_region(&signals(Some("fr_FR"), None)), Region::Europe);
        assert_eq!(detect_region(&signals(Some("en-GB"), None)), Region::Europe);
    }

    #[test]
    fn test_unknown_falls_back_to_global() {
        assert_eq!(detect_region(&LocaleSignals::default()), Region::Global);
        assert_eq!(detect_region(&signals(Some("C"), Some("UTC"))), Region::Global);
        assert_eq!(
            detect_region(&signals(Some("en_US.UTF-8"), Some("America/New_York"))),
            Region::Global
        );
        assert_eq!(detect_region(&signals(Some("garbage"), Some("Nowhere/Else"))), Region::Global);
    }
}
