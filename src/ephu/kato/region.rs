//! Two-digit KATO prefix → region folder lookup.

/// Folder used for codes whose prefix is not in [`REGION_CODES`].
pub const OTHER_REGION: &str = "Прочее";

/// Region display names keyed by the first two digits of a KATO code.
pub const REGION_CODES: [(&str, &str); 20] = [
    ("11", "Акмолинская"),
    ("15", "Актюбинская"),
    ("19", "Алматинская"),
    ("23", "Атырауская"),
    ("63", "Восточно-Казахстанская"),
    ("71", "Астана"),
    ("75", "Алматы"),
    ("79", "Шымкент"),
    ("31", "Жамбылская"),
    ("27", "Западно-Казахстанская"),
    ("35", "Карагандинская"),
    ("39", "Костанайская"),
    ("43", "Кызылордиснкая"),
    ("47", "Мангистауская"),
    ("10", "область Абай"),
    ("33", "область Жетісу"),
    ("62", "область Ұлытау"),
    ("55", "Павлодарская"),
    ("59", "Северо-Казахстанская"),
    ("61", "Туркестанская"),
];

/// Resolves the region folder name for a code.
pub fn region_for(code: &str) -> &'static str {
    let prefix: String = code.chars().take(2).collect();
    REGION_CODES
        .iter()
        .find(|(key, _)| *key == prefix)
        .map(|(_, name)| *name)
        .unwrap_or(OTHER_REGION)
}
