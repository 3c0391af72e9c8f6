//! Name normalization
//!
//! The JSON exports carry no shared keys for people: matches, decisions,
//! web image metadata and academician records only agree on a free-text
//! name. `normalize_name` turns such a name into the comparison key used
//! for every join in the dataset.
//!
//! There is no collision detection. Two different people whose names
//! normalize to the same key cannot be told apart.

/// Academic title tokens removed from names, compared after folding.
const TITLE_TOKENS: &[&str] = &["PROF.", "DR.", "ARS.", "GOR.", "DOC."];

/// Field values that are spreadsheet header or sheet labels, not data.
const HEADER_TOKENS: &[&str] = &[
    "academician_name",
    "data",
    "sheet1",
    "column1",
    "matches",
    "project_id",
    "column3",
    "column",
];

/// Canonical comparison key for a personal name.
///
/// Uppercases, folds Turkish diacritics to ASCII, strips academic titles
/// and collapses whitespace. Diacritics are folded before titles are
/// removed so that `Doç.` and `Arş. Gör.` are caught as well.
///
/// ```
/// use portal_common::normalize::normalize_name;
///
/// assert_eq!(normalize_name("Prof. Dr. Ahmet Şen"), "AHMET SEN");
/// assert_eq!(normalize_name("ahmet   sen"), "AHMET SEN");
/// ```
pub fn normalize_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut folded: String = trimmed
        .to_uppercase()
        .chars()
        .filter_map(fold_char)
        .collect();

    // Removing one token can join the pieces of another ("PRDR.OF.").
    loop {
        let before = folded.len();
        for token in TITLE_TOKENS {
            if folded.contains(token) {
                folded = folded.replace(token, "");
            }
        }
        if folded.len() == before {
            break;
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Optional-input convenience used when reading loosely typed records.
pub fn normalize_opt(input: Option<&str>) -> String {
    input.map(normalize_name).unwrap_or_default()
}

fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'İ' | 'ı' | 'Î' => 'I',
        'Ğ' | 'ğ' => 'G',
        'Ü' | 'ü' | 'Û' => 'U',
        'Ş' | 'ş' => 'S',
        'Ö' | 'ö' => 'O',
        'Ç' | 'ç' => 'C',
        'Â' => 'A',
        // combining dot above, left behind by some decomposed "i̇"
        '\u{0307}' => return None,
        other => other,
    };
    Some(folded)
}

/// Whether a cell value is a leaked header or sheet label.
pub fn is_header_token(value: &str) -> bool {
    let trimmed = value.trim();
    HEADER_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(trimmed))
}
