//! Name canonicalization for cross-source matching. Two spellings of the same
//! player that differ only by accents, case, or punctuation must normalize to
//! the same key, so the key is the join column the sources never shared.

/// Normalizes a personal name into a matching key: accented Latin letters are
/// folded to their ASCII base, everything is lowercased, every character that
/// is not a lowercase letter or space is stripped, and whitespace runs are
/// collapsed. Total over any input and idempotent; the result matches
/// `[a-z ]*`.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        for lower in c.to_lowercase() {
            let folded = fold_accent(lower);
            if folded.is_ascii_lowercase() {
                out.push(folded);
            } else if folded.is_whitespace() {
                out.push(' ');
            }
            // Anything else (digits, punctuation, non-Latin scripts,
            // non-decomposable letters like 'ø') is dropped.
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Variant used on identity fields contaminated with jersey numbers
/// ("23 LeBron James"): digits are stripped before the standard pipeline.
pub fn normalize_name_no_digits(raw: &str) -> String {
    let without_digits: String = raw.chars().filter(|c| !c.is_ascii_digit()).collect();
    normalize_name(&without_digits)
}

/// Collapses a key to its spaceless form. URL slugs ("lebronjames") carry no
/// word boundaries, so slug-derived keys are compared space-free.
pub fn spaceless(key: &str) -> String {
    key.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Maps an accented lowercase Latin letter to its ASCII base letter, mirroring
/// NFD decomposition followed by dropping the combining marks. Letters that do
/// not decompose to an ASCII base ('ø', 'ł', 'đ', 'æ', 'ß') are left as-is and
/// dropped by the caller's ASCII filter.
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_case_and_punctuation_collapse_to_one_key() {
        assert_eq!(normalize_name("José Ángel"), "jose angel");
        assert_eq!(normalize_name("jose angel"), "jose angel");
        assert_eq!(normalize_name("Nikola Jokić"), "nikola jokic");
        assert_eq!(normalize_name("Luka Dončić"), "luka doncic");
        assert_eq!(normalize_name("Kristaps Porziņģis"), "kristaps porzingis");
        assert_eq!(normalize_name("Jonas Valančiūnas"), "jonas valanciunas");
        assert_eq!(normalize_name("Dennis Schröder"), "dennis schroder");
        assert_eq!(normalize_name("D'Angelo Russell"), "dangelo russell");
        assert_eq!(normalize_name("Kevin McCullar Jr."), "kevin mccullar jr");
    }

    #[test]
    fn normalization_is_total_and_idempotent() {
        for raw in [
            "",
            "   ",
            "LeBron James",
            "勒布朗-詹姆斯",
            "G.G. Jackson II",
            "Olivier-Maxence Prosper",
            "№ 23 !!",
        ] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {raw:?}");
            assert!(
                once.chars().all(|c| c.is_ascii_lowercase() || c == ' '),
                "bad charset for {raw:?}: {once:?}"
            );
            assert_eq!(once.trim(), once);
        }
    }

    #[test]
    fn digits_are_always_stripped() {
        assert_eq!(normalize_name("23 LeBron James"), "lebron james");
        assert_eq!(normalize_name_no_digits("LeBron James #23"), "lebron james");
        assert_eq!(normalize_name_no_digits("0 Jayson Tatum"), "jayson tatum");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(normalize_name("  Stephen   Curry  "), "stephen curry");
        assert_eq!(normalize_name("Karl-Anthony Towns"), "karlanthony towns");
    }

    #[test]
    fn spaceless_form_matches_url_slugs() {
        assert_eq!(spaceless(&normalize_name("LeBron James")), "lebronjames");
        assert_eq!(spaceless(&normalize_name("lebronjames")), "lebronjames");
    }

    #[test]
    fn non_decomposable_letters_are_dropped() {
        // Mirrors NFD + ASCII filter: 'ø' has no ASCII decomposition
        assert_eq!(normalize_name("Bjørn"), "bjrn");
    }
}
