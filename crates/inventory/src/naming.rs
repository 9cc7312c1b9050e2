//! Name normalisation shared by lookups and creation.

/// Case-insensitive lookup key for a section or item name.
///
/// Full Unicode lowercasing, so `"ALMACÉN 1"` and `"almacén 1"` share a key.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Display form for names created by the system.
///
/// Every run of alphabetic characters starts upper-case and continues
/// lower-case; digits, spaces and punctuation start a new word.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn title_case_handles_accents_and_digits() {
        assert_eq!(title_case("almacén 1"), "Almacén 1");
        assert_eq!(title_case("REFRIGERADOR"), "Refrigerador");
        assert_eq!(title_case("  despensa  alta "), "Despensa  Alta");
    }

    #[test]
    fn name_key_ignores_case_and_padding() {
        assert_eq!(name_key(" Refrigerador "), name_key("refrigerador"));
        assert_eq!(name_key("ALMACÉN 1"), "almacén 1");
    }

    proptest! {
        #[test]
        fn title_case_preserves_the_lookup_key(name in "[a-zA-Záéíóúñ0-9 ]{0,40}") {
            prop_assert_eq!(name_key(&title_case(&name)), name_key(&name));
        }

        #[test]
        fn title_case_is_idempotent(name in "[a-zA-Záéíóúñ0-9 ]{0,40}") {
            let once = title_case(&name);
            prop_assert_eq!(title_case(&once), once.clone());
        }
    }
}
