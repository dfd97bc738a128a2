use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Folds text to its closest ASCII spelling: accents and cedillas are
/// stripped, and letters with no decomposition are transliterated.
/// Characters outside the Latin script are kept as they are, along with
/// any combining marks that follow them.
pub fn normalize(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    // Whether the last character written was a Latin letter; only marks on
    // such a letter are accents.
    let mut after_latin = false;
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            after_latin = ch.is_ascii_alphabetic();
            continue;
        }
        if is_combining_mark(ch) {
            if !after_latin {
                out.push(ch);
            }
            continue;
        }
        if let Some(s) = fold_letter(ch) {
            out.push_str(s);
            after_latin = s.ends_with(|c: char| c.is_ascii_alphabetic());
            continue;
        }

        let folded: String = std::iter::once(ch)
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect();
        if !folded.is_empty() && folded.is_ascii() {
            after_latin = folded.ends_with(|c: char| c.is_ascii_alphabetic());
            out.push_str(&folded);
        } else {
            out.push(ch);
            after_latin = false;
        }
    }
    out
}

// Letters NFKD leaves untouched.
fn fold_letter(ch: char) -> Option<&'static str> {
    let s = match ch {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'đ' | 'ð' => "d",
        'Đ' | 'Ð' => "D",
        'ł' => "l",
        'Ł' => "L",
        'þ' => "th",
        'Þ' => "TH",
        'ı' => "i",
        '\u{00a0}' => " ",
        _ => return None,
    };
    Some(s)
}
