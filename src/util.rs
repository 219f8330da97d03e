//! Text helpers shared by the decoder and the course reducer.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in older authoring tools)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Normalize text to a lower camel-case key.
///
/// Words are split on any non-alphanumeric character, on lower-to-upper case
/// changes, before the last capital of an acronym followed by lowercase, and
/// between letters and digits. Apostrophes are dropped rather than splitting.
///
/// ```ignore
/// assert_eq!(camel_case("Learning Objective"), "learningObjective");
/// assert_eq!(camel_case("Teacher's Guide"), "teachersGuide");
/// assert_eq!(camel_case("XMLHttp request"), "xmlHttpRequest");
/// ```
pub fn camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in split_words(text).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn split_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text
        .chars()
        .filter(|&c| c != '\'' && c != '\u{2019}')
        .collect();

    let mut words = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            i += 1;
            continue;
        }

        if !current.is_empty() {
            let prev = chars[i - 1];
            // Ordinals like "5th" or "21ST" stay one word
            if prev.is_numeric()
                && let Some(len) = ordinal_suffix(prev, &chars[i..])
            {
                current.extend(&chars[i..i + len]);
                words.push(std::mem::take(&mut current));
                i += len;
                continue;
            }

            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase() && c.is_uppercase() && next.is_some_and(char::is_lowercase))
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
        i += 1;
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Length of the ordinal suffix after `digit` at the start of `rest`, if any.
///
/// The suffix must agree with the digit (`1st`, `2nd`, `3rd`, `4th`...), use a
/// single case, and end the word.
fn ordinal_suffix(digit: char, rest: &[char]) -> Option<usize> {
    let [a, b, ..] = rest else {
        return None;
    };
    let lower = a.is_ascii_lowercase() && b.is_ascii_lowercase();
    let upper = a.is_ascii_uppercase() && b.is_ascii_uppercase();
    if !lower && !upper {
        return None;
    }

    let expected = match digit {
        '1' => "st",
        '2' => "nd",
        '3' => "rd",
        _ => "th",
    };
    let suffix = [a.to_ascii_lowercase(), b.to_ascii_lowercase()];
    if !expected.chars().eq(suffix) {
        return None;
    }

    let ends_word = match rest.get(2) {
        None => true,
        Some(&next) => {
            !next.is_alphanumeric()
                || (lower && next.is_uppercase())
                || (upper && next.is_lowercase())
        }
    };
    ends_word.then_some(2)
}
