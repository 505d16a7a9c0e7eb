// Name normalization used for dashboard, widget and metric identifiers
use deunicode::deunicode;

const SEPARATORS: &[char] = &[
    '\t', ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '-', '/', '<', '=', '>', '?',
    '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', ',', '.',
];

fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c) || c.is_whitespace()
}

/// Lower-cases `text`, splits it on punctuation and whitespace, transliterates
/// each word to ASCII and joins the surviving words with `-`.
///
/// Transliterated words are split again, so `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();

    for word in text.to_lowercase().split(is_separator) {
        if word.is_empty() {
            continue;
        }

        let ascii = deunicode(word).to_lowercase();
        words.extend(
            ascii
                .split(is_separator)
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );
    }

    words.join("-")
}
