//! Cleanup for model answers that echo OCR artifacts from indexed PDFs.
//!
//! Scanned market reports come back with digits spread one per column,
//! units split apart ("/ m t"), stray emphasis asterisks, and doubled
//! whitespace. These rules normalize an answer before it is shown or
//! stored in the session.

use std::sync::OnceLock;

use regex::Regex;

struct Rules {
    emphasis: Regex,
    spaced_digits: Regex,
    gap_after_symbol: Regex,
    gap_before_slash: Regex,
    per_tonne: Regex,
    us_dollar: Regex,
    us_amount: Regex,
    spaced_word: Regex,
    multi_space: Regex,
    multi_newline: Regex,
    space_before_punct: Regex,
    open_paren_gap: Regex,
    space_after_punct: Regex,
    numeric_range: Regex,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded pattern must compile")
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        emphasis: re(r"\*+"),
        spaced_digits: re(r"(\d)\s+(\d)"),
        gap_after_symbol: re(r"([/$])\s+"),
        gap_before_slash: re(r"\s+(/)"),
        per_tonne: re(r"(?i)/\s*m\s*t\b"),
        us_dollar: re(r"U\s*S\s*\$\s*"),
        us_amount: re(r"\bUS\s+(\d)"),
        spaced_word: re(r"(?i)\b([a-z])\s+([a-z])\s+([a-z](?:\s+[a-z])*)\b"),
        multi_space: re(r" {2,}"),
        multi_newline: re(r"\n\s*\n+"),
        space_before_punct: re(r"\s+([,;:.!?)])"),
        open_paren_gap: re(r"\(\s+"),
        space_after_punct: re(r"([,;:.!?])[ \t]+"),
        numeric_range: re(r"(\d+)\s*-\s*(\d+)"),
    })
}

/// Normalize a model answer for display.
pub fn clean(text: &str) -> String {
    let r = rules();
    let mut s = r.emphasis.replace_all(text, "").into_owned();

    // Split digits rejoin pairwise, so run this one until stable.
    loop {
        let joined = r.spaced_digits.replace_all(&s, "${1}${2}").into_owned();
        if joined == s {
            break;
        }
        s = joined;
    }

    s = r.gap_after_symbol.replace_all(&s, "${1}").into_owned();
    s = r.gap_before_slash.replace_all(&s, "${1}").into_owned();
    s = r.per_tonne.replace_all(&s, "/mt").into_owned();
    s = r.us_dollar.replace_all(&s, "US$$").into_owned();
    s = r.us_amount.replace_all(&s, "US$$${1}").into_owned();
    s = r
        .spaced_word
        .replace_all(&s, |caps: &regex::Captures| {
            caps[0]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
        })
        .into_owned();
    s = r.multi_space.replace_all(&s, " ").into_owned();
    s = r.multi_newline.replace_all(&s, "\n\n").into_owned();
    s = r.space_before_punct.replace_all(&s, "${1}").into_owned();
    s = r.open_paren_gap.replace_all(&s, "(").into_owned();
    s = r.space_after_punct.replace_all(&s, "${1} ").into_owned();
    s = r.numeric_range.replace_all(&s, "${1}-${2}").into_owned();
    s.trim().to_string()
}
