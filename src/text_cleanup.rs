/*!
 * Whitespace and punctuation cleanup of recognizer text.
 *
 * Recognizers emit doubled spaces, stray spaces before punctuation and
 * stuttered marks. Cleanup never changes words or line breaks, and applying
 * it twice gives the same text as applying it once.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Cleanup patterns, applied in declaration order
static SPACE_AROUND_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]*\n[^\S\n]*").expect("line break pattern"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").expect("space pattern"));
static SPACE_BEFORE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+([.,!?:;])").expect("punctuation spacing pattern"));
static REPEATED_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}|\?{2,}|,{2,}|;{2,}|:{2,}").expect("mark pattern"));
static LONG_ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").expect("ellipsis pattern"));

/// Clean up one subtitle text
pub fn normalize(text: &str) -> String {
    let text = SPACE_AROUND_LINE_BREAK.replace_all(text.trim(), "\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCTUATION.replace_all(&text, "$1");
    let text = REPEATED_MARKS.replace_all(&text, |caps: &regex::Captures| caps[0][..1].to_string());
    LONG_ELLIPSIS.replace_all(&text, "...").into_owned()
}
