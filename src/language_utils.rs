/*!
 * Language utilities for translator language codes.
 *
 * The translator speaks NLLB codes: an ISO 639-3 language followed by an
 * ISO 15924 script, e.g. `eng_Latn` or `pes_Arab`. Users may also give
 * ISO 639-1 (2-letter) or ISO 639-2 (3-letter) codes, which are mapped
 * when the usual script of the language is known.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes and their ISO 639-2/T equivalents
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// NLLB code used for an ISO 639-3 language when no script is given.
/// Macrolanguages map to the variety the translator was trained on.
const DEFAULT_NLLB_CODES: &[(&str, &str)] = &[
    ("ara", "arb_Arab"),
    ("ben", "ben_Beng"),
    ("bul", "bul_Cyrl"),
    ("cat", "cat_Latn"),
    ("ces", "ces_Latn"),
    ("dan", "dan_Latn"),
    ("deu", "deu_Latn"),
    ("ell", "ell_Grek"),
    ("eng", "eng_Latn"),
    ("est", "est_Latn"),
    ("fas", "pes_Arab"),
    ("fin", "fin_Latn"),
    ("fra", "fra_Latn"),
    ("heb", "heb_Hebr"),
    ("hin", "hin_Deva"),
    ("hrv", "hrv_Latn"),
    ("hun", "hun_Latn"),
    ("hye", "hye_Armn"),
    ("ind", "ind_Latn"),
    ("ita", "ita_Latn"),
    ("jpn", "jpn_Jpan"),
    ("kat", "kat_Geor"),
    ("kor", "kor_Hang"),
    ("lit", "lit_Latn"),
    ("msa", "zsm_Latn"),
    ("nld", "nld_Latn"),
    ("nor", "nob_Latn"),
    ("pol", "pol_Latn"),
    ("por", "por_Latn"),
    ("pus", "pbt_Arab"),
    ("ron", "ron_Latn"),
    ("rus", "rus_Cyrl"),
    ("slk", "slk_Latn"),
    ("slv", "slv_Latn"),
    ("spa", "spa_Latn"),
    ("srp", "srp_Cyrl"),
    ("swa", "swh_Latn"),
    ("swe", "swe_Latn"),
    ("tam", "tam_Taml"),
    ("tha", "tha_Thai"),
    ("tur", "tur_Latn"),
    ("ukr", "ukr_Cyrl"),
    ("urd", "urd_Arab"),
    ("vie", "vie_Latn"),
    ("zho", "zho_Hans"),
];

/// Languages written right to left, as ISO 639-1 or 639-3 codes
const RTL_LANGUAGES: &[&str] = &[
    "ar", "ara", "arb", "arz", "apc", "ary", "fa", "fas", "pes", "prs", "he", "heb", "ur", "urd", "ps", "pus",
    "pbt", "dv", "div", "yi", "yid", "ug", "uig", "sd", "snd", "ckb", "syr",
];

/// Scripts written right to left
const RTL_SCRIPTS: &[&str] = &["Arab", "Hebr", "Thaa", "Syrc", "Nkoo"];

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some((_, part2t)) = BIBLIOGRAPHIC_CODES.iter().find(|(b, _)| *b == normalized_code) {
                return Ok(part2t.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Split an NLLB code into its language and script parts
pub fn parse_nllb_code(code: &str) -> Option<(&str, &str)> {
    let (language, script) = code.trim().split_once('_')?;

    let language_ok = language.len() == 3 && language.chars().all(|c| c.is_ascii_lowercase());
    let mut script_chars = script.chars();
    let script_ok = script.len() == 4
        && script_chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && script_chars.all(|c| c.is_ascii_lowercase());

    (language_ok && script_ok && Language::from_639_3(language).is_some()).then_some((language, script))
}

/// Resolve any accepted language code to the translator's NLLB code
pub fn to_nllb_code(code: &str) -> Result<String> {
    if parse_nllb_code(code).is_some() {
        return Ok(code.trim().to_string());
    }

    let part2t = normalize_to_part2t(code)?;
    DEFAULT_NLLB_CODES
        .iter()
        .find(|(iso, _)| *iso == part2t)
        .map(|(_, nllb)| nllb.to_string())
        .ok_or_else(|| {
            anyhow!(
                "No default script known for '{}', use an NLLB code such as {}_Latn",
                code,
                part2t
            )
        })
}

/// Check if two language codes represent the same language, ignoring script
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let language_of = |code: &str| match parse_nllb_code(code) {
        Some((language, _)) => normalize_to_part2t(language).ok(),
        None => to_nllb_code(code)
            .ok()
            .and_then(|nllb| parse_nllb_code(&nllb).map(|(language, _)| language.to_string())),
    };

    match (language_of(code1), language_of(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from any accepted code
pub fn get_language_name(code: &str) -> Result<String> {
    let language = match parse_nllb_code(code) {
        Some((language, _)) => language.to_string(),
        None => normalize_to_part2t(code)?,
    };

    let lang = Language::from_639_3(&language)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", language))?;

    Ok(lang.to_name().to_string())
}

/// Whether text in this language is written right to left
pub fn is_rtl_language(code: &str) -> bool {
    let code = code.trim();
    if code.is_empty() {
        return false;
    }

    // The script decides for NLLB codes, e.g. `uig_Arab` vs `uzn_Latn`
    if let Some((_, script)) = code.split_once('_') {
        return RTL_SCRIPTS.contains(&script);
    }

    let language = code.to_lowercase();
    RTL_LANGUAGES.contains(&language.as_str())
}
