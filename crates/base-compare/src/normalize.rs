//! Header and cell normalization applied when a dataset is loaded.
//!
//! Column headers exported by the request system mix case, accents and
//! spaces ("Número da Solicitação"). Everything downstream addresses columns
//! by their normalized form (`numero_da_solicitacao`), and identifier values
//! are compared after the same folding.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;

/// Characters that are not allowed in exported file names.
const FILE_NAME_FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// ASCII base letter of an accented Latin letter (Latin-1 and Latin
/// Extended-A).
fn base_letter(c: char) -> Option<char> {
    let base = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ď' => 'd',
        'Ď' => 'D',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĥ' => 'h',
        'Ĥ' => 'H',
        'í' | 'ì' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ĵ' => 'j',
        'Ĵ' => 'J',
        'ķ' => 'k',
        'Ķ' => 'K',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'Ĺ' | 'Ļ' | 'Ľ' => 'L',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'Ŕ' | 'Ŗ' | 'Ř' => 'R',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ſ' => 's',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ţ' | 'ť' => 't',
        'Ţ' | 'Ť' => 'T',
        'ú' | 'ù' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ŵ' => 'w',
        'Ŵ' => 'W',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'Ý' | 'Ŷ' | 'Ÿ' => 'Y',
        'ź' | 'ż' | 'ž' => 'z',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        _ => return None,
    };
    Some(base)
}

/// ASCII text of a compatibility character (ordinal indicators, super
/// scripts, vulgar fractions, ligatures, spacing marks).
fn compatibility_fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'º' => "o",
        'ª' => "a",
        '¹' => "1",
        '²' => "2",
        '³' => "3",
        '¼' => "14",
        '½' => "12",
        '¾' => "34",
        '™' => "TM",
        'ﬀ' => "ff",
        'ﬁ' => "fi",
        'ﬂ' => "fl",
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        // Spacing diacritics decompose to a space plus a combining mark
        '\u{a0}' | '¨' | '¯' | '´' | '¸' => " ",
        _ => return None,
    };
    Some(folded)
}

/// Append the ASCII form of `c` to `out`; characters without one are dropped.
fn fold_char(c: char, out: &mut String) {
    if c.is_ascii() {
        out.push(c);
    } else if let Some(base) = base_letter(c) {
        out.push(base);
    } else if let Some(folded) = compatibility_fold(c) {
        out.push_str(folded);
    } else if ('\u{ff01}'..='\u{ff5e}').contains(&c) {
        // Fullwidth forms map onto the printable ASCII block
        if let Some(ascii) = char::from_u32(c as u32 - 0xfee0) {
            out.push(ascii);
        }
    }
}

/// Fold accents and compatibility characters to ASCII and drop any
/// remaining non-ASCII characters.
pub fn fold_to_ascii(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        fold_char(c, &mut out);
    }
    out
}

/// Normalize a column header: trim, lowercase, fold accents, spaces to `_`.
///
/// ```rust,ignore
/// assert_eq!(normalize_column_name(" Número da Solicitação "), "numero_da_solicitacao");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    fold_to_ascii(&name.trim().to_lowercase()).replace(' ', "_")
}

/// Normalize an identifier value for key comparison.
///
/// Returns `None` when nothing is left after trimming, so blank cells never
/// act as a key.
pub fn normalize_identifier(value: &str, case_insensitive: bool) -> Option<String> {
    let folded = fold_to_ascii(value.trim());
    let folded = folded.trim();
    if folded.is_empty() {
        return None;
    }
    if case_insensitive {
        Some(folded.to_lowercase())
    } else {
        Some(folded.to_string())
    }
}

/// Remove characters outside printable ASCII, tab and line breaks.
pub fn strip_non_printable(value: &str) -> String {
    value
        .chars()
        .filter(|c| matches!(c, '\x20'..='\x7E' | '\t' | '\n' | '\r'))
        .collect()
}

/// Sanitize a single cell: accents folded, non-printable removed, trimmed.
///
/// Blank results become `None`.
pub fn sanitize_cell(value: &str) -> Option<String> {
    let cleaned = strip_non_printable(&fold_to_ascii(value));
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Strip characters that are invalid in file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FILE_NAME_FORBIDDEN.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Rename every column of `df` to its normalized form.
pub fn normalize_headers(mut df: DataFrame) -> Result<DataFrame> {
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for original in &column_names {
        let normalized = normalize_column_name(original);
        if &normalized != original {
            debug!("Renaming column '{}' -> '{}'", original, normalized);
            df.rename(original, normalized.into())?;
        }
    }

    Ok(df)
}

/// Sanitize every string column of `df`.
pub fn sanitize_frame(mut df: DataFrame) -> Result<DataFrame> {
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.dtype() != &DataType::String {
            continue;
        }

        let cleaned: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(sanitize_cell))
            .collect();

        df.replace(col_name, Series::new(col_name.as_str().into(), cleaned))?;
    }

    Ok(df)
}
