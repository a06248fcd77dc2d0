// Utility helpers for locale-specific parsing and display formatting.
//
// This module centralizes all the "dirty" number/date handling so the rest
// of the code can assume clean, typed values. The source CSVs use Brazilian
// conventions: `.` as thousands separator, `,` as decimal separator, and
// Portuguese month names in period labels like `janeiro/19`.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Normalize a quantity cell into a finite, non-negative `f64`.
///
/// Total function: it never fails, whatever the input.
/// - Missing or empty values count as `"0"`.
/// - Strips every `.` (thousands grouping), then swaps `,` for `.`
///   (decimal point), so `"3.100"` -> 3100 and `"1.234,56"` -> 1234.56.
/// - Anything that still fails to parse, or parses to a negative or
///   non-finite value, coerces to 0 rather than erroring.
pub fn normalize_quantity(s: Option<&str>) -> f64 {
    let s = s.unwrap_or("0").trim();
    if s.is_empty() {
        return 0.0;
    }
    let cleaned = s.replace('.', "").replace(',', ".");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Integer variant of [`normalize_quantity`] for the UI dose columns.
pub fn normalize_ui(s: Option<&str>) -> i64 {
    normalize_quantity(s) as i64
}

/// Parse a plain (unlocalized) number, used by the Ministry of Health
/// annual series where unparseable cells drop the row instead of zeroing.
pub fn parse_plain_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a purely numeric year token. Used both for the `Ano` column and to
/// decide which wide-table headers are year columns.
pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok()
}

fn month_number(name: &str) -> Option<u32> {
    // `ç` is folded to `c` by the caller, so `março` and `marco` both land
    // on the same arm.
    let n = match name {
        "janeiro" => 1,
        "fevereiro" => 2,
        "marco" => 3,
        "abril" => 4,
        "maio" => 5,
        "junho" => 6,
        "julho" => 7,
        "agosto" => 8,
        "setembro" => 9,
        "outubro" => 10,
        "novembro" => 11,
        "dezembro" => 12,
        _ => return None,
    };
    Some(n)
}

/// Parse a period label like `janeiro/19` or `Dezembro/2023` into the first
/// calendar day of that month.
///
/// Case-insensitive; the `/` is optional; the year must be exactly 2 or 4
/// digits. Two-digit years window to `2000 + year`; labels before 2000
/// cannot be expressed by this scheme, which matches the source data.
/// Returns `None` for anything else; callers drop the owning row.
pub fn parse_period(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let digits_at = s.find(|c: char| c.is_ascii_digit())?;
    let (name_part, year_part) = s.split_at(digits_at);
    if year_part.len() != 2 && year_part.len() != 4 {
        return None;
    }
    if !year_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut year: i32 = year_part.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    let name = name_part.trim_end_matches('/').replace('ç', "c");
    let month = month_number(&name)?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Format a quantity with Brazilian thousands separators and a fixed number
/// of decimal places, e.g. `1234567.89` -> `1.234.567,89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::pt);
    if decimals > 0 {
        res.push(',');
        match frac_part {
            Some(frac) => res.push_str(frac),
            None => res.push_str(&"0".repeat(decimals)),
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts and UI volumes in console
    // output (e.g., `1.312 registros`).
    n.to_formatted_string(&Locale::pt)
}
