//! iXBRL transformation registry
//!
//! Maps display text to canonical fact values. Transforms are looked up by
//! local name so the same table serves the 2011, 2015 and 2020 registry
//! namespaces (`ixt`, `ixt3`, `ixt4`). Unknown names fail loudly.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use xbrl_graph_core::{Result, XbrlError};

static YEAR_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\s*$").unwrap());
static MONTHNAME_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?\s*,?\s+(\d{4})\s*$").unwrap()
});
static DAY_MONTHNAME_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})(?:st|nd|rd|th)?\.?\s+([A-Za-z]+)\.?,?\s+(\d{4})\s*$").unwrap()
});

/// Apply the transform named by the `format` attribute's local name.
pub fn apply(format: &str, value: &str) -> Result<String> {
    match format {
        "num-dot-decimal" | "numdotdecimal" => numeric(value, ',', '.'),
        "num-comma-decimal" | "numcommadecimal" => numeric(value, '.', ','),
        "zerodash" | "numdash" => zero_dash(format, value),
        "nocontent" | "fixed-empty" => Ok(String::new()),
        "fixed-zero" => Ok("0".to_string()),
        "fixed-true" | "boolean-true" | "booleantrue" => Ok("true".to_string()),
        "fixed-false" | "boolean-false" | "booleanfalse" => Ok("false".to_string()),
        "date-year-month-day" | "dateyearmonthday" => date_year_month_day(format, value),
        name if name.starts_with("date-monthname-day-year")
            || name.starts_with("datemonthdayyear") =>
        {
            date_monthname_day_year(format, value)
        }
        name if name.starts_with("date-day-monthname-year")
            || name.starts_with("datedaymonthyear") =>
        {
            date_day_monthname_year(format, value)
        }
        _ => Err(XbrlError::Transform {
            format: format.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Whether a transform's output is numeric (used by `ix:nonFraction`
/// post-processing).
pub fn is_numeric_format(format: &str) -> bool {
    matches!(
        format,
        "num-dot-decimal" | "numdotdecimal" | "num-comma-decimal" | "numcommadecimal"
            | "zerodash" | "numdash" | "fixed-zero"
    )
}

fn transform_error(format: &str, value: &str) -> XbrlError {
    XbrlError::Transform {
        format: format.to_string(),
        value: value.to_string(),
    }
}

/// Strip grouping separators and normalize the decimal mark to a dot.
fn numeric(value: &str, group: char, decimal: char) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        match ch {
            '0'..='9' => out.push(ch),
            ch if ch == decimal => out.push('.'),
            ch if ch == group || ch == ' ' || ch == '\u{a0}' => {}
            _ => {
                return Err(XbrlError::NumericParse {
                    value: value.to_string(),
                    reason: format!("unexpected character {:?}", ch),
                })
            }
        }
    }
    if out.is_empty() || out == "." || out.matches('.').count() > 1 {
        return Err(XbrlError::NumericParse {
            value: value.to_string(),
            reason: "not a decimal number".to_string(),
        });
    }
    Ok(out)
}

/// A lone dash (of any common width) stands for zero.
fn zero_dash(format: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|ch| matches!(ch, '-' | '\u{2013}' | '\u{2014}')) {
        Ok("0".to_string())
    } else {
        Err(transform_error(format, value))
    }
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|month| lower.starts_with(month))
        .map(|index| index as u32 + 1)
}

fn iso_date(format: &str, value: &str, year: &str, month: u32, day: &str) -> Result<String> {
    let year: i32 = year.parse().map_err(|_| transform_error(format, value))?;
    let day: u32 = day.parse().map_err(|_| transform_error(format, value))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| transform_error(format, value))
}

fn date_year_month_day(format: &str, value: &str) -> Result<String> {
    let captures = YEAR_MONTH_DAY
        .captures(value)
        .ok_or_else(|| transform_error(format, value))?;
    let month: u32 = captures[2].parse().map_err(|_| transform_error(format, value))?;
    iso_date(format, value, &captures[1], month, &captures[3])
}

fn date_monthname_day_year(format: &str, value: &str) -> Result<String> {
    let captures = MONTHNAME_DAY_YEAR
        .captures(value)
        .ok_or_else(|| transform_error(format, value))?;
    let month = month_number(&captures[1]).ok_or_else(|| transform_error(format, value))?;
    iso_date(format, value, &captures[3], month, &captures[2])
}

fn date_day_monthname_year(format: &str, value: &str) -> Result<String> {
    let captures = DAY_MONTHNAME_YEAR
        .captures(value)
        .ok_or_else(|| transform_error(format, value))?;
    let month = month_number(&captures[2]).ok_or_else(|| transform_error(format, value))?;
    iso_date(format, value, &captures[3], month, &captures[1])
}
