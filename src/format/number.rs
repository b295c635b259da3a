//! numeral.js-style number formatting (`0,0[.]00`, `0.0%`, `0.0a`, `$0,0.00`, `(0,0)`).

use super::{ValueFormatter, clean_number, display_value};
use num_format::{CustomFormat, Locale, ToFormattedString};
use serde_json::Value;

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affix {
    Prefix { space: bool },
    Suffix { space: bool },
}

/// Parsed numeral format string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberSpec {
    percent: bool,
    percent_space: bool,
    abbreviate: bool,
    abbreviate_space: bool,
    currency: Option<Affix>,
    parens: bool,
    plus: bool,
    thousands: bool,
    decimals: usize,
    optional_decimals: usize,
    optional_point: bool,
}

impl NumberSpec {
    fn parse(format: &str) -> Self {
        let currency = format.find('$').map(|i| {
            let before = &format[..i];
            if before.contains('0') {
                Affix::Suffix {
                    space: before.ends_with(' '),
                }
            } else {
                Affix::Prefix {
                    space: format[i + 1..].starts_with(' '),
                }
            }
        });

        let mut core: String = format
            .chars()
            .filter(|c| matches!(c, '0' | '#' | '.' | '[' | ']'))
            .collect();
        let optional_point = core.contains("[.]");
        if optional_point {
            core = core.replacen("[.]", ".", 1);
        }
        let zeros = |s: &str| s.chars().filter(|c| *c == '0').count();
        let (decimals, optional_decimals) = match core.split_once('.') {
            Some((_, precision)) => match precision.split_once('[') {
                Some((mandatory, optional)) => (zeros(mandatory), zeros(optional)),
                None => (zeros(precision), 0),
            },
            None => (0, 0),
        };

        Self {
            percent: format.contains('%'),
            percent_space: format.contains(" %"),
            abbreviate: format.contains('a'),
            abbreviate_space: format.contains(" a"),
            currency,
            parens: format.contains('('),
            plus: format.contains('+'),
            thousands: format.contains(','),
            decimals,
            optional_decimals,
            optional_point,
        }
    }
}

#[derive(Debug, Clone)]
enum Grouping {
    Locale(&'static Locale),
    Custom(CustomFormat),
}

/// Number formatter built from a numeral-style format string.
#[derive(Debug, Clone)]
pub struct NumberFormatter {
    spec: NumberSpec,
    grouping: Grouping,
    decimal: String,
}

/// Build a formatter for `format` with English separators.
pub fn create_number_formatter(format: &str) -> NumberFormatter {
    NumberFormatter::new(format)
}

impl NumberFormatter {
    pub fn new(format: &str) -> Self {
        Self::with_locale(format, "en")
    }

    /// Thousands/decimal separators follow the given locale tag (see [`map_locale`]).
    pub fn with_locale(format: &str, locale_tag: &str) -> Self {
        let locale = map_locale(locale_tag);
        Self {
            spec: NumberSpec::parse(format),
            grouping: Grouping::Locale(locale),
            decimal: locale.decimal().to_string(),
        }
    }

    /// Explicit separators, as configured per counter visualization.
    pub fn with_separators(format: &str, thousands: &str, decimal: &str) -> Self {
        let grouping = match CustomFormat::builder().separator(thousands).build() {
            Ok(custom) => Grouping::Custom(custom),
            Err(e) => {
                log::warn!("unusable thousands separator {thousands:?}: {e}");
                Grouping::Locale(&Locale::en)
            }
        };
        let decimal = if decimal.is_empty() { "." } else { decimal };
        Self {
            spec: NumberSpec::parse(format),
            grouping,
            decimal: decimal.to_string(),
        }
    }

    /// Format a number. Non-finite values render as their Rust string form.
    pub fn format_number(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        let spec = &self.spec;
        let mut v = if spec.percent { value * 100.0 } else { value };

        let mut abbr = "";
        if spec.abbreviate {
            let a = v.abs();
            for (limit, suffix) in [(1e12, "t"), (1e9, "b"), (1e6, "m"), (1e3, "k")] {
                if a >= limit {
                    v /= limit;
                    abbr = suffix;
                    break;
                }
            }
        }

        let mut digits = format!("{:.*}", spec.decimals + spec.optional_decimals, v.abs());
        let mut trimmed = 0;
        while trimmed < spec.optional_decimals && digits.ends_with('0') {
            digits.pop();
            trimmed += 1;
        }
        if digits.ends_with('.') {
            digits.pop();
        }

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (digits.clone(), String::new()),
        };
        let frac_part = if spec.optional_point && frac_part.chars().all(|c| c == '0') {
            String::new()
        } else {
            frac_part
        };
        let is_zero = int_part.chars().all(|c| c == '0') && frac_part.chars().all(|c| c == '0');
        let negative = v < 0.0 && !is_zero;

        let int_part = if spec.thousands {
            self.group(&int_part)
        } else {
            int_part
        };

        let mut body = int_part;
        if !frac_part.is_empty() {
            body.push_str(&self.decimal);
            body.push_str(&frac_part);
        }
        if !abbr.is_empty() {
            if spec.abbreviate_space {
                body.push(' ');
            }
            body.push_str(abbr);
        }
        match spec.currency {
            Some(Affix::Prefix { space }) => {
                body = format!("${}{}", if space { " " } else { "" }, body);
            }
            Some(Affix::Suffix { space }) => {
                body = format!("{}{}$", body, if space { " " } else { "" });
            }
            None => {}
        }
        if spec.percent {
            if spec.percent_space {
                body.push(' ');
            }
            body.push('%');
        }

        if negative {
            if spec.parens {
                format!("({body})")
            } else {
                format!("-{body}")
            }
        } else if spec.plus && !is_zero {
            format!("+{body}")
        } else {
            body
        }
    }

    fn group(&self, int_digits: &str) -> String {
        match int_digits.parse::<u128>() {
            Ok(n) => match &self.grouping {
                Grouping::Locale(locale) => n.to_formatted_string(*locale),
                Grouping::Custom(custom) => n.to_formatted_string(custom),
            },
            Err(_) => int_digits.to_string(),
        }
    }
}

impl ValueFormatter for NumberFormatter {
    /// Numbers and numeric strings are formatted; anything else is stringified.
    fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Number(_) | Value::String(_) => match clean_number(value) {
                Some(n) => self.format_number(n),
                None => display_value(value),
            },
            other => display_value(other),
        }
    }
}
