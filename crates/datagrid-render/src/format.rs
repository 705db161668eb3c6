//! Column formatting rules.
//!
//! A [`Format`] turns a cell [`Value`] into display text. Rules are usually
//! declared in configuration as a name plus positional arguments
//! ([`FormatRule`]) and validated once with [`Format::from_rule`]:
//!
//! | Rule       | Arguments                                   | Input                      |
//! |------------|---------------------------------------------|----------------------------|
//! | `number`   | decimals, decimal point, thousands separator | numbers, numeric strings  |
//! | `date`     | output pattern                              | unix seconds, timestamps   |
//! | `datetime` | input pattern, output pattern               | date/time strings          |
//!
//! Values a rule cannot handle are rendered unformatted, never as errors.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use datagrid_source::Value;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// A named formatting rule with positional arguments, as found in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRule {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl FormatRule {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FormatRule {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// A validated formatting rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// Fixed decimals with configurable separators.
    Number {
        decimals: usize,
        decimal_point: String,
        thousands_sep: String,
    },
    /// A unix timestamp (seconds) or [`Value::Timestamp`] shown with `pattern`.
    Date { pattern: String },
    /// A date/time string parsed with `input` and shown with `output`.
    DateTime { input: String, output: String },
}

impl Format {
    /// Plain number formatting: `decimals` places, `.` point, `,` thousands.
    pub fn number(decimals: usize) -> Self {
        Format::Number {
            decimals,
            decimal_point: ".".to_string(),
            thousands_sep: ",".to_string(),
        }
    }

    pub fn date(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        check_pattern(&pattern)?;
        Ok(Format::Date { pattern })
    }

    pub fn datetime(input: impl Into<String>, output: impl Into<String>) -> Result<Self> {
        let (input, output) = (input.into(), output.into());
        check_pattern(&input)?;
        check_pattern(&output)?;
        Ok(Format::DateTime { input, output })
    }

    /// Validates a configured rule.
    ///
    /// ```
    /// use datagrid_render::{Format, FormatRule};
    ///
    /// let rule = FormatRule::new("number", ["2", ",", "."]);
    /// let format = Format::from_rule(&rule).unwrap();
    /// assert_eq!(format.apply(&1234.5.into()).unwrap(), "1.234,50");
    ///
    /// assert!(Format::from_rule(&FormatRule::new("roman", ["x"])).is_err());
    /// ```
    pub fn from_rule(rule: &FormatRule) -> Result<Self> {
        let arg = |i: usize| rule.args.get(i).map(String::as_str);
        match rule.name.as_str() {
            "number" => {
                let decimals = match arg(0) {
                    Some(text) => text.trim().parse::<usize>().map_err(|_| {
                        RenderError::InvalidFormat(format!("number: bad decimal count '{}'", text))
                    })?,
                    None => 0,
                };
                Ok(Format::Number {
                    decimals,
                    decimal_point: arg(1).unwrap_or(".").to_string(),
                    thousands_sep: arg(2).unwrap_or(",").to_string(),
                })
            }
            "date" => Format::date(arg(0).unwrap_or("%Y-%m-%d")),
            "datetime" => match (arg(0), arg(1)) {
                (Some(input), Some(output)) => Format::datetime(input, output),
                _ => Err(RenderError::InvalidFormat(
                    "datetime: needs input and output patterns".to_string(),
                )),
            },
            other => Err(RenderError::InvalidFormat(format!("unknown rule '{}'", other))),
        }
    }

    /// Formats a value; `None` when the rule does not apply to it.
    pub fn apply(&self, value: &Value) -> Option<String> {
        match self {
            Format::Number {
                decimals,
                decimal_point,
                thousands_sep,
            } => value
                .as_f64()
                .map(|n| format_number(n, *decimals, decimal_point, thousands_sep)),
            Format::Date { pattern } => {
                let secs = match value {
                    Value::Timestamp(ts) => ts.as_secs(),
                    other => other.as_f64()? as i64,
                };
                let date = DateTime::from_timestamp(secs, 0)?;
                Some(date.format(pattern).to_string())
            }
            Format::DateTime { input, output } => {
                let text = value.as_str()?.trim();
                let parsed = NaiveDateTime::parse_from_str(text, input).ok().or_else(|| {
                    NaiveDate::parse_from_str(text, input)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })?;
                Some(parsed.format(output).to_string())
            }
        }
    }
}

fn check_pattern(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(RenderError::InvalidFormat(format!("bad date pattern '{}'", pattern)));
    }
    Ok(())
}

fn format_number(n: f64, decimals: usize, decimal_point: &str, thousands_sep: &str) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push_str(thousands_sep);
        }
        grouped.push(digit);
    }

    let mut out = String::new();
    if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push_str(decimal_point);
        out.push_str(frac);
    }
    out
}
