//! Spreadsheet-style value formats, reduced to what labels need:
//! currency prefix, thousands separators, decimal places and percent.

/// Upper bound on decimal places a format may request.
pub const MAX_DECIMALS: usize = 20;

const CURRENCY_SYMBOLS: [char; 3] = ['$', '£', '€'];

/// A parsed value format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueFormat {
    /// No format given: plain numeric display.
    #[default]
    Default,
    Fixed {
        currency: Option<char>,
        thousands: bool,
        decimals: usize,
        percent: bool,
    },
}

impl ValueFormat {
    /// Parse a format specifier such as `$#,##0.00`, `$,.2`, `0.0%` or `#,##0`.
    ///
    /// - a leading `$`, `£` or `€` becomes the currency prefix
    /// - a `,` anywhere enables thousands separators
    /// - the text after the first `.` gives the decimal count: a run of `0`/`#`
    ///   placeholders counts its length, otherwise its digits are read as a number
    /// - a trailing `%` formats as a percentage
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() {
            return ValueFormat::Default;
        }

        let currency = spec.chars().next().filter(|c| CURRENCY_SYMBOLS.contains(c));
        let thousands = spec.contains(',');
        let percent = spec.ends_with('%');

        let decimals = match spec.split_once('.') {
            Some((_, after)) => {
                let after = after.trim_end_matches('%');
                if !after.is_empty() && after.chars().all(|c| c == '0' || c == '#') {
                    after.len()
                } else {
                    let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
                    digits.parse().unwrap_or(0)
                }
            }
            None => 0,
        }
        .min(MAX_DECIMALS);

        ValueFormat::Fixed {
            currency,
            thousands,
            decimals,
            percent,
        }
    }

    pub fn from_option(spec: Option<&str>) -> Self {
        spec.map(Self::parse).unwrap_or_default()
    }

    pub fn format(&self, value: f64) -> String {
        match *self {
            ValueFormat::Default => format!("{}", value),
            ValueFormat::Fixed {
                currency,
                thousands,
                decimals,
                percent,
            } => {
                if !value.is_finite() {
                    return format!("{}", value);
                }
                let scaled = if percent { value * 100.0 } else { value };
                let fixed = format!("{:.*}", decimals, scaled.abs());
                let (int_part, frac_part) = match fixed.split_once('.') {
                    Some((i, f)) => (i, Some(f)),
                    None => (fixed.as_str(), None),
                };

                let negative = scaled < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');

                let mut out = String::with_capacity(fixed.len() + 8);
                if negative {
                    out.push('-');
                }
                if let Some(symbol) = currency {
                    out.push(symbol);
                }
                if thousands {
                    out.push_str(&group_thousands(int_part));
                } else {
                    out.push_str(int_part);
                }
                if let Some(frac) = frac_part {
                    out.push('.');
                    out.push_str(frac);
                }
                if percent {
                    out.push('%');
                }
                out
            }
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
