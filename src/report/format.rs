use super::{Amount, Currency, SymbolPosition};

/// Format a monetary value for display.
///
/// Numbers are rounded half-up to the currency's decimal places and
/// rendered with exactly that many decimal digits; strings supplied by the
/// backend pass through unchanged. Callers format each field exactly once.
pub fn format_amount(amount: &Amount, currency: &Currency) -> String {
    match amount {
        Amount::Text(text) => text.clone(),
        Amount::Number(value) => {
            let number = format_decimal(*value, currency.decimal_places);
            if currency.symbol.is_empty() {
                number
            } else {
                match currency.position {
                    SymbolPosition::Before => format!("{} {}", currency.symbol, number),
                    SymbolPosition::After => format!("{} {}", number, currency.symbol),
                }
            }
        }
    }
}

/// Round half-up to `decimal_places` and render with thousands separators
/// in the integer part.
pub(crate) fn format_decimal(value: f64, decimal_places: u32) -> String {
    let scale = 10f64.powi(decimal_places as i32);
    let rounded = (value * scale).round() / scale;
    let rendered = format!("{:.*}", decimal_places as usize, rounded);

    let (whole, frac) = match rendered.split_once('.') {
        Some((whole, frac)) => (whole.to_string(), Some(frac.to_string())),
        None => (rendered, None),
    };

    let negative = whole.starts_with('-');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(whole.trim_start_matches('-')));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
