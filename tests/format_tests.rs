use ageing::report::{format_amount, Amount, Currency, SymbolPosition};

#[test]
fn symbol_before_number() {
    let currency = Currency::new("$", SymbolPosition::Before, 2);
    assert_eq!(format_amount(&Amount::Number(10.0), &currency), "$ 10.00");
}

#[test]
fn symbol_after_number() {
    let currency = Currency::new("$", SymbolPosition::After, 2);
    assert_eq!(format_amount(&Amount::Number(10.0), &currency), "10.00 $");
}

#[test]
fn empty_symbol_has_no_stray_space() {
    let currency = Currency::new("", SymbolPosition::After, 2);
    assert_eq!(format_amount(&Amount::Number(10.0), &currency), "10.00");
}

#[test]
fn exact_decimal_digit_count() {
    for decimals in 0..=6u32 {
        let currency = Currency::new("", SymbolPosition::Before, decimals);
        let rendered = format_amount(&Amount::Number(123.456789), &currency);
        match rendered.split_once('.') {
            Some((_, frac)) => assert_eq!(frac.len() as u32, decimals, "decimals={decimals}"),
            None => assert_eq!(decimals, 0, "decimals={decimals}"),
        }
    }
}

#[test]
fn rounds_half_up() {
    let currency = Currency::new("", SymbolPosition::Before, 2);
    assert_eq!(format_amount(&Amount::Number(0.125), &currency), "0.13");

    let whole = Currency::new("", SymbolPosition::Before, 0);
    assert_eq!(format_amount(&Amount::Number(2.5), &whole), "3");
    assert_eq!(format_amount(&Amount::Number(-2.5), &whole), "-3");
}

#[test]
fn thousands_grouping() {
    let currency = Currency::new("$", SymbolPosition::Before, 2);
    assert_eq!(
        format_amount(&Amount::Number(1234567.891), &currency),
        "$ 1,234,567.89"
    );
    assert_eq!(
        format_amount(&Amount::Number(-1234.5), &currency),
        "$ -1,234.50"
    );
}

#[test]
fn strings_pass_through_unchanged() {
    let currency = Currency::new("$", SymbolPosition::Before, 2);
    let preformatted = Amount::Text("$ 99.90".to_string());
    assert_eq!(format_amount(&preformatted, &currency), "$ 99.90");
}

#[test]
fn stable_under_rounding() {
    let currency = Currency::new("", SymbolPosition::Before, 2);
    let once = format_amount(&Amount::Number(3.14159), &currency);
    let rounded: f64 = once.parse().unwrap();
    assert_eq!(format_amount(&Amount::Number(rounded), &currency), once);
}
