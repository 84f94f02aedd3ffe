//! Numeric formatting for amounts and percentages
//!
//! A value is only reformatted when its label names an amount or a
//! percentage and the text itself parses as a decimal. Anything else, such as
//! an amount written out in Chinese numerals, is left exactly as generated.

use rust_decimal::{Decimal, RoundingStrategy};

/// What a label says its value is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    /// Currency amount
    Amount,
    /// Percentage
    Percentage,
}

const PERCENTAGE_KEYWORDS: &[&str] = &["利率", "比例", "费率", "年化", "百分比", "rate", "ratio", "percent"];

const AMOUNT_KEYWORDS: &[&str] = &[
    "金额", "租金", "价款", "本金", "利息", "违约金", "保证金", "手续费", "费用", "价格", "总额",
    "余额", "总价", "单价", "amount", "price", "total", "balance", "fee",
];

const AMOUNT_PREFIXES: &[&str] = &["人民币", "¥", "￥", "RMB"];

const AMOUNT_SUFFIXES: &[&str] = &["万元", "元"];

/// Classify a field label or table header
///
/// Percentage keywords win, so `违约金比例` is a percentage.
#[must_use]
pub fn classify(label: &str) -> Option<NumericKind> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    if PERCENTAGE_KEYWORDS.iter().any(|k| label.contains(k)) {
        Some(NumericKind::Percentage)
    } else if AMOUNT_KEYWORDS.iter().any(|k| label.contains(k)) {
        Some(NumericKind::Amount)
    } else {
        None
    }
}

/// `1234567.891` → `1,234,567.89`
///
/// Rounds half away from zero to two places.
#[must_use]
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.2}", rounded.abs());
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3 + 4);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let digits: String = text.chars().filter(|c| *c != ',' && *c != '，').collect();
    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.trim().parse().ok()
}

/// Reformat an amount, keeping any `人民币`/`¥` prefix and `元`/`万元` suffix
#[must_use]
pub fn format_amount_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let (prefix, rest) = AMOUNT_PREFIXES
        .iter()
        .find_map(|p| trimmed.strip_prefix(p).map(|rest| (*p, rest)))
        .unwrap_or(("", trimmed));
    let (number, suffix) = AMOUNT_SUFFIXES
        .iter()
        .find_map(|s| rest.strip_suffix(s).map(|number| (number, *s)))
        .unwrap_or((rest, ""));

    let value = parse_decimal(number)?;
    Some(format!("{prefix}{}{suffix}", format_amount(value)))
}

/// Append `%` to a bare decimal; text already ending in `%` is kept
#[must_use]
pub fn format_percentage_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if let Some(number) = trimmed.strip_suffix('%').or_else(|| trimmed.strip_suffix('％')) {
        return parse_decimal(number).map(|_| format!("{}%", number.trim()));
    }
    parse_decimal(trimmed).map(|_| format!("{trimmed}%"))
}

/// Format `text` as `kind`; `None` when it is not a plain number
#[must_use]
pub fn format_value(kind: NumericKind, text: &str) -> Option<String> {
    match kind {
        NumericKind::Amount => format_amount_text(text),
        NumericKind::Percentage => format_percentage_text(text),
    }
}

/// Format `text` if `label` names a numeric quantity, otherwise return it unchanged
#[must_use]
pub fn format_labelled(label: &str, text: &str) -> String {
    classify(label)
        .and_then(|kind| format_value(kind, text))
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn thousands_and_two_decimals() {
        assert_eq!(format_amount(dec("3600000")), "3,600,000.00");
        assert_eq!(format_amount(dec("125000.5")), "125,000.50");
        assert_eq!(format_amount(dec("999.999")), "1,000.00");
        assert_eq!(format_amount(dec("0.005")), "0.01");
        assert_eq!(format_amount(dec("12")), "12.00");
        assert_eq!(format_amount(dec("-1234.5")), "-1,234.50");
        assert_eq!(format_amount(dec("-0.001")), "0.00");
    }

    #[test]
    fn labels_classified() {
        assert_eq!(classify("租金总额"), Some(NumericKind::Amount));
        assert_eq!(classify("Amount"), Some(NumericKind::Amount));
        assert_eq!(classify("逾期利率"), Some(NumericKind::Percentage));
        assert_eq!(classify("违约金比例"), Some(NumericKind::Percentage));
        assert_eq!(classify("出租人"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn amount_prefix_and_suffix_kept() {
        assert_eq!(format_amount_text("人民币3600000元").as_deref(), Some("人民币3,600,000.00元"));
        assert_eq!(format_amount_text("¥1,250,000").as_deref(), Some("¥1,250,000.00"));
        assert_eq!(format_amount_text("360万元").as_deref(), Some("360.00万元"));
        assert_eq!(format_amount_text("叁佰陆拾万元整"), None);
        assert_eq!(format_amount_text("见附件"), None);
    }

    #[test]
    fn percentages_get_a_sign() {
        assert_eq!(format_percentage_text("4.35").as_deref(), Some("4.35%"));
        assert_eq!(format_percentage_text("0.05%").as_deref(), Some("0.05%"));
        assert_eq!(format_percentage_text("日万分之五"), None);
    }

    #[test]
    fn unlabelled_text_untouched() {
        assert_eq!(format_labelled("合同编号", "20210315"), "20210315");
        assert_eq!(format_labelled("租赁本金", "3600000"), "3,600,000.00");
        assert_eq!(format_labelled("租赁本金", "待定"), "待定");
    }

    proptest! {
        #[test]
        fn prop_grouping_round_trips(cents in -10_000_000_000i64..10_000_000_000) {
            let value = Decimal::new(cents, 2);
            let formatted = format_amount(value);
            let back: Decimal = formatted.replace(',', "").parse().unwrap();
            prop_assert_eq!(back, value);
            prop_assert!(formatted.split('.').nth(1).is_some_and(|f| f.len() == 2));
        }
    }
}
