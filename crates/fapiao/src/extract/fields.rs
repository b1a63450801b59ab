use std::sync::LazyLock;

use regex::Regex;

static RE_INVOICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{2})[-\s]?([0-9]{8})").unwrap());
static RE_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:總計|合計)\s*[:：]?\s*(?:NT)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});
static RE_TAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"稅額\s*[:：]?\s*(?:NT)?\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});

/// Drops thousands separators from a matched amount.
pub fn normalize_amount(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',').collect()
}

/// Two uppercase letters and eight digits, separator removed.
pub fn invoice_number(text: &str) -> String {
    RE_INVOICE_NUMBER
        .captures(text)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

/// First amount after `總計` or `合計`.
pub fn total(text: &str) -> String {
    first_amount(&RE_TOTAL, text)
}

/// First amount after `稅額`.
pub fn tax(text: &str) -> String {
    first_amount(&RE_TAX, text)
}

fn first_amount(re: &Regex, text: &str) -> String {
    re.captures(text)
        .map(|caps| normalize_amount(&caps[1]))
        .unwrap_or_default()
}
