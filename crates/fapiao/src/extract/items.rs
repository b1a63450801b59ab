use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::fields::normalize_amount;

/// Lines containing any of these are summary or header lines, never items.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "合計", "總計", "小計", "稅額", "發票", "統一編號", "找零", "現金",
];

const MIN_NAME_CHARS: usize = 2;

static RE_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?)\s+(?P<qty>[0-9]+(?:\.[0-9]+)?)(?:\s*[xX*×]\s*|\s+)(?P<price>[0-9][0-9,]*(?:\.[0-9]+)?)\s+(?P<amount>[0-9][0-9,]*(?:\.[0-9]+)?)\s*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
}

pub fn is_reserved(line: &str) -> bool {
    RESERVED_KEYWORDS.iter().any(|kw| line.contains(kw))
}

/// Parses one OCR line as `name qty [x|*] unit_price amount`.
pub fn parse_line(line: &str) -> Option<LineItem> {
    let line = line.trim();
    if line.is_empty() || is_reserved(line) {
        return None;
    }

    let caps = RE_ITEM.captures(line)?;
    let name = caps["name"].trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return None;
    }

    Some(LineItem {
        name: name.to_string(),
        quantity: caps["qty"].to_string(),
        unit_price: normalize_amount(&caps["price"]),
        amount: normalize_amount(&caps["amount"]),
    })
}

pub fn line_items(text: &str) -> Vec<LineItem> {
    text.lines().filter_map(parse_line).collect()
}
