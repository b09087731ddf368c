//! Output masking of sensitive figures.
//!
//! A figure is masked when it follows a cost, profit or contractor-rate label
//! within a short gap. Only the figure is replaced; the label stays so the
//! answer still reads naturally.

use super::policy::MaskPolicy;
use regex::Regex;
use std::sync::LazyLock;

/// Replacement for a masked figure.
pub const MASK_PLACEHOLDER: &str = "[非表示]";

/// Up to 12 characters between label and figure. The gap may not contain
/// digits, currency signs, brackets or line breaks, so it can never reach
/// across a placeholder.
const GAP: &str = r"[^\d¥$￥\[\]\n]{0,12}?";

const AMOUNT: &str = r"[¥$￥]?[ \t]?\d[\d,]*(?:\.\d+)?(?:[ \t]?(?:万円|千円|円|%|％|yen|USD|JPY))?";

// Longer labels come first so the alternation prefers them.
const COST_LABELS: &[&str] = &[
    "工事原価",
    "仕入れ値",
    "unit cost",
    "材料費",
    "仕入値",
    "原価",
    "cost",
];

const PROFIT_LABELS: &[&str] = &["利益率", "粗利率", "マージン", "profit", "margin", "利益", "粗利"];

const RATE_LABELS: &[&str] = &[
    "subcontractor",
    "contractor rate",
    "協力業者単価",
    "labor rate",
    "外注単価",
    "職人単価",
    "人工単価",
    "外注費",
    "日当",
];

fn compile(labels: &[&str]) -> Option<Regex> {
    let alternation = labels
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(?P<label>(?:{}){})(?P<amount>{})", alternation, GAP, AMOUNT);
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!("Failed to compile masking pattern: {}", e);
            None
        }
    }
}

static RE_COST: LazyLock<Option<Regex>> = LazyLock::new(|| compile(COST_LABELS));
static RE_PROFIT: LazyLock<Option<Regex>> = LazyLock::new(|| compile(PROFIT_LABELS));
static RE_RATES: LazyLock<Option<Regex>> = LazyLock::new(|| compile(RATE_LABELS));

/// Mask every figure the policy hides. Deterministic and idempotent.
pub fn apply_output_masking(text: &str, policy: &MaskPolicy) -> String {
    let passes: [(bool, &LazyLock<Option<Regex>>); 3] = [
        (policy.mask_cost_data, &RE_COST),
        (policy.mask_profit_data, &RE_PROFIT),
        (policy.mask_contractor_rates, &RE_RATES),
    ];

    let mut masked = text.to_string();
    for (enabled, pattern) in passes {
        if !enabled {
            continue;
        }
        if let Some(regex) = pattern.as_ref() {
            masked = regex
                .replace_all(&masked, |caps: &regex::Captures<'_>| {
                    format!("{}{}", &caps["label"], MASK_PLACEHOLDER)
                })
                .into_owned();
        }
    }
    masked
}
