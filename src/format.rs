//! Display helpers for trip cards.

use chrono::NaiveDate;

/// US currency with thousands separators, e.g. `1500.5` → `$1,500.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Budgets of zero are not shown at all.
pub fn budget_label(budget: Option<f64>) -> Option<String> {
    budget.filter(|b| *b != 0.0).map(format_currency)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Only rendered when both ends are known.
pub fn date_range_label(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{} - {}", format_date(start), format_date(end))),
        _ => None,
    }
}
