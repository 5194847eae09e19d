//! Display formatting

use chrono::NaiveDate;

/// Rupee amount with the fraction dropped and thousands grouped: `₹1,250`
pub fn format_currency(amount: f64) -> String {
    let whole = amount.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole < 0 {
        format!("₹-{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

/// `Jul 10`
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

pub fn format_percent(percentage: i64) -> String {
    format!("{}% Spent", percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "₹0");
        assert_eq!(format_currency(999.99), "₹999");
        assert_eq!(format_currency(1000.0), "₹1,000");
        assert_eq!(format_currency(1234567.8), "₹1,234,567");
        assert_eq!(format_currency(-200.0), "₹-200");
        assert_eq!(format_currency(-1500.5), "₹-1,500");
    }

    #[test]
    fn test_format_short_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(format_short_date(date), "Jul 4");
        assert_eq!(format_percent(75), "75% Spent");
    }
}
