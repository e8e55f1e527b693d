//! Value formatting for resolved text

use sheet_model::{CaseTransform, TextFormat};

/// Apply number formatting, case transform and affixes
///
/// Number options only touch values that parse as a number. Prefix and
/// suffix are skipped for empty values so a missing price does not render
/// as a lone currency sign.
pub fn format_value(text: &str, format: &TextFormat) -> String {
    if format.is_identity() {
        return text.to_string();
    }

    let mut value = format_number(text, format).unwrap_or_else(|| text.to_string());

    value = match format.transform {
        Some(CaseTransform::Upper) => value.to_uppercase(),
        Some(CaseTransform::Lower) => value.to_lowercase(),
        Some(CaseTransform::Title) => title_case(&value),
        None => value,
    };

    if value.is_empty() {
        return value;
    }

    format!(
        "{}{}{}",
        format.prefix.as_deref().unwrap_or(""),
        value,
        format.suffix.as_deref().unwrap_or("")
    )
}

fn format_number(text: &str, format: &TextFormat) -> Option<String> {
    if format.decimals.is_none() && !format.thousands_separator {
        return None;
    }

    let trimmed = text.trim();
    let number: f64 = trimmed.parse().ok()?;
    if !number.is_finite() {
        return None;
    }

    let plain = match format.decimals {
        Some(decimals) => format!("{:.*}", decimals as usize, number),
        None => trimmed.to_string(),
    };

    if format.thousands_separator {
        Some(group_thousands(&plain))
    } else {
        Some(plain)
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}{}{}", sign, grouped, fraction)
}

fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            result.push(c);
        } else if at_word_start {
            result.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            result.extend(c.to_lowercase());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(format_value(" as is ", &TextFormat::default()), " as is ");
    }

    #[test]
    fn test_decimals_and_thousands() {
        let format = TextFormat { decimals: Some(2), thousands_separator: true, ..Default::default() };
        assert_eq!(format_value("1234567.5", &format), "1,234,567.50");
        assert_eq!(format_value("-1234", &format), "-1,234.00");
        assert_eq!(format_value("999", &format), "999.00");
    }

    #[test]
    fn test_non_numeric_untouched_by_number_options() {
        let format = TextFormat { decimals: Some(1), ..Default::default() };
        assert_eq!(format_value("n/a", &format), "n/a");
    }

    #[test]
    fn test_affixes_and_case() {
        let format = TextFormat {
            transform: Some(CaseTransform::Title),
            prefix: Some("Model: ".into()),
            suffix: Some(".".into()),
            ..Default::default()
        };
        assert_eq!(format_value("oSLO chair", &format), "Model: Oslo Chair.");
        assert_eq!(format_value("", &format), "");
    }

    #[test]
    fn test_upper_lower() {
        let upper = TextFormat { transform: Some(CaseTransform::Upper), ..Default::default() };
        let lower = TextFormat { transform: Some(CaseTransform::Lower), ..Default::default() };
        assert_eq!(format_value("Abc", &upper), "ABC");
        assert_eq!(format_value("Abc", &lower), "abc");
    }
}
