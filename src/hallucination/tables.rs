//! Closed valid-range tables for statute sections and constitutional
//! articles.

/// Parses a statute section token like "498A" or "376" into a
/// `(numeric_part, suffix)` pair, e.g. `(498, Some('A'))`.
fn split_section(token: &str) -> Option<(u32, Option<String>)> {
    let digits_end = token.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        let n: u32 = token.parse().ok()?;
        return Some((n, None));
    }
    let (digits, suffix) = token.split_at(digits_end);
    let n: u32 = digits.parse().ok()?;
    Some((n, Some(suffix.to_ascii_uppercase())))
}

/// IPC exception sections outside the 1-511 numeric range.
const IPC_EXTRA: &[&str] = &["498A", "376A", "376B", "376C", "376D"];
/// IT Act exception sections outside the 1-87 numeric range.
const IT_ACT_EXTRA: &[&str] = &["66A", "66B", "66C", "66D", "66E", "66F"];
/// Constitution articles outside the 1-395 numeric range.
const CONSTITUTION_EXTRA: &[&str] = &["12A", "21A", "35A", "51A", "371A", "371B"];

/// Returns `Some((min, max))` for the numeric range of `code`, or
/// `None` if `code` is not a recognized statute.
fn numeric_range(code: &str) -> Option<(u32, u32)> {
    match code.to_ascii_uppercase().as_str() {
        "IPC" => Some((1, 511)),
        "CRPC" => Some((1, 484)),
        "CPC" => Some((1, 158)),
        "IT ACT" | "IT" => Some((1, 87)),
        "EVIDENCE ACT" | "EVIDENCE" => Some((1, 167)),
        _ => None,
    }
}

fn extra_sections(code: &str) -> &'static [&'static str] {
    match code.to_ascii_uppercase().as_str() {
        "IPC" => IPC_EXTRA,
        "IT ACT" | "IT" => IT_ACT_EXTRA,
        _ => &[],
    }
}

/// True if `section` is a valid section of `code`, per the closed
/// valid-section sets above.
#[must_use]
pub fn is_valid_statute_section(code: &str, section: &str) -> Option<bool> {
    let (min, max) = numeric_range(code)?;
    let (n, suffix) = split_section(section)?;

    if suffix.is_none() {
        return Some(n >= min && n <= max);
    }

    let normalized = format!("{n}{}", suffix.unwrap());
    Some(extra_sections(code).iter().any(|s| s.eq_ignore_ascii_case(&normalized)))
}

/// Returns the human-readable valid range description for a code, used
/// in `suspected_fake` reasons.
#[must_use]
pub fn valid_range_description(code: &str) -> String {
    match numeric_range(code) {
        Some((min, max)) => {
            let extras = extra_sections(code);
            if extras.is_empty() {
                format!("{min}-{max}")
            } else {
                format!("{min}-{max} and {}", extras.join(", "))
            }
        }
        None => "unknown code".to_string(),
    }
}

/// True if `article` is a valid Constitution article number: 1-395
/// plus the listed exceptions.
#[must_use]
pub fn is_valid_constitution_article(article: &str) -> Option<bool> {
    let (n, suffix) = split_section(article)?;
    if suffix.is_none() {
        return Some((1..=395).contains(&n));
    }
    let normalized = format!("{n}{}", suffix.unwrap());
    Some(CONSTITUTION_EXTRA.iter().any(|a| a.eq_ignore_ascii_case(&normalized)))
}

/// Human-readable valid range description for Constitution articles.
#[must_use]
pub fn constitution_range_description() -> String {
    format!("1-395 and {}", CONSTITUTION_EXTRA.join(", "))
}
