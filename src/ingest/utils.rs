/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Parse a numeric cell. Blank cells are missing values, not zero.
pub fn parse_number(raw: &str) -> Option<Result<f64, std::num::ParseFloatError>> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(cleaned.parse::<f64>())
}
