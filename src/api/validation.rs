use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;

pub const FINISH_TYPES: &[&str] = &[
    "cream",
    "shimmer",
    "glitter",
    "matte",
    "magnetic",
    "thermal",
];

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid regex"))
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    if name.len() > 255 {
        return Err(ApiError::validation("Name must be 255 characters or less"));
    }

    Ok(name)
}

pub fn validate_finish_type(finish: &str) -> Result<&str, ApiError> {
    if FINISH_TYPES.contains(&finish) {
        Ok(finish)
    } else {
        Err(ApiError::validation(format!(
            "Finish type must be one of: {}",
            FINISH_TYPES.join(", ")
        )))
    }
}

pub fn validate_color_hex(color: &str) -> Result<&str, ApiError> {
    if hex_color_regex().is_match(color) {
        Ok(color)
    } else {
        Err(ApiError::validation(
            "Color must be a hex value like #AA3366",
        ))
    }
}

pub fn validate_price(price: f64) -> Result<f64, ApiError> {
    if (0.0..=999.99).contains(&price) {
        Ok(price)
    } else {
        Err(ApiError::validation("Price must be between 0 and 999.99"))
    }
}

pub fn validate_rating(rating: i32) -> Result<i32, ApiError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ApiError::validation(
            "Rating must be an integer between 1 and 5",
        ))
    }
}

pub fn validate_notes(notes: &str) -> Result<&str, ApiError> {
    if notes.len() > 1000 {
        return Err(ApiError::validation(
            "Notes must be 1000 characters or less",
        ));
    }
    Ok(notes)
}

pub fn validate_tags(tags: &[String]) -> Result<&[String], ApiError> {
    if tags.iter().any(|tag| tag.len() > 50) {
        return Err(ApiError::validation(
            "Each tag must be 50 characters or less",
        ));
    }
    Ok(tags)
}

pub fn validate_purchase_date(date: &str) -> Result<&str, ApiError> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("Purchase date must be a date like 2024-03-01"))?;
    Ok(date)
}

/// Usage timestamps are stored as strings and sorted lexically, so
/// anything that is not RFC 3339 would corrupt the ordering.
pub fn validate_used_at(timestamp: &str) -> Result<&str, ApiError> {
    chrono::DateTime::parse_from_rfc3339(timestamp).map_err(|_| {
        ApiError::validation("Usage timestamp must be an RFC 3339 datetime")
    })?;
    Ok(timestamp)
}

/// Page size for listings; the cap keeps a single response bounded.
pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 100;

    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between 1 and {}",
            limit, MAX_LIMIT
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ruby Red").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
        assert!(validate_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_finish_type() {
        assert!(validate_finish_type("cream").is_ok());
        assert!(validate_finish_type("magnetic").is_ok());
        assert!(validate_finish_type("thermal").is_ok());
        assert!(validate_finish_type("Cream").is_err());
        assert!(validate_finish_type("holographic").is_err());
        assert!(validate_finish_type("chrome").is_err());
    }

    #[test]
    fn test_validate_color_hex() {
        assert!(validate_color_hex("#AA3366").is_ok());
        assert!(validate_color_hex("#aa3366").is_ok());
        assert!(validate_color_hex("AA3366").is_err());
        assert!(validate_color_hex("#AA336").is_err());
        assert!(validate_color_hex("#AA33666").is_err());
        assert!(validate_color_hex("#GG3366").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(999.99).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(1000.0).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_tags() {
        let ok = vec!["fall".to_string(), "work-safe".to_string()];
        assert!(validate_tags(&ok).is_ok());

        let too_long = vec!["y".repeat(51)];
        assert!(validate_tags(&too_long).is_err());
    }

    #[test]
    fn test_validate_purchase_date() {
        assert!(validate_purchase_date("2024-03-01").is_ok());
        assert!(validate_purchase_date("2024-13-01").is_err());
        assert!(validate_purchase_date("yesterday").is_err());
    }

    #[test]
    fn test_validate_used_at() {
        assert!(validate_used_at("2026-04-01T18:30:00Z").is_ok());
        assert!(validate_used_at("2026-04-01T18:30:00+02:00").is_ok());
        assert!(validate_used_at("2026-04-01").is_err());
        assert!(validate_used_at("last tuesday").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
    }
}
