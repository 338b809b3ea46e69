//! Input validation for parking domain fields. All functions reject before
//! any state change; messages are surfaced to the caller verbatim.

use crate::error::AppError;

pub const MAX_SPOTS_PER_LOT: i32 = 1000;

/// Vehicle numbers are 6-10 alphanumeric characters after removing spaces;
/// stored uppercased.
pub fn normalize_vehicle_number(raw: &str) -> Result<String, AppError> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if cleaned.len() < 6 || cleaned.len() > 10 || !cleaned.chars().all(|ch| ch.is_alphanumeric())
    {
        return Err(AppError::bad_request("Invalid vehicle number"));
    }
    Ok(cleaned)
}

pub fn validate_pin_code(raw: &str) -> Result<String, AppError> {
    let cleaned: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if cleaned.len() < 5 || cleaned.len() > 10 || !cleaned.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(AppError::bad_request("Invalid pin code"));
    }
    Ok(cleaned)
}

pub fn validate_hourly_rate(rate: f64) -> Result<(), AppError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(AppError::bad_request("Invalid hourly rate"));
    }
    Ok(())
}

pub fn validate_spot_count(count: i32) -> Result<(), AppError> {
    if count < 1 || count > MAX_SPOTS_PER_LOT {
        return Err(AppError::bad_request("Invalid number of spots"));
    }
    Ok(())
}

/// Latitude and longitude are optional but must come as a pair.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), AppError> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
                Ok(())
            } else {
                Err(AppError::bad_request("Invalid coordinates"))
            }
        }
        _ => Err(AppError::bad_request(
            "Latitude and longitude must be provided together",
        )),
    }
}

pub fn validate_email(raw: &str) -> Result<(), AppError> {
    let trimmed = raw.trim();
    let valid = trimmed.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !valid {
        return Err(AppError::bad_request("Invalid email address"));
    }
    Ok(())
}

/// Phone numbers are optional; when present, 10-15 digits once separators
/// are stripped.
pub fn validate_phone_number(raw: &str) -> Result<(), AppError> {
    let digits = raw.chars().filter(|ch| ch.is_ascii_digit()).count();
    if !(10..=15).contains(&digits) {
        return Err(AppError::bad_request("Invalid phone number"));
    }
    Ok(())
}

/// Spot numbers follow the lot's insertion order: S001, S002, ...
pub fn spot_number(index: i32) -> String {
    format!("S{index:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_numbers_are_cleaned_and_uppercased() {
        assert_eq!(
            normalize_vehicle_number("ka 01 ab 1234").expect("should validate"),
            "KA01AB1234"
        );
        assert!(normalize_vehicle_number("ab1").is_err());
        assert!(normalize_vehicle_number("toolongvehicleno").is_err());
        assert!(normalize_vehicle_number("ab-1234").is_err());
        assert!(normalize_vehicle_number("").is_err());
    }

    #[test]
    fn pin_codes_are_digit_only() {
        assert_eq!(validate_pin_code("560 001").expect("should validate"), "560001");
        assert!(validate_pin_code("12ab5").is_err());
        assert!(validate_pin_code("123").is_err());
    }

    #[test]
    fn hourly_rate_must_be_non_negative_and_finite() {
        assert!(validate_hourly_rate(0.0).is_ok());
        assert!(validate_hourly_rate(12.5).is_ok());
        assert!(validate_hourly_rate(-1.0).is_err());
        assert!(validate_hourly_rate(f64::NAN).is_err());
    }

    #[test]
    fn spot_count_bounds() {
        assert!(validate_spot_count(1).is_ok());
        assert!(validate_spot_count(1000).is_ok());
        assert!(validate_spot_count(0).is_err());
        assert!(validate_spot_count(1001).is_err());
    }

    #[test]
    fn coordinates_come_in_pairs() {
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(12.97), Some(77.59)).is_ok());
        assert!(validate_coordinates(Some(12.97), None).is_err());
        assert!(validate_coordinates(Some(91.0), Some(0.0)).is_err());
        assert!(validate_coordinates(Some(0.0), Some(181.0)).is_err());
    }

    #[test]
    fn emails_need_local_part_and_dotted_domain() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("alice").is_err());
    }

    #[test]
    fn phone_numbers_count_digits_only() {
        assert!(validate_phone_number("+91 98765 43210").is_ok());
        assert!(validate_phone_number("12345").is_err());
    }

    #[test]
    fn spot_numbers_are_zero_padded() {
        assert_eq!(spot_number(1), "S001");
        assert_eq!(spot_number(42), "S042");
        assert_eq!(spot_number(1000), "S1000");
    }
}
