use crate::utils::error::{FetchError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> FetchError {
    FetchError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// IIIF size 參數會直接嵌入 URL 路徑，例如 `!800,800`、`max`、`pct:50`
pub fn validate_image_size(field_name: &str, size: &str) -> Result<()> {
    validate_non_empty_string(field_name, size)?;
    if size.contains('/') || size.chars().any(char::is_whitespace) {
        return Err(invalid(
            field_name,
            size,
            "IIIF size must not contain '/' or whitespace",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_base", "https://repository.library.brown.edu").is_ok());
        assert!(validate_url("api_base", "http://localhost:8080").is_ok());
        assert!(validate_url("api_base", "").is_err());
        assert!(validate_url("api_base", "invalid-url").is_err());
        assert!(validate_url("api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output", "./images").is_ok());
        assert!(validate_path("output", "").is_err());
        assert!(validate_path("output", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("concurrent_requests", 4, 1, 64).is_ok());
        assert!(validate_range("concurrent_requests", 0, 1, 64).is_err());
        assert!(validate_range("retry_attempts", 11u32, 0, 10).is_err());
    }

    #[test]
    fn test_validate_image_size() {
        assert!(validate_image_size("image_size", "!800,800").is_ok());
        assert!(validate_image_size("image_size", "max").is_ok());
        assert!(validate_image_size("image_size", "").is_err());
        assert!(validate_image_size("image_size", "800/0").is_err());
        assert!(validate_image_size("image_size", "800, 800").is_err());
    }

    #[test]
    fn test_blank_string_rejected() {
        assert!(validate_non_empty_string("pid", "   ").is_err());
        assert!(validate_non_empty_string("pid", "bdr:1").is_ok());
    }
}
