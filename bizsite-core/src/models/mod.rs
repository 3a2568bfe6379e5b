pub mod blog;
pub mod contact;
pub mod project;
pub mod session;
pub mod testimonial;
pub mod user;

pub use blog::BlogPost;
pub use contact::ContactMessage;
pub use project::Project;
pub use session::Session;
pub use testimonial::Testimonial;
pub use user::User;

use crate::error::{AppError, AppResult};

/// Trims a required text input, failing with a validation error naming
/// `field` when it is absent or blank.
pub fn required(field: &str, value: Option<String>) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::missing(field)),
    }
}

/// Trims an optional text input; blank values become `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rejects values longer than `max` characters.
pub fn max_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::invalid(
            field,
            format!("The field {} must be at most {} characters", field, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("nombre", Some("  Ana ".into())).unwrap(), "Ana");
        assert_eq!(required("nombre", Some("   ".into())).unwrap_err().field(), Some("nombre"));
        assert_eq!(required("nombre", None).unwrap_err().field(), Some("nombre"));
    }

    #[test]
    fn test_optional_drops_blank_values() {
        assert_eq!(optional(Some(" ".into())), None);
        assert_eq!(optional(Some(" x ".into())), Some("x".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_max_len_counts_characters() {
        assert!(max_len("nombre", "ñandú", 5).is_ok());
        assert!(max_len("nombre", "ñandús", 5).is_err());
    }
}
