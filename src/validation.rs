use crate::error::{AppError, AppResult};

/// "zip_code" -> "Zip Code"
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fails with "<Field> is required" on the first blank value, in order.
pub fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "{} is required",
                field_label(name)
            )));
        }
    }
    Ok(())
}

/// Fails with "<Field> must be at most N characters" on the first value
/// longer than its column allows. Length is counted after trimming.
pub fn check_lengths(fields: &[(&str, &str, usize)]) -> AppResult<()> {
    for (name, value, max_len) in fields {
        if value.trim().chars().count() > *max_len {
            return Err(AppError::BadRequest(format!(
                "{} must be at most {max_len} characters",
                field_label(name)
            )));
        }
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::BadRequest("Invalid email address".into())),
    }
}

/// Trims an optional text field, mapping blank to `None` and enforcing a length cap.
pub fn optional_text(field: &str, value: Option<String>, max_len: usize) -> AppResult<Option<String>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if let Some(v) = &value {
        if v.chars().count() > max_len {
            return Err(AppError::BadRequest(format!(
                "{} must be at most {max_len} characters",
                field_label(field)
            )));
        }
    }
    Ok(value)
}
