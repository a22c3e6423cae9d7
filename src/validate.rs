//! Declarative request validation: sanitize a field, run its rules, collect
//! every failure instead of stopping at the first one.

use serde::Serialize;

/// One failed rule, addressed to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub field: String,
}

/// Constraint applied to a sanitized value.
pub enum Rule {
    NotEmpty { message: &'static str },
    Length { min: usize, max: Option<usize>, message: &'static str },
}

/// Trim surrounding whitespace and HTML-escape characters that could end up
/// interpreted downstream. Mirrors the usual `trim().escape()` sanitizer
/// chain: rules run on the escaped value.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sanitize `raw` and check it against `rules`, appending one entry per
/// failed rule. Returns the sanitized value either way so callers can keep
/// validating the remaining fields.
pub fn check_field(
    field: &'static str,
    raw: &str,
    rules: &[Rule],
    errors: &mut Vec<FieldError>,
) -> String {
    let value = sanitize(raw);
    let len = value.chars().count();
    for rule in rules {
        let failed = match rule {
            Rule::NotEmpty { .. } => value.is_empty(),
            Rule::Length { min, max, .. } => len < *min || max.map_or(false, |m| len > m),
        };
        if failed {
            let message = match rule {
                Rule::NotEmpty { message } | Rule::Length { message, .. } => *message,
            };
            errors.push(FieldError {
                message: message.to_string(),
                field: field.to_string(),
            });
        }
    }
    value
}

/// Sanitized credentials accepted for registration and login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

pub fn validate_credentials(name: &str, password: &str) -> Result<Credentials, Vec<FieldError>> {
    let mut errors = Vec::new();
    let name = check_field(
        "name",
        name,
        &[
            Rule::NotEmpty { message: "username is required" },
            Rule::Length { min: 3, max: Some(30), message: "must be between 3 and 30 characters" },
        ],
        &mut errors,
    );
    let password = check_field(
        "password",
        password,
        &[
            Rule::NotEmpty { message: "password is required" },
            Rule::Length { min: 6, max: None, message: "minimum 6 characters" },
        ],
        &mut errors,
    );
    if errors.is_empty() {
        Ok(Credentials { name, password })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_credentials() {
        let creds = validate_credentials("  merlin  ", "hunter42").expect("valid");
        assert_eq!(creds.name, "merlin");
        assert_eq!(creds.password, "hunter42");
    }

    #[test]
    fn escapes_dangerous_characters() {
        assert_eq!(sanitize("<b>&'\"</b>"), "&lt;b&gt;&amp;&#x27;&quot;&lt;&#x2F;b&gt;");
        assert_eq!(sanitize("  plain  "), "plain");
    }

    #[test]
    fn collects_all_errors_in_field_order() {
        let errors = validate_credentials("", "abc").unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        // empty name fails both of its rules, short password fails length
        assert_eq!(fields, vec!["name", "name", "password"]);
        assert_eq!(errors[0].message, "username is required");
        assert_eq!(errors[1].message, "must be between 3 and 30 characters");
        assert_eq!(errors[2].message, "minimum 6 characters");
    }

    #[test]
    fn name_length_bounds() {
        assert!(validate_credentials("ab", "secret1").is_err());
        assert!(validate_credentials("abc", "secret1").is_ok());
        assert!(validate_credentials(&"x".repeat(30), "secret1").is_ok());
        assert!(validate_credentials(&"x".repeat(31), "secret1").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_credentials("merlin", "12345").is_err());
        assert!(validate_credentials("merlin", "123456").is_ok());
    }

    #[test]
    fn whitespace_only_password_is_required_error() {
        let errors = validate_credentials("merlin", "      ").unwrap_err();
        assert_eq!(errors[0].field, "password");
        assert_eq!(errors[0].message, "password is required");
    }

    #[test]
    fn field_error_serializes_message_and_field() {
        let err = FieldError { message: "minimum 6 characters".into(), field: "password".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["message"], "minimum 6 characters");
        assert_eq!(json["field"], "password");
    }
}
