//! Listing form rules. Every rule is checked independently so a batch
//! validation reports all problems at once.

use url::Url;

const NAME_MAX_CHARS: usize = 100;
const TAGLINE_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Url,
    Tagline,
    Description,
    LogoUrl,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Url => "url",
            Field::Tagline => "tagline",
            Field::Description => "description",
            Field::LogoUrl => "logo_url",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Form contents; empty optional fields are stored as `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceForm {
    pub name: String,
    pub url: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl ServiceForm {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        tagline: Option<String>,
        description: Option<String>,
        logo_url: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tagline: non_empty(tagline),
            description: non_empty(description),
            logo_url: non_empty(logo_url),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

pub fn validate_name(value: &str) -> Result<(), &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > NAME_MAX_CHARS {
        return Err("Name must be 100 characters or fewer");
    }
    Ok(())
}

pub fn validate_url(value: &str) -> Result<(), &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("URL is required");
    }
    if !is_valid_url(trimmed) {
        return Err("Enter a valid URL");
    }
    Ok(())
}

pub fn validate_tagline(value: &str) -> Result<(), &'static str> {
    if value.chars().count() > TAGLINE_MAX_CHARS {
        return Err("Tagline must be 200 characters or fewer");
    }
    Ok(())
}

pub fn validate_description(value: &str) -> Result<(), &'static str> {
    if value.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err("Description must be 2000 characters or fewer");
    }
    Ok(())
}

pub fn validate_logo_url(value: &str) -> Result<(), &'static str> {
    if value.is_empty() || is_valid_url(value) {
        Ok(())
    } else {
        Err("Enter a valid logo URL")
    }
}

pub fn validate_all(form: &ServiceForm) -> Vec<FieldError> {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    let checks = [
        (Field::Name, validate_name(&form.name)),
        (Field::Url, validate_url(&form.url)),
        (Field::Tagline, validate_tagline(&optional(&form.tagline))),
        (Field::Description, validate_description(&optional(&form.description))),
        (Field::LogoUrl, validate_logo_url(&optional(&form.logo_url))),
    ];

    checks
        .into_iter()
        .filter_map(|(field, result)| result.err().map(|message| FieldError { field, message }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ServiceForm {
        ServiceForm::new("My Service", "https://example.com", None, None, None)
    }

    #[test]
    fn empty_form_reports_both_required_fields() {
        let errors = validate_all(&ServiceForm::default());

        assert_eq!(
            errors,
            vec![
                FieldError {
                    field: Field::Name,
                    message: "Name is required"
                },
                FieldError {
                    field: Field::Url,
                    message: "URL is required"
                },
            ]
        );
    }

    #[test]
    fn minimal_form_is_valid() {
        assert!(validate_all(&valid_form()).is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let form = ServiceForm::new(
            "x".repeat(101),
            "not a url",
            Some("t".repeat(201)),
            Some("d".repeat(2001)),
            Some("logo".into()),
        );

        let fields: Vec<Field> = validate_all(&form).into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Url,
                Field::Tagline,
                Field::Description,
                Field::LogoUrl
            ]
        );
    }

    #[test]
    fn name_is_trimmed_before_checks() {
        assert_eq!(validate_name("   "), Err("Name is required"));
        assert!(validate_name(&format!("  {}  ", "a".repeat(100))).is_ok());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        assert!(validate_name(&"あ".repeat(100)).is_ok());
        assert!(validate_name(&"あ".repeat(101)).is_err());
        assert!(validate_tagline(&"é".repeat(200)).is_ok());
        assert!(validate_description(&"字".repeat(2000)).is_ok());
    }

    #[test]
    fn tagline_and_description_limits_are_inclusive() {
        assert!(validate_tagline(&"t".repeat(200)).is_ok());
        assert!(validate_tagline(&"t".repeat(201)).is_err());
        assert!(validate_description(&"d".repeat(2000)).is_ok());
        assert!(validate_description(&"d".repeat(2001)).is_err());
    }

    #[test]
    fn urls_must_be_absolute() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("  https://example.com/path?q=1  ").is_ok());
        assert_eq!(validate_url("example.com"), Err("Enter a valid URL"));
        assert!(validate_logo_url("").is_ok());
        assert!(validate_logo_url("https://cdn.example.com/logo.png").is_ok());
        assert!(validate_logo_url("/logo.png").is_err());
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let form = ServiceForm::new("n", "https://u.dev", Some(String::new()), None, Some(String::new()));

        assert_eq!(form.tagline, None);
        assert_eq!(form.logo_url, None);
        assert!(validate_all(&form).is_empty());
    }
}
