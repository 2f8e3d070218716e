//! Client-side field checks. These run before any network call — a draft
//! that fails validation is never enqueued and never leaves the device.

/// A field check failed. Blocks submission; surfaced next to the field.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} doesn't look right: {hint}")]
    Invalid {
        field: &'static str,
        hint: &'static str,
    },
}

/// A draft that can be submitted through a form.
pub trait FormDraft: tether::Draft {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(())
    }
}

/// Loose phone-number shape check: enough digits to plausibly dial.
pub(crate) fn looks_like_phone(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 7 {
        return Err(ValidationError::Invalid {
            field,
            hint: "expected a phone number",
        });
    }
    Ok(())
}

/// Loose email shape check — a real check happens server-side.
pub(crate) fn looks_like_email(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ValidationError::Invalid {
            field,
            hint: "expected an email address",
        });
    };
    if local.is_empty() || !domain.contains('.') {
        return Err(ValidationError::Invalid {
            field,
            hint: "expected an email address",
        });
    }
    Ok(())
}
