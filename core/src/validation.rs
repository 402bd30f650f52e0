//! Customer detail validation.

use crate::error::ValidationError;

/// Whether `name` is acceptable: only ASCII letters and whitespace, with at
/// least one letter
#[must_use]
pub fn validate_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

/// Whether `phone` is acceptable: one or more ASCII digits, nothing else
#[must_use]
pub fn validate_phone(phone: &str) -> bool {
    !phone.is_empty() && phone.chars().all(|c| c.is_ascii_digit())
}

/// Name and phone that passed validation
///
/// The only input accepted by [`crate::types::OrderRequest::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerDetails {
    name: String,
    phone: String,
}

impl CustomerDetails {
    /// Validates and wraps the customer's details
    ///
    /// The name is checked first.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidName`] or
    /// [`ValidationError::InvalidPhone`].
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let phone = phone.into();
        if !validate_name(&name) {
            return Err(ValidationError::InvalidName);
        }
        if !validate_phone(&phone) {
            return Err(ValidationError::InvalidPhone);
        }
        Ok(Self { name, phone })
    }

    /// Customer's name as entered
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Customer's phone as entered
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.name, self.phone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(validate_name("Ada Lovelace"));
        assert!(validate_name("  Grace\tHopper "));
        assert!(!validate_name(""));
        assert!(!validate_name("   "));
        assert!(!validate_name("R2D2"));
        assert!(!validate_name("O'Brien"));
        assert!(!validate_name("Zoë"));
    }

    #[test]
    fn test_phones() {
        assert!(validate_phone("07123456789"));
        assert!(validate_phone("0"));
        assert!(!validate_phone(""));
        assert!(!validate_phone("+447123"));
        assert!(!validate_phone("0712 345"));
        assert!(!validate_phone("٣٤٥"));
    }

    #[test]
    fn test_customer_details_reports_first_failure() {
        assert_eq!(CustomerDetails::new("", ""), Err(ValidationError::InvalidName));
        assert_eq!(CustomerDetails::new("Ada", "abc"), Err(ValidationError::InvalidPhone));

        let Ok(details) = CustomerDetails::new("Ada", "0123") else {
            unreachable!("valid details are accepted");
        };
        assert_eq!(details.name(), "Ada");
        assert_eq!(details.phone(), "0123");
    }
}
