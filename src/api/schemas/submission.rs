use crate::domain::submission::{ProductInterest, SubmissionInput};
use crate::error::AppError;
use lettre::Address;
use serde::Deserialize;

const MAX_FIELD_CHARS: usize = 256;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_PRODUCTS: usize = 20;

/// The `product` key accepts either a single name or a list of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductField {
    One(String),
    Many(Vec<String>),
}

impl ProductField {
    #[must_use]
    pub fn normalize(self) -> ProductInterest {
        match self {
            Self::One(product) => ProductInterest::single(&product),
            Self::Many(products) => ProductInterest::new(products),
        }
    }
}

/// Normalizes an optional `product` value. Absent and null both become an empty list.
#[must_use]
pub fn normalize_products(field: Option<ProductField>) -> ProductInterest {
    field.map(ProductField::normalize).unwrap_or_default()
}

/// Contact form payload as posted by the website.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub product: Option<ProductField>,
    pub message: Option<String>,
    /// Honeypot. Hidden from people, so only bots fill it in.
    pub website: Option<String>,
}

impl SubmissionRequest {
    /// Decodes the JSON body.
    ///
    /// # Errors
    /// Returns `AppError::MalformedInput` if the body is not a JSON object of the expected shape.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| AppError::MalformedInput(format!("Invalid JSON body: {e}")))
    }

    /// Validates the payload into a submission.
    ///
    /// Required fields are checked first, then the honeypot, then formats and limits.
    /// An empty `allowed_products` accepts any product.
    ///
    /// # Errors
    /// Returns `AppError::MissingField`, `AppError::SpamRejected`, or `AppError::MalformedInput`.
    pub fn validate(self, allowed_products: &[String]) -> Result<SubmissionInput, AppError> {
        let full_name = required(self.full_name, "fullName")?;
        let email = required(self.email, "email")?;
        let products = normalize_products(self.product);
        if products.is_empty() {
            return Err(AppError::MissingField("product"));
        }
        let message = required(self.message, "message")?;

        if self.website.as_deref().is_some_and(|w| !w.trim().is_empty()) {
            return Err(AppError::SpamRejected);
        }

        let phone = optional(self.phone);
        let company = optional(self.company);

        check_len("fullName", &full_name, MAX_FIELD_CHARS)?;
        check_len("email", &email, MAX_FIELD_CHARS)?;
        check_len("message", &message, MAX_MESSAGE_CHARS)?;
        if let Some(phone) = &phone {
            check_len("phone", phone, MAX_FIELD_CHARS)?;
        }
        if let Some(company) = &company {
            check_len("company", company, MAX_FIELD_CHARS)?;
        }
        if products.len() > MAX_PRODUCTS {
            return Err(AppError::MalformedInput(format!("Too many products (max {MAX_PRODUCTS})")));
        }
        for product in products.as_slice() {
            check_len("product", product, MAX_FIELD_CHARS)?;
            if !allowed_products.is_empty() && !allowed_products.contains(product) {
                return Err(AppError::MalformedInput(format!("Unknown product: {product}")));
            }
        }

        if email.parse::<Address>().is_err() {
            return Err(AppError::MalformedInput("Invalid email address".into()));
        }

        Ok(SubmissionInput { full_name, email, phone, company, products, message })
    }
}

/// Decodes and validates a request body.
///
/// # Errors
/// See [`SubmissionRequest::parse`] and [`SubmissionRequest::validate`].
pub fn validate_request(body: &[u8], allowed_products: &[String]) -> Result<SubmissionInput, AppError> {
    SubmissionRequest::parse(body)?.validate(allowed_products)
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    optional(value).ok_or(AppError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::MalformedInput(format!("{field} is too long (max {max} characters)")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "fullName": "Ada Obi",
            "email": "ada@example.com",
            "phone": "+234 800 000 0000",
            "company": "",
            "product": "Cocoa Beans",
            "message": "Please send a quote",
            "website": ""
        })
    }

    #[test]
    fn test_valid_submission() {
        let input = validate_request(&body(&valid()), &[]).unwrap();
        assert_eq!(input.full_name, "Ada Obi");
        assert_eq!(input.phone.as_deref(), Some("+234 800 000 0000"));
        assert_eq!(input.company, None);
        assert_eq!(input.products.as_slice(), ["Cocoa Beans"]);
    }

    #[test]
    fn test_malformed_body() {
        for raw in [&b"{"[..], b"", b"null", b"\"text\"", br#"{"fullName": 42}"#] {
            let err = validate_request(raw, &[]).unwrap_err();
            assert!(matches!(err, AppError::MalformedInput(_)), "{}", String::from_utf8_lossy(raw));
        }
    }

    #[test]
    fn test_missing_fields_are_named() {
        for field in ["fullName", "email", "product", "message"] {
            let mut payload = valid();
            payload.as_object_mut().unwrap().remove(field);
            let err = validate_request(&body(&payload), &[]).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing required field: {field}"));
        }
    }

    #[test]
    fn test_blank_required_fields_count_as_missing() {
        let mut payload = valid();
        payload["message"] = json!("   ");
        assert!(matches!(
            validate_request(&body(&payload), &[]),
            Err(AppError::MissingField("message"))
        ));

        let mut payload = valid();
        payload["product"] = json!([]);
        assert!(matches!(
            validate_request(&body(&payload), &[]),
            Err(AppError::MissingField("product"))
        ));
    }

    #[test]
    fn test_honeypot_rejected() {
        let mut payload = valid();
        payload["website"] = json!("http://spam.example");
        assert!(matches!(validate_request(&body(&payload), &[]), Err(AppError::SpamRejected)));
    }

    #[test]
    fn test_honeypot_checked_before_email() {
        let mut payload = valid();
        payload["website"] = json!("x");
        payload["email"] = json!("bad");
        assert!(matches!(validate_request(&body(&payload), &[]), Err(AppError::SpamRejected)));
    }

    #[test]
    fn test_invalid_email() {
        let mut payload = valid();
        payload["email"] = json!("not-an-email");
        let err = validate_request(&body(&payload), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email address");
    }

    #[test]
    fn test_product_normalization() {
        assert_eq!(normalize_products(Some(ProductField::One("Cocoa".into()))).as_slice(), ["Cocoa"]);
        assert_eq!(
            normalize_products(Some(ProductField::Many(vec!["Cocoa".into(), "Cashew".into()]))).as_slice(),
            ["Cocoa", "Cashew"]
        );
        assert!(normalize_products(None).is_empty());
        assert!(normalize_products(Some(ProductField::One(String::new()))).is_empty());
    }

    #[test]
    fn test_product_list_accepted() {
        let mut payload = valid();
        payload["product"] = json!(["Cocoa Beans", "Shea Butter"]);
        let input = validate_request(&body(&payload), &[]).unwrap();
        assert_eq!(input.products.as_slice(), ["Cocoa Beans", "Shea Butter"]);
    }

    #[test]
    fn test_product_allowlist() {
        let allowed = vec!["Cocoa Beans".to_string()];
        assert!(validate_request(&body(&valid()), &allowed).is_ok());

        let mut payload = valid();
        payload["product"] = json!("Gold");
        let err = validate_request(&body(&payload), &allowed).unwrap_err();
        assert_eq!(err.to_string(), "Unknown product: Gold");
    }

    #[test]
    fn test_field_limits() {
        let mut payload = valid();
        payload["message"] = json!("x".repeat(MAX_MESSAGE_CHARS + 1));
        let err = validate_request(&body(&payload), &[]).unwrap_err();
        assert_eq!(err.to_string(), "message is too long (max 5000 characters)");
    }
}
