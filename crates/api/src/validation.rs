//! Input validation at the transport edge.
//!
//! Rejected input becomes [`AppError::ValidationFailed`] before any handler
//! runs. Messages are localized; the reported field is the first one that
//! failed.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use common::{AggregateId, Localizer};
use domain::AppError;
use domain::customer::CustomerDetails;
use domain::owner::OwnerDetails;
use domain::property::PropertyDetails;

/// Types checked before being dispatched.
pub trait Validate {
    fn validate(&self, rules: &mut Rules<'_>);
}

/// Accumulates rule violations for one input.
pub struct Rules<'a> {
    localizer: &'a dyn Localizer,
    first_field: Option<String>,
    messages: Vec<String>,
}

impl<'a> Rules<'a> {
    pub fn new(localizer: &'a dyn Localizer) -> Self {
        Self {
            localizer,
            first_field: None,
            messages: Vec::new(),
        }
    }

    pub fn not_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "'{0}' must not be empty.", &[field]);
        }
        self
    }

    pub fn at_least(&mut self, field: &str, value: f64, min: f64) -> &mut Self {
        if value.is_nan() || value < min {
            let min = min.to_string();
            self.fail(
                field,
                "'{0}' must be greater than or equal to {1}.",
                &[field, min.as_str()],
            );
        }
        self
    }

    /// Skipped when the value is empty; pair with [`Rules::not_empty`].
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        let value = value.trim();
        if !value.is_empty() && !looks_like_email(value) {
            self.fail(field, "'{0}' is not a valid email address.", &[field]);
        }
        self
    }

    /// Skipped unless both bounds are present.
    pub fn ordered<T: PartialOrd>(
        &mut self,
        field: &str,
        lower: Option<&T>,
        other: &str,
        upper: Option<&T>,
    ) -> &mut Self {
        if let (Some(lower), Some(upper)) = (lower, upper)
            && lower > upper
        {
            self.fail(field, "'{0}' must not be later than '{1}'.", &[field, other]);
        }
        self
    }

    fn fail(&mut self, field: &str, key: &str, args: &[&str]) {
        self.first_field.get_or_insert_with(|| field.to_string());
        self.messages.push(self.localizer.translate(key, args));
    }

    pub fn finish(self) -> Result<(), AppError> {
        match self.first_field {
            None => Ok(()),
            Some(field) => Err(AppError::validation(field, self.messages)),
        }
    }
}

/// Runs the rules of `input`.
pub fn validate<T: Validate>(input: &T, localizer: &dyn Localizer) -> Result<(), AppError> {
    let mut rules = Rules::new(localizer);
    input.validate(&mut rules);
    rules.finish()
}

impl Validate for PropertyDetails {
    fn validate(&self, rules: &mut Rules<'_>) {
        rules
            .not_empty("Name", &self.name)
            .not_empty("PropertyType", &self.property_type)
            .not_empty("Address", &self.address)
            .at_least("Price", self.price, 0.0)
            .at_least("Area", self.area, 0.0);
    }
}

impl Validate for CustomerDetails {
    fn validate(&self, rules: &mut Rules<'_>) {
        rules
            .not_empty("Name", &self.name)
            .not_empty("Surname", &self.surname)
            .not_empty("Email", &self.email)
            .email("Email", &self.email);
    }
}

impl Validate for OwnerDetails {
    fn validate(&self, rules: &mut Rules<'_>) {
        rules
            .not_empty("Name", &self.name)
            .not_empty("Surname", &self.surname)
            .not_empty("Email", &self.email)
            .email("Email", &self.email);
    }
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !value.contains(char::is_whitespace)
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
        }
        _ => false,
    }
}

/// Parses a path identifier.
pub fn parse_id(field: &str, raw: &str, localizer: &dyn Localizer) -> Result<AggregateId, AppError> {
    raw.parse().map_err(|_| {
        AppError::validation(
            field,
            vec![localizer.translate("'{0}' is not a valid identifier.", &[field])],
        )
    })
}

pub fn body_rejection(rejection: JsonRejection, localizer: &dyn Localizer) -> AppError {
    tracing::debug!(reason = %rejection.body_text(), "request body rejected");
    AppError::validation("body", vec![localizer.text("The request body is invalid.")])
}

pub fn query_rejection(rejection: QueryRejection, localizer: &dyn Localizer) -> AppError {
    tracing::debug!(reason = %rejection.body_text(), "query string rejected");
    AppError::validation("query", vec![localizer.text("The query string is invalid.")])
}

#[cfg(test)]
mod tests {
    use common::ResourceLocalizer;

    use super::*;

    fn property() -> PropertyDetails {
        PropertyDetails {
            name: "Casa del Mar".to_string(),
            description: String::new(),
            property_type: "House".to_string(),
            owner_id: None,
            address: "Av. Costanera 12".to_string(),
            price: 250_000.0,
            area: 120.0,
            rooms: 3,
            bathrooms: 2,
            published: true,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Ana".to_string(),
            surname: "Pérez".to_string(),
            email: "ana@example.com".to_string(),
            phone_number: String::new(),
            gender: String::new(),
            group: String::new(),
        }
    }

    #[test]
    fn valid_inputs_pass() {
        let en = ResourceLocalizer::default();
        assert!(validate(&property(), &en).is_ok());
        assert!(validate(&customer(), &en).is_ok());
    }

    #[test]
    fn empty_name_and_negative_price_are_reported() {
        let en = ResourceLocalizer::default();
        let mut details = property();
        details.name = "  ".to_string();
        details.price = -1.0;

        match validate(&details, &en) {
            Err(AppError::ValidationFailed { field, messages }) => {
                assert_eq!(field, "Name");
                assert_eq!(
                    messages,
                    vec![
                        "'Name' must not be empty.".to_string(),
                        "'Price' must be greater than or equal to 0.".to_string(),
                    ]
                );
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn messages_follow_culture() {
        let es = ResourceLocalizer::new("es");
        let mut details = customer();
        details.email = "not-an-email".to_string();

        let error = validate(&details, &es).unwrap_err();
        assert_eq!(error.status_code(), 400);
        assert_eq!(
            error.messages(&es),
            vec!["'Email' no es un correo electrónico válido.".to_string()]
        );
    }

    #[test]
    fn owner_requires_contact_email() {
        let en = ResourceLocalizer::default();
        let owner = OwnerDetails {
            name: "Rosa".to_string(),
            surname: "Díaz".to_string(),
            email: "rosa.example.com".to_string(),
            address: String::new(),
            image_url: String::new(),
            phone_number: String::new(),
            birthday: String::new(),
            gender: String::new(),
            group: String::new(),
        };

        match validate(&owner, &en) {
            Err(AppError::ValidationFailed { field, .. }) => assert_eq!(field, "Email"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn ordered_bounds() {
        let en = ResourceLocalizer::default();

        let mut rules = Rules::new(&en);
        rules.ordered("from", Some(&1), "to", Some(&2));
        rules.ordered("from", None, "to", Some(&0));
        assert!(rules.finish().is_ok());

        let mut rules = Rules::new(&en);
        rules.ordered("from", Some(&3), "to", Some(&2));
        let error = rules.finish().unwrap_err();
        assert_eq!(
            error.messages(&en),
            vec!["'from' must not be later than 'to'.".to_string()]
        );
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ana@example.com"));
        assert!(looks_like_email("a.b+c@mail.example.org"));
        assert!(!looks_like_email("ana@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana@@example.com"));
        assert!(!looks_like_email("ana @example.com"));
        assert!(!looks_like_email("ana@example..com"));
    }

    #[test]
    fn malformed_id_is_a_validation_failure() {
        let en = ResourceLocalizer::default();
        assert!(parse_id("id", &AggregateId::new().to_string(), &en).is_ok());

        let error = parse_id("id", "42", &en).unwrap_err();
        assert_eq!(
            error.messages(&en),
            vec!["'id' is not a valid identifier.".to_string()]
        );
    }
}
