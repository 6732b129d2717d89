//! Localized text lookup.
//!
//! Every user-facing message goes through a [`Localizer`]. Unknown keys fall
//! back to the key itself so a missing translation never hides a message.

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised while loading resource tables.
#[derive(Debug, Error)]
pub enum LocalizerError {
    #[error("Invalid resource table for culture '{culture}': {source}")]
    InvalidResources {
        culture: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Translates a message key, substituting positional `{0}`, `{1}` arguments.
pub trait Localizer: Send + Sync {
    fn translate(&self, key: &str, args: &[&str]) -> String;

    /// Shorthand for keys without arguments.
    fn text(&self, key: &str) -> String {
        self.translate(key, &[])
    }
}

const SPANISH: &[(&str, &str)] = &[
    ("Property Saved", "Propiedad guardada"),
    ("Property Updated", "Propiedad actualizada"),
    ("Property Deleted", "Propiedad eliminada"),
    ("Property Not Found!", "¡Propiedad no encontrada!"),
    ("Property already exists.", "La propiedad ya existe."),
    (
        "An error occurred while processing the {0}.",
        "Ocurrió un error al procesar {0}.",
    ),
    ("property", "la propiedad"),
    ("customer", "el cliente"),
    ("cart", "el carrito"),
    ("owner", "el propietario"),
    ("request", "la solicitud"),
    ("Customer Saved", "Cliente guardado"),
    ("Customer Updated", "Cliente actualizado"),
    ("Customer Deleted", "Cliente eliminado"),
    ("Customer Not Found!", "¡Cliente no encontrado!"),
    ("Customer already exists.", "El cliente ya existe."),
    ("Owner Saved", "Propietario guardado"),
    ("Owner Updated", "Propietario actualizado"),
    ("Owner Deleted", "Propietario eliminado"),
    ("Owner Not Found!", "¡Propietario no encontrado!"),
    ("Owner already exists.", "El propietario ya existe."),
    ("Cart Saved", "Carrito guardado"),
    ("Cart Deleted", "Carrito eliminado"),
    ("Cart Not Found!", "¡Carrito no encontrado!"),
    ("Cart Item Added", "Artículo agregado al carrito"),
    ("Cart Item Removed", "Artículo eliminado del carrito"),
    ("CartItem Not Found!", "¡Artículo del carrito no encontrado!"),
    ("Customer already has a cart.", "El cliente ya tiene un carrito."),
    ("Property is already in the cart.", "La propiedad ya está en el carrito."),
    ("'{0}' must not be empty.", "'{0}' no debe estar vacío."),
    (
        "'{0}' must be greater than or equal to {1}.",
        "'{0}' debe ser mayor o igual que {1}.",
    ),
    ("'{0}' is not a valid email address.", "'{0}' no es un correo electrónico válido."),
    ("'{0}' must not be later than '{1}'.", "'{0}' no debe ser posterior a '{1}'."),
    ("'{0}' is not a valid identifier.", "'{0}' no es un identificador válido."),
    ("The request body is invalid.", "El cuerpo de la solicitud no es válido."),
    (
        "The request body exceeds {0} bytes.",
        "El cuerpo de la solicitud supera los {0} bytes.",
    ),
    (
        "The query string is invalid.",
        "La cadena de consulta no es válida.",
    ),
    (
        "The requested resource was not found.",
        "No se encontró el recurso solicitado.",
    ),
    ("Unauthorized", "No autorizado"),
    (
        "Please provide the ErrorId to the support team for further analysis.",
        "Proporcione el ErrorId al equipo de soporte para un análisis más detallado.",
    ),
    (
        "Something went wrong. Please try again later.",
        "Algo salió mal. Inténtelo de nuevo más tarde.",
    ),
];

/// Localizer backed by per-culture resource tables.
#[derive(Debug, Clone)]
pub struct ResourceLocalizer {
    culture: String,
    resources: HashMap<String, HashMap<String, String>>,
}

impl ResourceLocalizer {
    /// Creates a localizer with the built-in `en` (identity) and `es` tables.
    pub fn new(culture: impl Into<String>) -> Self {
        let spanish = SPANISH
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut resources = HashMap::new();
        resources.insert("en".to_string(), HashMap::new());
        resources.insert("es".to_string(), spanish);

        Self {
            culture: culture.into(),
            resources,
        }
    }

    /// Adds or replaces the table for `culture` from a flat JSON object.
    pub fn load_json(&mut self, culture: &str, json: &str) -> Result<(), LocalizerError> {
        let table: HashMap<String, String> =
            serde_json::from_str(json).map_err(|source| LocalizerError::InvalidResources {
                culture: culture.to_string(),
                source,
            })?;
        self.resources
            .entry(culture.to_string())
            .or_default()
            .extend(table);
        Ok(())
    }

    pub fn culture(&self) -> &str {
        &self.culture
    }
}

impl Default for ResourceLocalizer {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Localizer for ResourceLocalizer {
    fn translate(&self, key: &str, args: &[&str]) -> String {
        let template = self
            .resources
            .get(&self.culture)
            .and_then(|table| table.get(key))
            .map(String::as_str)
            .unwrap_or(key);

        args.iter()
            .enumerate()
            .fold(template.to_string(), |text, (i, arg)| {
                text.replace(&format!("{{{i}}}"), arg)
            })
    }
}
