//! Request middleware.

pub mod current_user;
pub mod error_translation;

pub use current_user::{Caller, USER_EMAIL_HEADER, USER_ID_HEADER};
pub use error_translation::{ErrorTranslation, translate_errors};
