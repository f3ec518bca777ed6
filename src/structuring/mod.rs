pub mod validate;

pub use validate::{validate_reading, ValidateError};
