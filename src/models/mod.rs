pub mod assignment;
pub mod freight;
pub mod profile;

use validator::ValidationError;

pub(crate) fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}
