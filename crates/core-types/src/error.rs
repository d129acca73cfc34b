use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A record violates the schema. `index` is the record's position in the dataset.
    #[error("Invalid record #{index} (user '{user_id}', period '{period_id}'): {reason}")]
    DataValidation {
        index: usize,
        user_id: String,
        period_id: String,
        reason: String,
    },
}
