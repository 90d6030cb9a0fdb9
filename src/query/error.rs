use thiserror::Error;

/// Statement-building failures. These indicate a mis-declared schema or filter
/// config, never bad request data.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown column '{column}' on {entity}")]
    UnknownColumn { entity: String, column: String },

    #[error("Unknown association '{alias}' on {entity}")]
    UnknownAssociation { entity: String, alias: String },

    #[error("Association '{0}' is not single-row and cannot be joined")]
    NotSingleRow(String),
}
