use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Every failure surfaced by the feature store. Nothing is retried here;
/// retries belong to whoever scheduled the operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Primary-key or uniqueness violation (duplicate run id, duplicate pair).
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Strict screening found offending raw rows; nothing was written.
    #[error(
        "data quality check failed: {rejected} of {total} interaction rows rejected \
         ({missing_rating} missing rating, {invalid_rating} rating out of range)"
    )]
    DataQuality {
        total: u64,
        rejected: u64,
        missing_rating: u64,
        invalid_rating: u64,
    },

    /// The backing store could not be reached.
    #[error("cannot reach backing store: {0}")]
    Connectivity(#[source] DbErr),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("feature '{0}' is not registered")]
    UnknownFeature(String),

    #[error("database error: {0}")]
    Db(#[source] DbErr),
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(msg)) = e.sql_err() {
            return StoreError::Integrity(msg);
        }
        match e {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Connectivity(e),
            other => {
                // Some drivers only report the constraint in the message text.
                let msg = other.to_string();
                if msg.contains("UNIQUE") || msg.contains("unique") {
                    StoreError::Integrity(msg)
                } else {
                    StoreError::Db(other)
                }
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_errors_are_connectivity() {
        let err = StoreError::from(DbErr::Conn(RuntimeErr::Internal("refused".into())));
        assert!(matches!(err, StoreError::Connectivity(_)), "got {err:?}");
    }

    #[test]
    fn test_unique_message_is_integrity() {
        let err = StoreError::from(DbErr::Custom(
            "UNIQUE constraint failed: model_metadata.run_id".into(),
        ));
        assert!(matches!(err, StoreError::Integrity(_)), "got {err:?}");
    }

    #[test]
    fn test_other_errors_stay_db() {
        let err = StoreError::from(DbErr::RecordNotFound("x".into()));
        assert!(matches!(err, StoreError::Db(_)));
    }

    #[test]
    fn test_data_quality_message_lists_counts() {
        let err = StoreError::DataQuality {
            total: 10,
            rejected: 3,
            missing_rating: 1,
            invalid_rating: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 of 10"), "{msg}");
        assert!(msg.contains("1 missing rating"), "{msg}");
    }
}
