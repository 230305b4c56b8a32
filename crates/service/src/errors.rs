use thiserror::Error;

/// Stable numeric codes carried in `{id, message}` error bodies.
pub mod codes {
    pub const INVALID_JSON: u16 = 4000;
    pub const INVALID_QUERY: u16 = 4000;
    pub const USERID_INVALID: u16 = 4001;
    pub const DESCRIPTION_REQUIRED: u16 = 4002;
    pub const YEAR_INVALID: u16 = 4002;
    pub const CATEGORY_INVALID: u16 = 4003;
    pub const MONTH_INVALID: u16 = 4003;
    pub const SUM_INVALID: u16 = 4004;
    pub const CREATED_AT_INVALID: u16 = 4005;
    pub const COST_IN_PAST: u16 = 4006;
    pub const USER_NOT_FOUND: u16 = 4007;
    pub const DUPLICATE_KEY: u16 = 4091;
    pub const INTERNAL: u16 = 5001;
    pub const USERS_CHECK_FAILED: u16 = 5007;
    pub const USERS_UNREACHABLE: u16 = 5008;
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { code: u16, message: String },
    #[error("{message}")]
    NotFound { code: u16, message: String },
    #[error("{message}")]
    Conflict { code: u16, message: String },
    #[error("{message}")]
    Upstream { code: u16, message: String },
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(code: u16, message: impl Into<String>) -> Self {
        Self::Validation { code, message: message.into() }
    }

    pub fn not_found(code: u16, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn upstream(code: u16, message: impl Into<String>) -> Self {
        Self::Upstream { code, message: message.into() }
    }

    pub fn user_not_found(userid: i64) -> Self {
        Self::not_found(codes::USER_NOT_FOUND, format!("User {userid} does not exist"))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation { code, .. }
            | ServiceError::NotFound { code, .. }
            | ServiceError::Conflict { code, .. }
            | ServiceError::Upstream { code, .. } => *code,
            ServiceError::Db(_) | ServiceError::Internal(_) => codes::INTERNAL,
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(m) => ServiceError::Internal(format!("model rejected row: {m}")),
            ModelError::Conflict(m) => ServiceError::Conflict { code: codes::DUPLICATE_KEY, message: m },
            ModelError::Db(m) => ServiceError::Db(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_failures_share_generic_code() {
        assert_eq!(ServiceError::Db("boom".into()).code(), 5001);
        assert_eq!(ServiceError::Internal("boom".into()).code(), 5001);
        assert_eq!(ServiceError::user_not_found(7).code(), 4007);
        assert_eq!(ServiceError::user_not_found(7).to_string(), "User 7 does not exist");
    }

    #[test]
    fn model_conflict_maps_to_conflict() {
        let e: ServiceError = models::errors::ModelError::Conflict("dup".into()).into();
        assert!(matches!(e, ServiceError::Conflict { code: 4091, .. }));
    }
}
