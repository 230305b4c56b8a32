use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Wire shape shared by every error response: `{ "id": <code>, "message": <text> }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub id: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(id: u16, message: impl Into<String>) -> Self {
        Self { id, message: message.into() }
    }
}
