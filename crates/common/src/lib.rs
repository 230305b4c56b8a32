pub mod audit;
pub mod env;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn error_body_serializes_id_and_message() {
        let body = types::ErrorBody::new(4003, "month is invalid");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"id": 4003, "message": "month is invalid"}));
    }
}
