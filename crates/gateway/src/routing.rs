//! Pure routing decisions: which backend owns a path, and where a
//! `POST /api/add` body should go.

use serde_json::Value;

pub const ADD_PATH: &str = "/api/add";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Users,
    Costs,
    Logs,
    Admin,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Users => "users",
            Target::Costs => "costs",
            Target::Logs => "logs",
            Target::Admin => "admin",
        }
    }
}

/// Static prefix table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(&'static str, Target)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: vec![
                ("/api/users", Target::Users),
                ("/api/report", Target::Costs),
                ("/api/logs", Target::Logs),
                ("/api/about", Target::Admin),
            ],
        }
    }
}

impl RouteTable {
    /// A prefix matches the path itself or any path below it
    /// (`/api/users/7` but not `/api/usersX`).
    pub fn resolve(&self, path: &str) -> Option<Target> {
        self.routes.iter().find_map(|(prefix, target)| {
            let rest = path.strip_prefix(prefix)?;
            (rest.is_empty() || rest.starts_with('/')).then_some(*target)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPayload {
    UserAdd,
    CostAdd,
    Invalid,
}

impl AddPayload {
    pub fn target(&self) -> Option<Target> {
        match self {
            AddPayload::UserAdd => Some(Target::Users),
            AddPayload::CostAdd => Some(Target::Costs),
            AddPayload::Invalid => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddPayload::UserAdd => "user",
            AddPayload::CostAdd => "cost",
            AddPayload::Invalid => "invalid",
        }
    }
}

const USER_FIELDS: [&str; 4] = ["id", "first_name", "last_name", "birthday"];
const COST_FIELDS: [&str; 4] = ["userid", "description", "category", "sum"];

/// Decide from the body's shape alone. Only key presence counts, whatever
/// the value (`null` included); a body carrying both shapes is a user.
pub fn classify_add_payload(body: &Value) -> AddPayload {
    let Some(obj) = body.as_object() else {
        return AddPayload::Invalid;
    };
    let has_all = |fields: &[&str]| fields.iter().all(|f| obj.contains_key(*f));
    if has_all(&USER_FIELDS) {
        AddPayload::UserAdd
    } else if has_all(&COST_FIELDS) {
        AddPayload::CostAdd
    } else {
        AddPayload::Invalid
    }
}
