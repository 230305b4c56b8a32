use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Expense category. Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Health,
    Housing,
    Sports,
    Education,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Health,
        Category::Housing,
        Category::Sports,
        Category::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Health => "health",
            Category::Housing => "housing",
            Category::Sports => "sports",
            Category::Education => "education",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == needle)
    }

    /// `"food, health, housing, sports, education"`
    pub fn joined() -> String {
        Self::ALL.iter().map(Category::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole amounts are written as JSON integers (`12`, not `12.0`) so clients
/// get back exactly the number they sent.
pub mod amount {
    use serde::Serializer;

    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() < MAX_EXACT {
            s.serialize_i64(*value as i64)
        } else {
            s.serialize_f64(*value)
        }
    }
}

/// A stored expense line, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub userid: i64,
    pub description: String,
    pub category: Category,
    #[serde(serialize_with = "amount::serialize")]
    pub sum: f64,
    pub created_at: DateTime<Utc>,
}

/// Validated input of an add-cost request; `created_at` is `None` when the
/// client did not supply one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCost {
    pub userid: i64,
    pub description: String,
    pub category: Category,
    pub sum: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw add-cost body. Fields stay loosely typed so each one can be rejected
/// with its own error code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddCostRequest {
    #[serde(default)]
    pub userid: serde_json::Value,
    #[serde(default)]
    pub description: serde_json::Value,
    #[serde(default)]
    pub category: serde_json::Value,
    #[serde(default)]
    pub sum: serde_json::Value,
    #[serde(default)]
    pub created_at: serde_json::Value,
}

/// Raw report query string (`?id=&year=&month=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub id: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    #[serde(serialize_with = "amount::serialize")]
    pub sum: f64,
    pub description: String,
    pub day: u32,
}

/// One `{ "<category>": [items] }` entry of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCosts {
    pub category: Category,
    pub items: Vec<ReportItem>,
}

impl Serialize for CategoryCosts {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(1))?;
        map.serialize_entry(self.category.as_str(), &self.items)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryCosts {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<ReportItem>>::deserialize(d)?;
        if raw.len() != 1 {
            return Err(D::Error::custom("category entry must have exactly one key"));
        }
        let (name, items) = raw.into_iter().next().ok_or_else(|| D::Error::custom("empty category entry"))?;
        let category = Category::parse(&name).ok_or_else(|| D::Error::custom(format!("unknown category: {name}")))?;
        Ok(Self { category, items })
    }
}

/// Categorized costs of one user for one calendar month. `costs` always
/// holds the five categories in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub userid: i64,
    pub year: i32,
    pub month: u32,
    pub costs: Vec<CategoryCosts>,
}

impl MonthlyReport {
    pub fn empty(userid: i64, year: i32, month: u32) -> Self {
        let costs = Category::ALL
            .into_iter()
            .map(|category| CategoryCosts { category, items: Vec::new() })
            .collect();
        Self { userid, year, month, costs }
    }

    pub fn items(&self, category: Category) -> &[ReportItem] {
        self.costs
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse(" FOOD "), Some(Category::Food));
        assert_eq!(Category::parse("Education"), Some(Category::Education));
        assert_eq!(Category::parse("cars"), None);
        assert_eq!(Category::joined(), "food, health, housing, sports, education");
    }

    #[test]
    fn empty_report_has_five_categories_in_order() {
        let r = MonthlyReport::empty(1, 2026, 1);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v,
            json!({
                "userid": 1, "year": 2026, "month": 1,
                "costs": [{"food": []}, {"health": []}, {"housing": []}, {"sports": []}, {"education": []}]
            })
        );
    }

    #[test]
    fn whole_amounts_serialize_as_integers() {
        let item = ReportItem { sum: 12.0, description: "choco".into(), day: 3 };
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"sum": 12, "description": "choco", "day": 3}));
        let item = ReportItem { sum: 12.5, ..item };
        assert_eq!(serde_json::to_value(&item).unwrap()["sum"], json!(12.5));
    }

    #[test]
    fn report_document_reads_back_identically() {
        let mut r = MonthlyReport::empty(9, 2025, 12);
        r.costs[0].items.push(ReportItem { sum: 8.0, description: "milk".into(), day: 1 });
        let doc = serde_json::to_value(&r).unwrap();
        let back: MonthlyReport = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(back, r);
        assert_eq!(serde_json::to_value(&back).unwrap(), doc);
    }

    #[test]
    fn category_entry_with_two_keys_is_rejected() {
        let bad = json!({"food": [], "health": []});
        assert!(serde_json::from_value::<CategoryCosts>(bad).is_err());
    }
}
