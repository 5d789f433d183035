use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "upper", alias = "above")]
    Above,
    #[serde(rename = "lower", alias = "below")]
    Below,
}

impl AlertType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "upper" | "above" => Some(AlertType::Above),
            "lower" | "below" => Some(AlertType::Below),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Above => "upper",
            AlertType::Below => "lower",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub id: ObjectId,
    pub owner_id: String,
    pub symbol: String,
    pub company: String,
    pub alert_name: String,
    pub alert_type: AlertType,
    pub threshold: f64,
    pub created_at: i64,
}

/// The mutable part of an alert, already validated and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertFields {
    pub symbol: String,
    pub company: String,
    pub alert_name: String,
    pub alert_type: AlertType,
    pub threshold: f64,
}

impl AlertRecord {
    pub fn apply(&mut self, fields: &AlertFields) {
        self.symbol = fields.symbol.clone();
        self.company = fields.company.clone();
        self.alert_name = fields.alert_name.clone();
        self.alert_type = fields.alert_type;
        self.threshold = fields.threshold;
    }

    pub fn view(&self) -> AlertView {
        AlertView {
            id: self.id.to_hex(),
            symbol: self.symbol.clone(),
            company: self.company.clone(),
            alert_name: self.alert_name.clone(),
            alert_type: self.alert_type,
            threshold: self.threshold,
        }
    }
}

/// Canonical fields returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub id: String,
    pub symbol: String,
    pub company: String,
    pub alert_name: String,
    pub alert_type: AlertType,
    pub threshold: f64,
}

/// Thresholds arrive from forms as text and from JSON clients as numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdInput {
    Number(f64),
    Text(String),
    // explicit `null`; treated like an absent threshold, not as 0
    Missing,
}

impl Default for ThresholdInput {
    fn default() -> Self {
        ThresholdInput::Missing
    }
}

impl ThresholdInput {
    pub fn to_number(&self) -> Option<f64> {
        match self {
            ThresholdInput::Number(n) => Some(*n),
            ThresholdInput::Text(s) => s.trim().parse::<f64>().ok(),
            ThresholdInput::Missing => None,
        }
    }
}

impl From<&str> for ThresholdInput {
    fn from(s: &str) -> Self {
        ThresholdInput::Text(s.to_string())
    }
}

impl From<f64> for ThresholdInput {
    fn from(n: f64) -> Self {
        ThresholdInput::Number(n)
    }
}

/// Raw alert payload as submitted by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertInput {
    pub symbol: String,
    pub company: String,
    pub alert_name: String,
    pub alert_type: String,
    pub threshold: ThresholdInput,
}
