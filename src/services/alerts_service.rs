use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    error::{ActionResult, StoreError},
    models::{AlertFields, AlertInput, AlertRecord, AlertType, AlertView, Session},
};

use super::{backend::AlertBackend, diagnostics::Diagnostics, watchlist_service::normalize_symbol, Clock};

/// Checks and normalizes an alert payload. Nothing is persisted when this
/// fails.
pub fn validate(input: &AlertInput) -> Result<AlertFields, StoreError> {
    let symbol = normalize_symbol(&input.symbol);
    let company = input.company.trim();
    let alert_name = input.alert_name.trim();

    if symbol.is_empty() {
        return Err(StoreError::InvalidInput("symbol"));
    }
    if company.is_empty() {
        return Err(StoreError::InvalidInput("company"));
    }
    if alert_name.is_empty() {
        return Err(StoreError::InvalidInput("alertName"));
    }

    let alert_type = AlertType::parse(&input.alert_type).ok_or(StoreError::InvalidInput("alertType"))?;

    let threshold = input
        .threshold
        .to_number()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or(StoreError::InvalidInput("threshold"))?;

    Ok(AlertFields {
        symbol,
        company: company.to_string(),
        alert_name: alert_name.to_string(),
        alert_type,
        threshold,
    })
}

#[derive(Clone)]
pub struct AlertStore {
    backend: Arc<dyn AlertBackend>,
    diagnostics: Diagnostics,
    clock: Clock,
}

impl AlertStore {
    pub fn new(backend: Arc<dyn AlertBackend>, diagnostics: Diagnostics, clock: Clock) -> Self {
        Self {
            backend,
            diagnostics,
            clock,
        }
    }

    fn fail<T>(&self, op: &'static str, err: StoreError, storage_msg: &str) -> ActionResult<T> {
        self.diagnostics.report(op, &err);

        let msg = match &err {
            StoreError::NotAuthenticated => "Not authenticated",
            StoreError::InvalidInput("id") => "Missing alert id",
            StoreError::InvalidInput(_) => "Invalid alert data",
            StoreError::NotFound => "Alert not found",
            StoreError::StorageUnavailable(_) => storage_msg,
        };
        ActionResult::failure(err.kind(), msg)
    }

    async fn try_create(&self, session: &Session, input: &AlertInput) -> Result<AlertView, StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;
        let fields = validate(input)?;

        let record = AlertRecord {
            id: ObjectId::new(),
            owner_id: owner_id.to_string(),
            symbol: fields.symbol,
            company: fields.company,
            alert_name: fields.alert_name,
            alert_type: fields.alert_type,
            threshold: fields.threshold,
            created_at: (self.clock)(),
        };

        self.backend.insert(&record).await?;
        tracing::debug!(alert_id = %record.id, symbol = %record.symbol, "alert created");

        Ok(record.view())
    }

    pub async fn create(&self, session: &Session, input: &AlertInput) -> ActionResult<AlertView> {
        match self.try_create(session, input).await {
            Ok(view) => ActionResult::ok(view),
            Err(e) => self.fail("alerts.create", e, "Failed to create alert"),
        }
    }

    async fn try_update(
        &self,
        id: &str,
        session: &Session,
        input: &AlertInput,
    ) -> Result<AlertView, StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;

        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("alertId"));
        }
        let fields = validate(input)?;

        // an id that is not an ObjectId cannot match any alert
        let oid = ObjectId::parse_str(id).map_err(|_| StoreError::NotFound)?;

        self.backend
            .find_and_replace(&oid, owner_id, &fields)
            .await?
            .map(|rec| rec.view())
            .ok_or(StoreError::NotFound)
    }

    /// Replaces the alert's fields. Only alerts owned by the caller match;
    /// anything else is "not found".
    pub async fn update(&self, id: &str, session: &Session, input: &AlertInput) -> ActionResult<AlertView> {
        match self.try_update(id, session, input).await {
            Ok(view) => ActionResult::ok(view),
            Err(e) => self.fail("alerts.update", e, "Failed to update alert"),
        }
    }

    async fn try_delete(&self, id: &str, session: &Session) -> Result<(), StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;

        let id = id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("id"));
        }

        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(());
        };

        self.backend.delete(&oid, owner_id).await
    }

    /// Deleting an alert that does not exist (or belongs to someone else)
    /// succeeds without touching anything.
    pub async fn delete(&self, id: &str, session: &Session) -> ActionResult<()> {
        match self.try_delete(id, session).await {
            Ok(()) => ActionResult::done(),
            Err(e) => self.fail("alerts.delete", e, "Failed to delete alert"),
        }
    }

    async fn try_list(&self, session: &Session) -> Result<Vec<AlertView>, StoreError> {
        let owner_id = session.owner_id().ok_or(StoreError::NotAuthenticated)?;
        let records = self.backend.find_for_owner(owner_id).await?;
        Ok(records.iter().map(AlertRecord::view).collect())
    }

    pub async fn list_for_owner(&self, session: &Session) -> Vec<AlertView> {
        self.try_list(session).await.unwrap_or_else(|e| {
            self.diagnostics.report("alerts.list", &e);
            vec![]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThresholdInput;

    fn input(threshold: &str) -> AlertInput {
        AlertInput {
            symbol: " tsla ".into(),
            company: " Tesla Inc ".into(),
            alert_name: " Breakout ".into(),
            alert_type: "upper".into(),
            threshold: ThresholdInput::from(threshold),
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let f = validate(&input("250.5")).unwrap();
        assert_eq!(f.symbol, "TSLA");
        assert_eq!(f.company, "Tesla Inc");
        assert_eq!(f.alert_name, "Breakout");
        assert_eq!(f.alert_type, AlertType::Above);
        assert_eq!(f.threshold, 250.5);
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        for bad in ["abc", "", "   ", "NaN", "inf", "-1"] {
            let err = validate(&input(bad)).unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput("threshold")), "{bad}");
        }
        assert!(validate(&input("0")).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_alert_type() {
        let mut i = input("10");
        i.alert_type = "sideways".into();
        assert!(matches!(validate(&i), Err(StoreError::InvalidInput("alertType"))));
    }

    #[test]
    fn validate_requires_text_fields() {
        let mut i = input("10");
        i.alert_name = "  ".into();
        assert!(matches!(validate(&i), Err(StoreError::InvalidInput("alertName"))));

        let mut i = input("10");
        i.company = String::new();
        assert!(matches!(validate(&i), Err(StoreError::InvalidInput("company"))));
    }
}
