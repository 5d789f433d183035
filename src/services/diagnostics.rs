use tokio::sync::broadcast;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageFault {
    pub operation: &'static str,
    pub message: String,
}

/// Side channel for failures that the store swallows. Everything is logged;
/// subscribers additionally receive storage faults.
#[derive(Clone, Default)]
pub struct Diagnostics {
    faults_tx: Option<broadcast::Sender<StorageFault>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { faults_tx: Some(tx) }
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<StorageFault>> {
        self.faults_tx.as_ref().map(|tx| tx.subscribe())
    }

    pub fn report(&self, operation: &'static str, err: &StoreError) {
        match err {
            StoreError::StorageUnavailable(msg) => {
                tracing::error!(operation, error = %msg, "storage unavailable");

                if let Some(tx) = &self.faults_tx {
                    // no subscribers is fine
                    let _ = tx.send(StorageFault {
                        operation,
                        message: msg.clone(),
                    });
                }
            }
            other => tracing::debug!(operation, error = %other, "store operation rejected"),
        }
    }
}
