//! Conversions between domain models and stored document bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use chatlog_store::{Document, Fields};

use crate::error::{Result, ServiceError};

/// Serialize a model into a JSON object body.
pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(ServiceError::Internal(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(ServiceError::Internal(format!("encoding failed: {e}"))),
    }
}

/// Models that carry the store-maintained timestamps.
pub(crate) trait Timestamped: DeserializeOwned {
    fn stamp(&mut self, doc: &Document);
}

/// Decode a stored document into a model, filling in its timestamps.
pub(crate) fn from_document<T: Timestamped>(doc: &Document) -> Result<T> {
    let mut value: T = serde_json::from_value(Value::Object(doc.body.clone())).map_err(|e| {
        ServiceError::Internal(format!("corrupt document '{}': {e}", doc.key))
    })?;
    value.stamp(doc);
    Ok(value)
}

macro_rules! impl_timestamped {
    ($($model:ty),+) => {
        $(
            impl Timestamped for $model {
                fn stamp(&mut self, doc: &Document) {
                    self.created_at = Some(doc.created_at);
                    self.updated_at = Some(doc.updated_at);
                }
            }
        )+
    };
}

impl_timestamped!(chatlog_shared::Chat, chatlog_shared::Call, chatlog_shared::Profile);
