//! JSON shapes exchanged over HTTP.
//!
//! Every response is wrapped in [`Envelope`]: `{status, message, data, error?}`.

use serde::{Deserialize, Serialize};

use crate::{ItemId, StateVersion};

pub const ITEMS_PATH: &str = "/api/items";
pub const ORDER_PATH: &str = "/api/items/order";
pub const SELECTED_PATH: &str = "/api/items/selected";
pub const STATE_PATH: &str = "/api/items/state";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: 200,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(status: u16, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /api/items/order`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOrderRequest {
    pub order: Vec<ItemId>,
    /// The order version the writer last observed. Omit for last-writer-wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<StateVersion>,
}

/// Body of `POST /api/items/selected`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSelectedRequest {
    pub selected: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<StateVersion>,
}

/// Payload returned by overlay writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub version: StateVersion,
}
