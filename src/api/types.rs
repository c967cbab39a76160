//! API request and response types

use crate::catalog::{Category, Medicine, RefillAlert};
use crate::order::AddressValidation;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for chat submission
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub queued: bool,
}

/// Direct medicine selection from the presentation layer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectMedicineRequest {
    pub medicine_id: String,
    pub quantity: Option<u32>,
}

/// Explicit user navigation. The name is parsed against the closed screen
/// set; unknown names are rejected.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub screen: String,
}

/// Library listing filters
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<Category>,
}

/// Home screen payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub refill_alerts: Vec<RefillAlert>,
    pub categories: Vec<Category>,
    pub featured: Vec<Medicine>,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Address rejection with per-field validity for the form
#[derive(Debug, Serialize)]
pub struct AddressRejectedResponse {
    pub error: String,
    pub fields: AddressValidation,
}
