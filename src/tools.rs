//! Tool dispatcher
//!
//! Maps the four operations the model may request onto session state.
//! Inputs arrive already strictly decoded (`ToolRequest`); invalid requests
//! produce an error payload for the model and never touch state. Results
//! are JSON payloads the model narrates — a lookup miss is data, not an
//! error.

use crate::llm::ToolDefinition;
use crate::session::{Session, SessionEvent};
use crate::state_machine::{ToolInput, ToolRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result payload from tool execution, sent back to the model keyed by
/// the call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub payload: Value,
}

impl ToolOutput {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The explicit not-found marker for catalog lookup misses.
    pub fn not_found() -> Self {
        Self::new(json!({ "error": "Medicine not found in local database." }))
    }

    pub fn invalid_arguments(name: &str, error: &str) -> Self {
        Self::new(json!({ "error": format!("invalid arguments for {name}: {error}") }))
    }
}

/// Execute one decoded tool request against the session. Dispatch is
/// awaited by the caller; the turn machine guarantees serial order.
pub async fn dispatch(request: &ToolRequest, session: &Session) -> ToolOutput {
    let call = match request {
        ToolRequest::Valid(call) => call,
        ToolRequest::Invalid { name, error, .. } => {
            tracing::warn!(tool = %name, error = %error, "rejected tool arguments");
            return ToolOutput::invalid_arguments(name, error);
        }
    };

    tracing::debug!(tool = %call.name(), id = %call.id, "dispatching tool");

    match &call.input {
        ToolInput::GetUserHistory => {
            ToolOutput::new(serde_json::to_value(session.catalog().history()).unwrap_or(Value::Null))
        }

        ToolInput::CheckInventory(input) => {
            match session.catalog().find_by_name(&input.medicine_name) {
                Some(medicine) => {
                    ToolOutput::new(serde_json::to_value(medicine).unwrap_or(Value::Null))
                }
                None => ToolOutput::not_found(),
            }
        }

        ToolInput::PlaceOrder(input) => {
            let Some(medicine) = session.catalog().find_by_name(&input.medicine_name).cloned()
            else {
                // The draft is left untouched on a miss, on every path.
                return ToolOutput::not_found();
            };
            let draft = session
                .with_state(|s| {
                    s.draft.set_medicine(medicine);
                    s.draft.clone()
                })
                .await;
            session.broadcast(SessionEvent::DraftUpdated { draft });
            ToolOutput::new(json!({
                "status": "success",
                "message": "Confirmed. Order sent to pharmacist.",
                "details": call.input.to_value(),
            }))
        }

        ToolInput::NavigateTo(input) => {
            session.navigate(input.screen_name).await;
            ToolOutput::new(json!({
                "status": "success",
                "message": format!("Interface updated to {}", input.screen_name),
            }))
        }
    }
}

/// The four tool schemas exposed to the model.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "getUserHistory".to_string(),
            description: "Get the previous medicine orders of the current user.".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDefinition {
            name: "checkInventory".to_string(),
            description: "Check stock levels and price of a specific medicine.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "medicineName": { "type": "string", "description": "Name of the medicine" }
                },
                "required": ["medicineName"]
            }),
        },
        ToolDefinition {
            name: "placeOrder".to_string(),
            description: "Submit an order for a medicine and update inventory.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "medicineName": { "type": "string" },
                    "quantity": { "type": "number" }
                },
                "required": ["medicineName", "quantity"]
            }),
        },
        ToolDefinition {
            name: "navigateTo".to_string(),
            description: "Navigate the user to a specific screen in the app.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "screenName": {
                        "type": "string",
                        "description": "The name of the screen. Options: 'home', 'chat', 'library', 'orders', 'profile', 'address', 'success'."
                    }
                },
                "required": ["screenName"]
            }),
        },
    ]
}
