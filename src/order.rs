//! Order draft and shipping address
//!
//! Exactly one draft lives in a session. The draft's medicine is a clone of
//! a catalog entry (the catalog outlives every draft); it is cleared on
//! successful finalization.

use crate::catalog::Medicine;
use serde::{Deserialize, Serialize};

/// Shipping address for the in-flight order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    pub city: String,
    pub pincode: String,
}

impl Address {
    /// The session default shipping address.
    pub fn default_for_session() -> Self {
        Self {
            full_name: "Rahul Sharma".to_string(),
            line1: "21, MG Road, Pune".to_string(),
            city: "Pune".to_string(),
            pincode: "411001".to_string(),
        }
    }

    /// Field-level validation, recomputed from current values only.
    pub fn validate(&self) -> AddressValidation {
        AddressValidation {
            full_name: self.full_name.trim().len() > 2,
            line1: self.line1.trim().len() > 5,
            city: self.city.trim().len() > 2,
            pincode: self.pincode.len() == 6 && self.pincode.bytes().all(|b| b.is_ascii_digit()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().all_valid()
    }
}

/// Per-field validity flags for the address form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValidation {
    pub full_name: bool,
    pub line1: bool,
    pub city: bool,
    pub pincode: bool,
}

impl AddressValidation {
    pub fn all_valid(&self) -> bool {
        self.full_name && self.line1 && self.city && self.pincode
    }
}

/// The single in-progress order under construction in a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub medicine: Option<Medicine>,
    pub quantity: u32,
    pub address: Option<Address>,
}

impl OrderDraft {
    /// Fresh draft seeded with the session default address.
    pub fn new() -> Self {
        Self {
            medicine: None,
            quantity: 1,
            address: Some(Address::default_for_session()),
        }
    }

    /// Put a medicine on the draft. Quantity is left as-is: both the
    /// `placeOrder` tool and direct selection only set the medicine.
    pub fn set_medicine(&mut self, medicine: Medicine) {
        self.medicine = Some(medicine);
    }

    /// Set the order quantity (minimum 1).
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    /// Whether the draft can be confirmed: a medicine and an address must
    /// both be present. The prescription flag is advisory and checked by
    /// the caller, not gated here.
    pub fn is_confirmable(&self) -> bool {
        self.medicine.is_some() && self.address.is_some()
    }

    /// Whether the selected medicine requires a prescription.
    pub fn needs_prescription(&self) -> bool {
        self.medicine
            .as_ref()
            .is_some_and(|m| m.prescription_required)
    }

    /// Finalize the order: clears the medicine selection and resets the
    /// quantity. Returns the finalized medicine, or `None` if the draft
    /// was not confirmable.
    pub fn finalize(&mut self) -> Option<Medicine> {
        if !self.is_confirmable() {
            return None;
        }
        self.quantity = 1;
        self.medicine.take()
    }
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self::new()
    }
}
