//! User profile and saved addresses
//!
//! Saved addresses are a user-ordered list: additions append, edits happen
//! in place, deletions preserve the order of the remainder.

use crate::order::Address;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub language: String,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("address failed validation")]
    InvalidAddress,
    #[error("no saved address at index {0}")]
    NoSuchAddress(usize),
}

impl UserProfile {
    /// The single mock user, seeded with the session default address.
    pub fn seed() -> Self {
        Self {
            name: "Rahul Sharma".to_string(),
            email: "rahul.sharma@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            language: "Hinglish".to_string(),
            addresses: vec![Address::default_for_session()],
        }
    }

    /// Append a validated address to the saved list.
    pub fn add_address(&mut self, address: Address) -> Result<(), ProfileError> {
        if !address.is_valid() {
            return Err(ProfileError::InvalidAddress);
        }
        self.addresses.push(address);
        Ok(())
    }

    /// Replace the saved address at `index` with a validated one.
    pub fn update_address(&mut self, index: usize, address: Address) -> Result<(), ProfileError> {
        if !address.is_valid() {
            return Err(ProfileError::InvalidAddress);
        }
        let slot = self
            .addresses
            .get_mut(index)
            .ok_or(ProfileError::NoSuchAddress(index))?;
        *slot = address;
        Ok(())
    }

    /// Delete the saved address at `index`, keeping the rest in order.
    pub fn delete_address(&mut self, index: usize) -> Result<(), ProfileError> {
        if index >= self.addresses.len() {
            return Err(ProfileError::NoSuchAddress(index));
        }
        self.addresses.remove(index);
        Ok(())
    }
}
