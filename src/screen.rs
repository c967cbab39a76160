//! The closed set of app screens
//!
//! Exactly one screen is active at a time. Screen names arriving from the
//! model (via `navigateTo`) are parsed strictly; unknown names never reach
//! the navigation state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// All screens the presentation layer can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Home,
    Chat,
    Library,
    Orders,
    Address,
    Success,
    Profile,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Chat => "chat",
            Screen::Library => "library",
            Screen::Orders => "orders",
            Screen::Address => "address",
            Screen::Success => "success",
            Screen::Profile => "profile",
        }
    }

    /// Strict parse against the closed set. Out-of-domain names are an
    /// error, not a passthrough.
    pub fn parse(name: &str) -> Result<Self, UnknownScreen> {
        match name.trim().to_lowercase().as_str() {
            "home" => Ok(Screen::Home),
            "chat" => Ok(Screen::Chat),
            "library" => Ok(Screen::Library),
            "orders" => Ok(Screen::Orders),
            "address" => Ok(Screen::Address),
            "success" => Ok(Screen::Success),
            "profile" => Ok(Screen::Profile),
            _ => Err(UnknownScreen(name.to_string())),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A screen name outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown screen name: {0:?}")]
pub struct UnknownScreen(pub String);
