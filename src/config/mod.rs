//! Configuration module for Reelcut.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AgentSettings, GeneralSettings, HttpSettings, MediaSettings, ServerSettings, Settings,
};
