//! Common functionality for the broadband rollout model.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod adoption;
pub mod asset;
pub mod cli;
pub mod finance;
pub mod geotype;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod network;
pub mod output;
pub mod settings;
pub mod simulation;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;

/// The name of the folder, under the user's config directory, holding program configuration
const CONFIG_DIR_NAME: &str = "broadband-rollout";

/// Get the path to the directory containing the program's configuration files
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push(CONFIG_DIR_NAME);

    path
}
