//! Common routines for handling input data.
use crate::model::{Model, ModelParameters};
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;
use serde::Deserializer;
use serde::de::{Deserialize, DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub mod adoption;
use adoption::read_adoption_targets;
pub mod asset;
use asset::read_assets;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

fn read_csv_internal<'a, T: DeserializeOwned + 'a>(file_path: &'a Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Format an error message to include the file path.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a boolean flag from a CSV field.
///
/// Accepts `0`/`1` as well as `true`/`false` (case insensitive). Empty fields are read as `false`.
pub fn deserialise_flag<'de, D>(deserialiser: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserialiser)?;
    match value.trim().to_lowercase().as_str() {
        "" | "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "Invalid value for flag: {other}"
        ))),
    }
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The loaded and validated model, or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let assets = read_assets(model_dir, &parameters.technologies)?;
    info!(
        "Read {} assets (granularity: {})",
        assets.len(),
        parameters.asset_granularity.name()
    );

    let years = parameters.iter_years().collect_vec();
    let adoption_targets: HashMap<_, _> = parameters
        .scenarios
        .iter()
        .map(|scenario| -> Result<_> {
            let targets = read_adoption_targets(model_dir, scenario, &years)?;
            Ok((scenario.clone(), targets))
        })
        .collect::<Result<_>>()?;

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        assets,
        adoption_targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
        #[serde(deserialize_with = "deserialise_flag")]
        flag: bool,
    }

    fn create_csv_file(dir_path: &Path, contents: &str) -> std::path::PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value,flag\nhello,1,1\n world ,2,false");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                    flag: true,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                    flag: false,
                }
            ]
        );

        // Empty CSV file
        let file_path = create_csv_file(dir.path(), "id,value,flag");
        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_csv_bad_flag() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value,flag\nhello,1,yes");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert_error!(
            read_csv_internal::<Record>(&file_path),
            format!("Error reading {}", file_path.display())
        );
    }

    #[test]
    fn test_read_toml() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Config {
            value: u32,
        }

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        fs::write(&file_path, "value = 1").unwrap();
        assert_eq!(read_toml::<Config>(&file_path).unwrap(), Config { value: 1 });

        fs::write(&file_path, "value = \"x\"").unwrap();
        assert!(read_toml::<Config>(&file_path).is_err());
    }
}
