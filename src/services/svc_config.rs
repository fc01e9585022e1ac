use log::info;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::config::TrainingDefaults;
use crate::errors::{AppError, AppResult};

/// Overwrite the training section of a generated `config.json`.
///
/// Only `train.epochs`, `train.batch_size`, `train.log_interval`,
/// `train.eval_interval` and `train.learning_rate` change; every other field
/// is written back untouched.
pub fn update_config(path: &Path, epochs: u32, defaults: &TrainingDefaults) -> AppResult<()> {
    let json = fs::read_to_string(path)?;
    let mut config: Value = serde_json::from_str(&json)?;

    let root = config.as_object_mut().ok_or_else(|| {
        AppError::SerializationError(format!("{} is not a JSON object", path.display()))
    })?;
    let train = root
        .entry("train")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            AppError::SerializationError(format!("'train' in {} is not an object", path.display()))
        })?;

    train.insert("epochs".into(), epochs.into());
    train.insert("batch_size".into(), defaults.batch_size.into());
    train.insert("log_interval".into(), defaults.log_interval.into());
    train.insert("eval_interval".into(), defaults.eval_interval.into());
    train.insert("learning_rate".into(), defaults.learning_rate.into());

    fs::write(path, to_indented_json(&config)?)?;
    info!("Updated training config {} (epochs = {})", path.display(), epochs);
    Ok(())
}

// Четыре пробела, как у json.dump(indent=4) в самом тулките
fn to_indented_json(value: &Value) -> AppResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
