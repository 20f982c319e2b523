//! Save/Load of the persisted nest.
//!
//! Binary saves use bincode; JSON export is for inspection and hand-edited
//! fixtures. Both wrap the [`NestData`] in a versioned envelope.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::data::NestData;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    /// Simulation time in seconds
    sim_time: f64,
    nest: NestData,
}

/// Result of loading a save
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedNest {
    pub sim_time: f64,
    pub nest: NestData,
}

/// Errors that can occur during save/load
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub fn save_nest<W: Write>(writer: W, nest: &NestData, sim_time: f64) -> Result<(), SaveError> {
    let file = SaveFile {
        version: SAVE_VERSION,
        sim_time,
        nest: nest.clone(),
    };
    bincode::serialize_into(writer, &file)?;
    Ok(())
}

pub fn load_nest<R: Read>(reader: R) -> Result<LoadedNest, SaveError> {
    let file: SaveFile = bincode::deserialize_from(reader)?;
    check_version(file)
}

pub fn export_json(nest: &NestData, sim_time: f64) -> Result<String, SaveError> {
    let file = SaveFile {
        version: SAVE_VERSION,
        sim_time,
        nest: nest.clone(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn import_json(json: &str) -> Result<LoadedNest, SaveError> {
    let file: SaveFile = serde_json::from_str(json)?;
    check_version(file)
}

fn check_version(file: SaveFile) -> Result<LoadedNest, SaveError> {
    if file.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: file.version,
        });
    }
    Ok(LoadedNest {
        sim_time: file.sim_time,
        nest: file.nest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AgentData, AgentRecord, ElementData, ElementRecord, ErgateData};
    use antnest_logic::Vec3;

    fn sample() -> NestData {
        let mut nest = NestData::default();
        nest.ants.push(AgentRecord::new(
            AgentData::Ergate(ErgateData {
                holding_food: true,
                capacity: 3,
            }),
            Vec3::planar(1.0, 2.0),
        ));
        nest.structure
            .elements
            .push(ElementRecord::new(ElementData::room(Vec3::ZERO, true)));
        nest
    }

    #[test]
    fn test_save_load_roundtrip() {
        let nest = sample();
        let mut buffer = Vec::new();
        save_nest(&mut buffer, &nest, 12.5).expect("Save failed");
        let loaded = load_nest(&buffer[..]).expect("Load failed");
        assert_eq!(loaded.nest, nest);
        assert!((loaded.sim_time - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_version_mismatch() {
        let json = export_json(&sample(), 0.0).unwrap();
        let tampered = json.replacen("\"version\": 1", "\"version\": 99", 1);
        match import_json(&tampered) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_save_is_error() {
        let mut buffer = Vec::new();
        save_nest(&mut buffer, &sample(), 0.0).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(load_nest(&buffer[..]).is_err());
    }
}
