use crate::terrain::TerrainKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),
    #[error("No definition for terrain {0:?}")]
    MissingTerrain(TerrainKind),
    #[error("Duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
    #[error("Unit type '{unit}' requires unknown building '{building}'")]
    UnknownRequiredBuilding { unit: String, building: String },
    #[error("Invalid data: {0}")]
    Invalid(String),
}
