//! `Route{slot}.json` documents.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cwa_core::{Coordinate, RouteSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// On-disk form of a route polyline.
///
/// `x` holds latitudes and `y` longitudes, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFile {
    pub route_id: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum RouteFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed route file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("route {route_id} has {lat_count} latitudes but {lon_count} longitudes")]
    LengthMismatch {
        route_id: String,
        lat_count: usize,
        lon_count: usize,
    },
}

impl RouteFile {
    pub fn from_waypoints(route_id: impl Into<String>, waypoints: &[Coordinate]) -> Self {
        Self {
            route_id: route_id.into(),
            x: waypoints.iter().map(|c| c.lat).collect(),
            y: waypoints.iter().map(|c| c.lon).collect(),
            recorded_at: None,
        }
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    pub fn waypoints(&self) -> Result<Vec<Coordinate>, RouteFileError> {
        if self.x.len() != self.y.len() {
            return Err(RouteFileError::LengthMismatch {
                route_id: self.route_id.clone(),
                lat_count: self.x.len(),
                lon_count: self.y.len(),
            });
        }
        Ok(self
            .x
            .iter()
            .zip(&self.y)
            .map(|(&lat, &lon)| Coordinate::new(lat, lon))
            .collect())
    }
}

pub fn route_file_name(slot: usize) -> String {
    format!("Route{slot}.json")
}

/// Directory of route files, one per slot.
#[derive(Debug, Clone)]
pub struct JsonRouteDirectory {
    dir: PathBuf,
}

impl JsonRouteDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, slot: usize) -> PathBuf {
        self.dir.join(route_file_name(slot))
    }

    pub fn read_file(&self, slot: usize) -> Result<RouteFile, RouteFileError> {
        let path = self.path_for(slot);
        let raw = fs::read_to_string(&path).map_err(|source| RouteFileError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RouteFileError::Parse { path, source })
    }
}

impl RouteSource for JsonRouteDirectory {
    type Error = RouteFileError;

    fn read_route(&self, slot: usize) -> Result<Vec<Coordinate>, RouteFileError> {
        let file = self.read_file(slot)?;
        if file.route_id != slot.to_string() {
            tracing::debug!(
                slot,
                route_id = %file.route_id,
                "route file id differs from its slot; slot wins"
            );
        }
        file.waypoints()
    }
}

/// Write `file` as `Route{slot}.json` under `dir`, creating the directory.
pub fn write_route_file(dir: &Path, slot: usize, file: &RouteFile) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create route directory {}", dir.display()))?;
    let path = dir.join(route_file_name(slot));
    let json = serde_json::to_string_pretty(file).context("failed to encode route file")?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(slot, waypoints = file.x.len(), path = %path.display(), "route file written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_holds_latitudes() {
        let file = RouteFile::from_waypoints("2", &[Coordinate::new(52.5, 13.2)]);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["routeId"], "2");
        assert_eq!(json["x"][0], 52.5);
        assert_eq!(json["y"][0], 13.2);
        assert!(json.get("recordedAt").is_none());
    }

    #[test]
    fn mismatched_axes_are_rejected() {
        let file: RouteFile =
            serde_json::from_str(r#"{"routeId": "0", "x": [1.0, 2.0], "y": [1.0]}"#).unwrap();
        assert!(matches!(
            file.waypoints(),
            Err(RouteFileError::LengthMismatch { lat_count: 2, lon_count: 1, .. })
        ));
    }

    #[test]
    fn file_names_follow_slot() {
        assert_eq!(route_file_name(0), "Route0.json");
        assert_eq!(
            JsonRouteDirectory::new("/tmp/r").path_for(13),
            PathBuf::from("/tmp/r/Route13.json")
        );
    }
}
