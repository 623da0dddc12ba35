use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::geo::GeoPoint;

/// Zone → coordinates, `None` when the zone could not be located.
pub type ZoneCoordinates = BTreeMap<String, Option<GeoPoint>>;

/// On-disk shape: `{"Assam": [26.2, 92.9], "Nowhere": [null, null]}`.
type CoordinateFile = BTreeMap<String, [Option<f64>; 2]>;

fn from_file_shape(file: CoordinateFile) -> ZoneCoordinates {
    file.into_iter()
        .map(|(zone, pair)| {
            let point = match pair {
                [Some(latitude), Some(longitude)] => Some(GeoPoint {
                    latitude,
                    longitude,
                }),
                _ => None,
            };
            (zone, point)
        })
        .collect()
}

fn to_file_shape(coords: &ZoneCoordinates) -> CoordinateFile {
    coords
        .iter()
        .map(|(zone, point)| {
            let pair = match point {
                Some(p) => [Some(p.latitude), Some(p.longitude)],
                None => [None, None],
            };
            (zone.clone(), pair)
        })
        .collect()
}

/// Loads the coordinates file. Missing or unreadable files degrade to an empty
/// map: spatial views shrink, nothing else is affected.
pub fn load_coordinates(path: &Path) -> ZoneCoordinates {
    if !path.exists() {
        warn!(path = %path.display(), "Coordinates file not found; map views will be empty");
        return ZoneCoordinates::new();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|contents| {
            serde_json::from_str::<CoordinateFile>(&contents).map_err(anyhow::Error::from)
        });

    match parsed {
        Ok(file) => {
            let coords = from_file_shape(file);
            info!(path = %path.display(), zones = coords.len(), "Loaded zone coordinates");
            coords
        }
        Err(e) => {
            warn!(path = %path.display(), "Ignoring invalid coordinates file: {e}");
            ZoneCoordinates::new()
        }
    }
}

/// Writes the coordinates file atomically (temp file in the same directory, then rename).
pub fn save_coordinates(path: &Path, coords: &ZoneCoordinates) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .context("Failed to create temporary coordinates file")?;
    let contents = serde_json::to_string_pretty(&to_file_shape(coords))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    info!(path = %path.display(), zones = coords.len(), "Saved zone coordinates");
    Ok(())
}
