//! GeoJSON input loading.
//!
//! Reads a FeatureCollection and turns each feature into a named feature:
//! the name comes from a configurable string property (`tzid` for the
//! timezone-boundary dataset), the geometry from the standard GeoJSON →
//! geo-types conversion. Sorting and id assignment happen later, in the
//! library.

use crate::error::CliError;
use geojson::GeoJson;
use lltz_index::NamedFeature;
use std::path::Path;

/// Load named features from a GeoJSON FeatureCollection file.
pub fn load_features(path: &Path, name_property: &str) -> Result<Vec<NamedFeature>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(CliError::NotFeatureCollection);
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(name_property))
            .and_then(|value| value.as_str())
            .ok_or_else(|| CliError::MissingName {
                index,
                property: name_property.to_string(),
            })?
            .to_string();

        let geometry = feature
            .geometry
            .ok_or(CliError::MissingGeometry { index })?;
        let geometry = geo_types::Geometry::<f64>::try_from(geometry.value)?;

        features.push(NamedFeature::new(name, geometry));
    }

    tracing::info!(features = features.len(), path = %path.display(), "input loaded");
    Ok(features)
}
