use anyhow::{Context, Result};
use atlas_core::map::MapSources;
use geojson::{FeatureCollection, GeoJson};
use std::path::Path;

/// Every non-empty source in one collection, tagged with its source id
pub fn merge_sources(sources: &MapSources) -> FeatureCollection {
    use atlas_core::map::SourceId;

    let features = [
        SourceId::SearchRadius,
        SourceId::NearbyRoutes,
        SourceId::SelectedRoute,
        SourceId::Stops,
    ]
    .into_iter()
    .flat_map(|source| {
        sources.get(source).features.iter().cloned().map(move |mut feature| {
            feature.set_property("source", source.as_str());
            feature
        })
    })
    .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write a feature collection to a GeoJSON file
pub fn write_geojson(collection: FeatureCollection, output_path: &Path) -> Result<()> {
    log::info!(
        "Writing {} features to {}",
        collection.features.len(),
        output_path.display()
    );

    let geojson = GeoJson::from(collection);
    let json_string = serde_json::to_string_pretty(&geojson).context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}

pub fn read_geojson(input_path: &Path) -> Result<GeoJson> {
    let text = std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    text.parse::<GeoJson>()
        .with_context(|| format!("{} is not valid GeoJSON", input_path.display()))
}
