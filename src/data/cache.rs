use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use super::loader::{parse_climate_csv, parse_vegetation_geojson};
use super::model::{ClimateDataset, VegetationFeature};
use crate::error::{Error, Result};
use crate::source::{FsSource, SourceReader};

/// Fixed locations of the two raw datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub climate: PathBuf,
    pub vegetation: PathBuf,
}

// ---------------------------------------------------------------------------
// DatasetCache – load-once access to the raw datasets
// ---------------------------------------------------------------------------

/// Process-lifetime cache of the climate series and the vegetation layer.
///
/// Each dataset is read and parsed on first request, then served from memory.
/// Concurrent first callers wait on a single load. A failed load leaves the
/// slot empty, so the next request retries from the source. Nothing is ever
/// re-read once loaded, even if the file changes on disk.
pub struct DatasetCache<R = FsSource> {
    reader: R,
    paths: DataPaths,
    climate: OnceCell<ClimateDataset>,
    vegetation: OnceCell<Vec<VegetationFeature>>,
}

impl DatasetCache<FsSource> {
    pub fn new(paths: DataPaths) -> Self {
        Self::with_reader(FsSource, paths)
    }
}

impl<R: SourceReader> DatasetCache<R> {
    pub fn with_reader(reader: R, paths: DataPaths) -> Self {
        DatasetCache {
            reader,
            paths,
            climate: OnceCell::new(),
            vegetation: OnceCell::new(),
        }
    }

    /// The cleaned climate series.
    pub fn get_climate_dataset(&self) -> Result<&ClimateDataset> {
        if let Some(ds) = self.climate.get() {
            log::debug!("climate dataset served from cache");
            return Ok(ds);
        }
        self.climate.get_or_try_init(|| {
            let path = &self.paths.climate;
            let bytes = self.read(path)?;
            let ds = parse_climate_csv(&bytes, path)?;
            log::info!("loaded {} climate records from {}", ds.len(), path.display());
            Ok::<_, Error>(ds)
        })
    }

    /// The vegetation polygons.
    pub fn get_vegetation_dataset(&self) -> Result<&[VegetationFeature]> {
        if let Some(features) = self.vegetation.get() {
            log::debug!("vegetation dataset served from cache");
            return Ok(features);
        }
        self.vegetation
            .get_or_try_init(|| {
                let path = &self.paths.vegetation;
                let bytes = self.read(path)?;
                let features = parse_vegetation_geojson(&bytes, path)?;
                log::info!(
                    "loaded {} vegetation features from {}",
                    features.len(),
                    path.display()
                );
                Ok::<_, Error>(features)
            })
            .map(Vec::as_slice)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.reader
            .read(path)
            .map_err(|source| Error::DataSourceUnavailable {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::MemorySource;

    const CLIMATE: &str = "fecha;tmed;tmax;tmin;prec;velmedia;racha;dir\n\
                           2018-01-01;11,8;16,7;6,9;0,2;1,4;5,0;27\n";
    const VEGETATION: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    fn paths() -> DataPaths {
        DataPaths {
            climate: "raw/climate.csv".into(),
            vegetation: "raw/vegetation.geojson".into(),
        }
    }

    #[test]
    fn test_each_dataset_read_once() {
        let source = MemorySource::new()
            .with_file("raw/climate.csv", CLIMATE)
            .with_file("raw/vegetation.geojson", VEGETATION);
        let cache = DatasetCache::with_reader(source, paths());

        for _ in 0..3 {
            assert_eq!(cache.get_climate_dataset().unwrap().len(), 1);
        }
        assert_eq!(cache.reader.reads(), 1);

        for _ in 0..3 {
            assert!(cache.get_vegetation_dataset().unwrap().is_empty());
        }
        assert_eq!(cache.reader.reads(), 2);
    }

    #[test]
    fn test_concurrent_first_access_reads_once() {
        let source = MemorySource::new()
            .with_file("raw/climate.csv", CLIMATE)
            .with_file("raw/vegetation.geojson", VEGETATION);
        let cache = DatasetCache::with_reader(source, paths());

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get_climate_dataset()))
                .collect();
            let loaded: Vec<_> = handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect();
            assert!(loaded.iter().all(|ds| std::ptr::eq(*ds, loaded[0])));
        });
        assert_eq!(cache.reader.reads(), 1);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert!(cache.get_vegetation_dataset().unwrap().is_empty()));
            }
        });
        assert_eq!(cache.reader.reads(), 2);
    }

    #[test]
    fn test_missing_source_then_restored() {
        let cache = DatasetCache::with_reader(MemorySource::new(), paths());

        let err = cache.get_climate_dataset().unwrap_err();
        assert!(matches!(err, Error::DataSourceUnavailable { .. }));
        assert!(cache.climate.get().is_none());

        cache.reader.insert("raw/climate.csv", CLIMATE);
        assert_eq!(cache.get_climate_dataset().unwrap().len(), 1);
        assert_eq!(cache.get_climate_dataset().unwrap().len(), 1);
        assert_eq!(cache.reader.reads(), 2);
    }

    #[test]
    fn test_datasets_fail_independently() {
        let source = MemorySource::new().with_file("raw/climate.csv", CLIMATE);
        let cache = DatasetCache::with_reader(source, paths());

        assert!(cache.get_vegetation_dataset().is_err());
        assert!(cache.get_climate_dataset().is_ok());
    }

    #[test]
    fn test_filesystem_source() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths {
            climate: dir.path().join("climate.csv"),
            vegetation: dir.path().join("vegetation.geojson"),
        };
        let cache = DatasetCache::new(paths.clone());
        assert!(matches!(
            cache.get_climate_dataset(),
            Err(Error::DataSourceUnavailable { .. })
        ));

        std::fs::write(&paths.climate, CLIMATE).unwrap();
        let ds = cache.get_climate_dataset().unwrap();
        assert_eq!(ds.records()[0].wind_direction, Some(27.0));

        // Later edits are not observed.
        std::fs::write(&paths.climate, "garbage").unwrap();
        assert_eq!(cache.get_climate_dataset().unwrap().len(), 1);
    }
}
