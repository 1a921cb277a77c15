use crate::elements::{LonLat, MAX_ZOOM};
use crate::utils::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ViewerConfig {
    pub zoom_level: u32,
    pub view_distance: i32,
    pub prefetch_distance: i32,

    pub cache_dir: String,
    pub endpoint_url: String,
    pub request_timeout_secs: u64,

    /// Meters to scene units.
    pub world_scale: f64,

    pub num_workers: usize,
    pub download_workers: usize,
    pub lock_backoff_millis: u64,
    pub idle_sleep_millis: u64,

    pub start_lon: f64,
    pub start_lat: f64,
}

impl Default for ViewerConfig {
    fn default() -> ViewerConfig {
        ViewerConfig {
            zoom_level: 16,
            view_distance: 1,
            prefetch_distance: 1,
            cache_dir: String::from("Resources"),
            endpoint_url: String::from(crate::datasource::DEFAULT_ENDPOINT_URL),
            request_timeout_secs: 60,
            world_scale: 0.05,
            num_workers: 2,
            download_workers: 1,
            lock_backoff_millis: 50,
            idle_sleep_millis: 50,
            start_lon: 139.75,
            start_lat: 35.6,
        }
    }
}

impl ViewerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ViewerConfig> {
        let ff = File::open(path)?;
        let cfg: ViewerConfig = serde_json::from_reader(BufReader::new(ff))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut ff = File::create(path)?;
        serde_json::to_writer_pretty(&mut ff, self)?;
        ff.write_all(b"\n")?;
        Ok(())
    }

    pub fn start_location(&self) -> LonLat {
        LonLat::new(self.start_lon, self.start_lat)
    }

    pub fn validate(&self) -> Result<()> {
        if self.zoom_level > MAX_ZOOM {
            return Err(Error::InvalidInputError(format!(
                "zoom_level {} > {}",
                self.zoom_level, MAX_ZOOM
            )));
        }
        if self.view_distance < 0 || self.prefetch_distance < 0 {
            return Err(Error::InvalidInputError(format!(
                "negative view_distance {} or prefetch_distance {}",
                self.view_distance, self.prefetch_distance
            )));
        }
        if self.num_workers < 2 {
            return Err(Error::InvalidInputError(format!(
                "need at least 2 workers, not {}",
                self.num_workers
            )));
        }
        if self.download_workers == 0 || self.download_workers >= self.num_workers {
            return Err(Error::InvalidInputError(format!(
                "download_workers must be between 1 and {}, not {}",
                self.num_workers - 1,
                self.download_workers
            )));
        }
        if self.world_scale.is_nan() || self.world_scale <= 0.0 {
            return Err(Error::InvalidInputError(format!(
                "world_scale must be positive, not {}",
                self.world_scale
            )));
        }
        if !(-180.0..=180.0).contains(&self.start_lon) || !(-85.0511..=85.0511).contains(&self.start_lat) {
            return Err(Error::InvalidInputError(format!(
                "start location {} {} out of range",
                self.start_lon, self.start_lat
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ViewerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.zoom_level, 16);
        assert_eq!(c.start_location(), LonLat::new(139.75, 35.6));
    }

    #[test]
    fn test_partial_json() {
        let c: ViewerConfig =
            serde_json::from_str(r#"{"ZoomLevel": 15, "CacheDir": "/tmp/tiles"}"#).unwrap();
        assert_eq!(c.zoom_level, 15);
        assert_eq!(c.cache_dir, "/tmp/tiles");
        assert_eq!(c.num_workers, 2);
        assert_eq!(c.world_scale, 0.05);
    }

    #[test]
    fn test_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("viewer.json");
        let mut c = ViewerConfig::default();
        c.num_workers = 4;
        c.download_workers = 2;
        c.write(&fname).unwrap();
        assert_eq!(ViewerConfig::from_file(&fname).unwrap(), c);

        std::fs::write(&fname, r#"{"NumWorkers": 1}"#).unwrap();
        assert!(matches!(
            ViewerConfig::from_file(&fname),
            Err(Error::InvalidInputError(_))
        ));
        std::fs::write(&fname, "{").unwrap();
        assert!(matches!(ViewerConfig::from_file(&fname), Err(Error::JsonError(_))));
    }

    #[test]
    fn test_validate() {
        fn bad(f: fn(&mut ViewerConfig)) -> bool {
            let mut c = ViewerConfig::default();
            f(&mut c);
            c.validate().is_err()
        }
        assert!(bad(|c| c.zoom_level = 20));
        assert!(bad(|c| c.num_workers = 1));
        assert!(bad(|c| c.download_workers = 0));
        assert!(bad(|c| c.download_workers = 2));
        assert!(bad(|c| c.view_distance = -1));
        assert!(bad(|c| c.world_scale = 0.0));
        assert!(bad(|c| c.start_lat = 89.0));
        assert!(!bad(|c| c.zoom_level = 19));
    }
}
