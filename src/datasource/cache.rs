use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::elements::TileIndex;
use crate::utils::{Error, Result};

/// Pass-through cache of raw OSM XML documents, one file per tile.
#[derive(Debug, Clone)]
pub struct TileCache {
    dir: PathBuf,
}

impl TileCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> TileCache {
        TileCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tile_path(&self, index: TileIndex, zoom: u32) -> PathBuf {
        self.dir
            .join(format!("map_{}-{}-{}.osm", zoom, index.x, index.y))
    }

    pub fn contains(&self, index: TileIndex, zoom: u32) -> bool {
        self.tile_path(index, zoom).is_file()
    }

    pub fn read(&self, index: TileIndex, zoom: u32) -> Result<Vec<u8>> {
        Ok(fs::read(self.tile_path(index, zoom))?)
    }

    /// Writes to a temporary file in the cache directory and renames it into
    /// place, so readers see either nothing or the whole document.
    pub fn write(&self, index: TileIndex, zoom: u32, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        tmp.persist(self.tile_path(index, zoom))
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    pub fn remove(&self, index: TileIndex, zoom: u32) -> Result<()> {
        let p = self.tile_path(index, zoom);
        if p.exists() {
            fs::remove_file(p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_path() {
        let c = TileCache::new("Resources");
        assert_eq!(
            c.tile_path(TileIndex::new(58208, 25824), 16),
            PathBuf::from("Resources/map_16-58208-25824.osm")
        );
    }

    #[test]
    fn test_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let c = TileCache::new(dir.path().join("nested").join("cache"));
        let t = TileIndex::new(3, 4);

        assert!(!c.contains(t, 5));
        assert!(c.read(t, 5).is_err());

        c.write(t, 5, b"<osm/>").unwrap();
        assert!(c.contains(t, 5));
        assert!(!c.contains(t, 6));
        assert_eq!(c.read(t, 5).unwrap(), b"<osm/>".to_vec());

        c.write(t, 5, b"<osm></osm>").unwrap();
        assert_eq!(c.read(t, 5).unwrap(), b"<osm></osm>".to_vec());

        // only the tile file is left behind
        let names: Vec<_> = std::fs::read_dir(c.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("map_5-3-4.osm")]);

        c.remove(t, 5).unwrap();
        assert!(!c.contains(t, 5));
        c.remove(t, 5).unwrap();
    }
}
