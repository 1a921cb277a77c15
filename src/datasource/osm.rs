use crate::datasource::{OverpassEndpoint, RemoteEndpoint, TileCache, TileDataSource};
use crate::elements::{TileData, TileIndex};
use crate::geometry::lonlat_bounds_from_tile;
use crate::message;
use crate::osmxml::{parse_tile, read_osm_xml};
use crate::utils::{Error, Result, Timer};

/// Tiles from a remote endpoint, with every fetched document kept in a local
/// cache directory.
pub struct OsmTileDataSource {
    cache: TileCache,
    endpoint: Box<dyn RemoteEndpoint>,
}

impl OsmTileDataSource {
    pub fn new(cache: TileCache, endpoint: Box<dyn RemoteEndpoint>) -> OsmTileDataSource {
        OsmTileDataSource { cache, endpoint }
    }

    pub fn with_overpass(cache_dir: &str, url: &str, timeout_secs: u64) -> OsmTileDataSource {
        OsmTileDataSource::new(
            TileCache::new(cache_dir),
            Box::new(OverpassEndpoint::new(url, timeout_secs)),
        )
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    fn download(&self, index: TileIndex, zoom: u32) -> Result<Vec<u8>> {
        if !index.is_valid(zoom) {
            return Err(Error::InvalidInputError(format!(
                "{} is outside zoom {}",
                index, zoom
            )));
        }
        let tx = Timer::new();
        let bounds = lonlat_bounds_from_tile(index, zoom);
        let data = self.endpoint.fetch(&bounds, zoom)?;
        message!(
            "fetched {} zoom {}: {} bytes in {:0.1}s",
            index,
            zoom,
            data.len(),
            tx.since()
        );
        Ok(data)
    }

    fn store(&self, index: TileIndex, zoom: u32, data: &[u8]) {
        if let Err(e) = self.cache.write(index, zoom, data) {
            message!("failed to cache {} zoom {}: {}", index, zoom, e);
        }
    }

    fn retrieve_from_cache(&self, index: TileIndex, zoom: u32) -> Option<TileData> {
        if !self.cache.contains(index, zoom) {
            return None;
        }
        let res = self
            .cache
            .read(index, zoom)
            .and_then(|data| parse_tile(index, zoom, &data));
        match res {
            Ok(t) => Some(t),
            Err(e) => {
                message!(
                    "cached {} unusable ({}), fetching again",
                    self.cache.tile_path(index, zoom).display(),
                    e
                );
                None
            }
        }
    }

    fn retrieve_from_server(&self, index: TileIndex, zoom: u32) -> Result<TileData> {
        let data = self.download(index, zoom)?;
        let tile = parse_tile(index, zoom, &data)?;
        self.store(index, zoom, &data);
        Ok(tile)
    }
}

impl TileDataSource for OsmTileDataSource {
    fn is_tile_cache_available(&self, index: TileIndex, zoom: u32) -> bool {
        self.cache.contains(index, zoom)
    }

    fn retrieve(&self, index: TileIndex, zoom: u32) -> Result<TileData> {
        if let Some(t) = self.retrieve_from_cache(index, zoom) {
            return Ok(t);
        }
        match self.retrieve_from_server(index, zoom) {
            Ok(t) => Ok(t),
            Err(e) => Err(Error::NotFound(format!("{} zoom {}: {}", index, zoom, e))),
        }
    }

    fn prefetch(&self, index: TileIndex, zoom: u32) -> Result<bool> {
        if self.cache.contains(index, zoom) {
            return Ok(false);
        }
        let data = self.download(index, zoom)?;

        // reject error documents so they never reach the cache
        let doc = read_osm_xml(&data)?;
        if doc.bounds.is_none() {
            return Err(Error::XmlDataError(format!(
                "{} zoom {}: document has no bounds element",
                index, zoom
            )));
        }
        self.cache.write(index, zoom, &data)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::synthetic_tile_document;
    use crate::elements::LonLatRect;
    use crate::geometry::lonlat_to_tile_index;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeEndpoint {
        calls: Arc<AtomicUsize>,
        body: Option<String>,
    }

    impl RemoteEndpoint for FakeEndpoint {
        fn fetch(&self, bounds: &LonLatRect, zoom: u32) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(b) => Ok(b.clone().into_bytes()),
                None => {
                    let idx = lonlat_to_tile_index(&bounds.center(), zoom);
                    Ok(synthetic_tile_document(idx, zoom).into_bytes())
                }
            }
        }
    }

    struct FailingEndpoint;
    impl RemoteEndpoint for FailingEndpoint {
        fn fetch(&self, _bounds: &LonLatRect, _zoom: u32) -> Result<Vec<u8>> {
            Err(Error::NetworkError(String::from("connection refused")))
        }
    }

    fn make_source(dir: &std::path::Path, body: Option<&str>) -> (OsmTileDataSource, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let src = OsmTileDataSource::new(
            TileCache::new(dir),
            Box::new(FakeEndpoint {
                calls: calls.clone(),
                body: body.map(String::from),
            }),
        );
        (src, calls)
    }

    #[test]
    fn test_retrieve_persists_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (src, calls) = make_source(dir.path(), None);
        let t = TileIndex::new(58208, 25824);

        assert!(!src.is_tile_cache_available(t, 16));
        let tile = src.retrieve(t, 16).unwrap();
        assert_eq!(tile.index, t);
        assert_eq!(tile.buildings.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(src.is_tile_cache_available(t, 16));

        let again = src.retrieve(t, 16).unwrap();
        assert_eq!(again, tile);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prefetch() {
        let dir = tempfile::tempdir().unwrap();
        let (src, calls) = make_source(dir.path(), None);
        let t = TileIndex::new(10, 12);

        assert!(src.prefetch(t, 5).unwrap());
        assert!(src.is_tile_cache_available(t, 5));
        assert!(!src.prefetch(t, 5).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        src.retrieve(t, 5).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_documents_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let remark = "<osm><remark>runtime error: out of memory</remark></osm>";
        let (src, calls) = make_source(dir.path(), Some(remark));
        let t = TileIndex::new(1, 1);

        match src.retrieve(t, 2) {
            Err(Error::NotFound(_)) => {}
            r => panic!("expected NotFound, got {:?}", r),
        }
        assert!(!src.is_tile_cache_available(t, 2));
        assert!(src.prefetch(t, 2).is_err());
        assert!(!src.is_tile_cache_available(t, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_corrupt_cache_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let (src, calls) = make_source(dir.path(), None);
        let t = TileIndex::new(2, 3);
        src.cache().write(t, 3, b"<osm><way id=").unwrap();

        let tile = src.retrieve(t, 3).unwrap();
        assert_eq!(tile.index, t);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(read_osm_xml(&src.cache().read(t, 3).unwrap()).is_ok());
    }

    #[test]
    fn test_network_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = OsmTileDataSource::new(TileCache::new(dir.path()), Box::new(FailingEndpoint));
        let t = TileIndex::new(0, 0);
        assert!(matches!(src.retrieve(t, 1), Err(Error::NotFound(_))));
        assert!(matches!(src.prefetch(t, 1), Err(Error::NetworkError(_))));
        assert!(matches!(
            src.prefetch(TileIndex::new(2, 0), 1),
            Err(Error::InvalidInputError(_))
        ));
    }
}
