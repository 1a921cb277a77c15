use std::io::Read;
use std::time::Duration;

use crate::elements::LonLatRect;
use crate::utils::{Error, Result};

pub const DEFAULT_ENDPOINT_URL: &str = "https://overpass-api.de/api/interpreter";

/// Remote service returning the OSM XML document covering a box.
pub trait RemoteEndpoint: Sync + Send {
    fn fetch(&self, bounds: &LonLatRect, zoom: u32) -> Result<Vec<u8>>;
}

/// Decimal places needed to resolve roughly a thousandth of a tile's width.
pub fn coordinate_precision(zoom: u32) -> usize {
    let tiles_per_degree = f64::powi(2.0, zoom as i32) / 360.0;
    let p = tiles_per_degree.log10().ceil() as i64 + 3;
    p.clamp(3, 9) as usize
}

/// Overpass QL request for every node in `bounds` plus the ways and
/// relations using them.
pub fn overpass_query(bounds: &LonLatRect, zoom: u32) -> String {
    let p = coordinate_precision(zoom);
    format!(
        "[bbox:{:.p$},{:.p$},{:.p$},{:.p$}];(node;<;);out meta;",
        bounds.min.lat,
        bounds.min.lon,
        bounds.max.lat,
        bounds.max.lon,
        p = p
    )
}

pub struct OverpassEndpoint {
    url: String,
    agent: ureq::Agent,
}

impl OverpassEndpoint {
    pub fn new(url: &str, timeout_secs: u64) -> OverpassEndpoint {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("osmtilestream/", env!("CARGO_PKG_VERSION")))
            .build();
        OverpassEndpoint {
            url: String::from(url),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for OverpassEndpoint {
    fn default() -> OverpassEndpoint {
        OverpassEndpoint::new(DEFAULT_ENDPOINT_URL, 60)
    }
}

impl RemoteEndpoint for OverpassEndpoint {
    fn fetch(&self, bounds: &LonLatRect, zoom: u32) -> Result<Vec<u8>> {
        let query = overpass_query(bounds, zoom);
        let resp = self.agent.get(&self.url).query("data", &query).call()?;

        let mut data = Vec::new();
        resp.into_reader()
            .read_to_end(&mut data)
            .map_err(|e| Error::NetworkError(format!("reading response for {}: {}", bounds, e)))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_precision() {
        assert_eq!(coordinate_precision(0), 3);
        assert_eq!(coordinate_precision(10), 4);
        assert_eq!(coordinate_precision(16), 6);
        assert_eq!(coordinate_precision(19), 7);
        for z in 0..30 {
            assert!(coordinate_precision(z) >= coordinate_precision(z.saturating_sub(1)));
        }
    }

    #[test]
    fn test_overpass_query() {
        let b = LonLatRect::new(139.74609375, 35.5948, 139.7515, 35.6003);
        assert_eq!(
            overpass_query(&b, 16),
            "[bbox:35.594800,139.746094,35.600300,139.751500];(node;<;);out meta;"
        );
    }
}
