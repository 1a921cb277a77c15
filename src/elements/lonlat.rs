use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat { lon, lat }
    }
}

impl Serialize for LonLat {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.lon)?;
        seq.serialize_element(&self.lat)?;
        seq.end()
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lon, self.lat)
    }
}

/// Lon/lat rectangle with `min <= max` on both axes.
#[derive(Clone, Copy, PartialEq, Debug, Default, serde::Serialize)]
pub struct LonLatRect {
    pub min: LonLat,
    pub max: LonLat,
}

impl LonLatRect {
    pub fn new(minlon: f64, minlat: f64, maxlon: f64, maxlat: f64) -> LonLatRect {
        LonLatRect {
            min: LonLat::new(minlon, minlat),
            max: LonLat::new(maxlon, maxlat),
        }
    }

    pub fn empty() -> LonLatRect {
        LonLatRect::new(180.0, 90.0, -180.0, -90.0)
    }

    pub fn is_empty(&self) -> bool {
        self.min.lon > self.max.lon || self.min.lat > self.max.lat
    }

    pub fn contains_point(&self, p: &LonLat) -> bool {
        if self.min.lon > p.lon {
            return false;
        }
        if self.min.lat > p.lat {
            return false;
        }
        if self.max.lon < p.lon {
            return false;
        }
        if self.max.lat < p.lat {
            return false;
        }
        true
    }

    pub fn expand(&mut self, p: &LonLat) {
        if p.lon < self.min.lon {
            self.min.lon = p.lon;
        }
        if p.lat < self.min.lat {
            self.min.lat = p.lat;
        }
        if p.lon > self.max.lon {
            self.max.lon = p.lon;
        }
        if p.lat > self.max.lat {
            self.max.lat = p.lat;
        }
    }

    pub fn overlaps(&self, other: &LonLatRect) -> bool {
        if self.min.lon > other.max.lon {
            return false;
        }
        if self.min.lat > other.max.lat {
            return false;
        }
        if other.min.lon > self.max.lon {
            return false;
        }
        if other.min.lat > self.max.lat {
            return false;
        }
        true
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }
}

impl fmt::Display for LonLatRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:12.7} {:12.7} {:12.7} {:12.7}]",
            self.min.lon, self.min.lat, self.max.lon, self.max.lat
        )
    }
}
