use std::fmt;

/// Deepest zoom level accepted anywhere in the crate.
pub const MAX_ZOOM: u32 = 19;

pub fn num_tiles_per_axis(zoom: u32) -> i32 {
    1 << zoom
}

/// Slippy-map tile index at some zoom level. Signed so that neighbourhoods
/// around edge tiles can be expressed before range checking.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize)]
pub struct TileIndex {
    pub x: i32,
    pub y: i32,
}

impl TileIndex {
    pub fn new(x: i32, y: i32) -> TileIndex {
        TileIndex { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> TileIndex {
        TileIndex::new(self.x + dx, self.y + dy)
    }

    pub fn is_valid(&self, zoom: u32) -> bool {
        let n = num_tiles_per_axis(zoom);
        self.x >= 0 && self.y >= 0 && self.x < n && self.y < n
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tile({}, {})", self.x, self.y)
    }
}

/// Inclusive rectangle of tile indices.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TileRect {
    pub min: TileIndex,
    pub max: TileIndex,
}

impl TileRect {
    pub fn new(min: TileIndex, max: TileIndex) -> TileRect {
        TileRect { min, max }
    }

    pub fn from_center_radius(center: TileIndex, radius: i32) -> TileRect {
        TileRect::new(center.offset(-radius, -radius), center.offset(radius, radius))
    }

    pub fn contains(&self, index: &TileIndex) -> bool {
        if index.x < self.min.x || index.x > self.max.x {
            return false;
        }
        if index.y < self.min.y || index.y > self.max.y {
            return false;
        }
        true
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    /// Row-major iteration, top row first.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let r = *self;
        (r.min.y..=r.max.y).flat_map(move |y| (r.min.x..=r.max.x).map(move |x| TileIndex::new(x, y)))
    }
}

impl fmt::Display for TileRect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}..={}, {}..={}]",
            self.min.x, self.max.x, self.min.y, self.max.y
        )
    }
}
