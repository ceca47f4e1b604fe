use std::collections::{HashMap, VecDeque};

use super::viewport::MapViewport;

const MAX_CACHED_TILES: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fills a `{z}/{x}/{y}` template. `{s}` picks a subdomain from the tile
    /// coordinates so requests spread across hosts.
    pub fn url(&self, template: &str) -> String {
        let subdomain = ["a", "b", "c"][((self.x + self.y) % 3) as usize];
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
            .replace("{s}", subdomain)
    }
}

/// A tile and where its top-left corner lands, as an offset from the view
/// center in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub tile: TileId,
    pub offset: (f64, f64),
    pub size: f64,
}

/// Tiles covering a `width` x `height` view, nearest to the center first.
pub fn visible_tiles(viewport: &MapViewport, width: f64, height: f64) -> Vec<TilePlacement> {
    let (z, size) = viewport.tile_zoom();
    let n = 1_i64 << z;
    let center = viewport.center_world();
    // Center in tile units at zoom `z`.
    let cx = center.x * n as f64;
    let cy = center.y * n as f64;
    let half_w = width / 2.0 / size;
    let half_h = height / 2.0 / size;

    let x_range = (cx - half_w).floor() as i64..=(cx + half_w).floor() as i64;
    let y_range = ((cy - half_h).floor() as i64).max(0)..=((cy + half_h).floor() as i64).min(n - 1);

    let mut placements = Vec::new();
    for ty in y_range {
        for tx in x_range.clone() {
            placements.push(TilePlacement {
                tile: TileId {
                    z,
                    x: tx.rem_euclid(n) as u32,
                    y: ty as u32,
                },
                offset: ((tx as f64 - cx) * size, (ty as f64 - cy) * size),
                size,
            });
        }
    }
    placements.sort_by(|a, b| {
        let da = (a.offset.0 + a.size / 2.0).hypot(a.offset.1 + a.size / 2.0);
        let db = (b.offset.0 + b.size / 2.0).hypot(b.offset.1 + b.size / 2.0);
        da.total_cmp(&db)
    });
    placements
}

#[derive(Debug)]
pub enum TileSlot<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Bounded cache of basemap tiles. `T` is the decoded texture.
#[derive(Debug)]
pub struct TileCache<T> {
    slots: HashMap<TileId, TileSlot<T>>,
    order: VecDeque<TileId>,
    capacity: usize,
}

impl<T> Default for TileCache<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_CACHED_TILES)
    }
}

impl<T> TileCache<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, tile: &TileId) -> Option<&TileSlot<T>> {
        self.slots.get(tile)
    }

    /// Marks `tile` as requested. Returns `true` only the first time, which is
    /// when the caller should actually fetch it.
    pub fn request(&mut self, tile: TileId) -> bool {
        if self.slots.contains_key(&tile) {
            return false;
        }
        self.insert(tile, TileSlot::Pending);
        true
    }

    pub fn fulfil(&mut self, tile: TileId, texture: T) {
        self.insert(tile, TileSlot::Ready(texture));
    }

    pub fn fail(&mut self, tile: TileId) {
        self.insert(tile, TileSlot::Failed);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn insert(&mut self, tile: TileId, slot: TileSlot<T>) {
        if self.slots.insert(tile, slot).is_none() {
            self.order.push_back(tile);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.slots.remove(&oldest);
            }
        }
    }
}
