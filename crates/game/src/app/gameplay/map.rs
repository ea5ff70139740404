#[derive(Debug, PartialEq, Eq)]
struct TileDescriptor {
    name: &'static str,
    walkable: bool,
    display_color: [u8; 4],
}

const GRASS_DISPLAY_COLOR: [u8; 4] = [34, 139, 34, 255];

const VOID_TILE: TileDescriptor = TileDescriptor {
    name: "void",
    walkable: false,
    display_color: [0, 0, 0, 255],
};
const GRASS_TILE: TileDescriptor = TileDescriptor {
    name: "grass",
    walkable: true,
    display_color: GRASS_DISPLAY_COLOR,
};
const DIRT_TILE: TileDescriptor = TileDescriptor {
    name: "dirt",
    walkable: true,
    display_color: [139, 69, 19, 255],
};
const STONE_TILE: TileDescriptor = TileDescriptor {
    name: "stone",
    walkable: true,
    display_color: [128, 128, 128, 255],
};
const WATER_TILE: TileDescriptor = TileDescriptor {
    name: "water",
    walkable: false,
    display_color: [0, 100, 255, 255],
};
const SPAWN_TILE: TileDescriptor = TileDescriptor {
    name: "spawn",
    walkable: true,
    display_color: GRASS_DISPLAY_COLOR,
};
const WALL_TILE: TileDescriptor = TileDescriptor {
    name: "wall",
    walkable: false,
    display_color: [100, 50, 50, 255],
};
/// Stray colors in hand-painted maps decode as plain ground instead of
/// failing the whole load.
const DEFAULT_GROUND_TILE: TileDescriptor = TileDescriptor {
    name: "ground",
    walkable: true,
    display_color: GRASS_DISPLAY_COLOR,
};

const SPAWN_MARKER_COLOR: engine::Rgb = [255, 0, 0];

fn tile_descriptor_for(color: engine::Rgb) -> &'static TileDescriptor {
    match color {
        [0, 0, 0] => &VOID_TILE,
        [34, 139, 34] => &GRASS_TILE,
        [139, 69, 19] => &DIRT_TILE,
        [128, 128, 128] => &STONE_TILE,
        [0, 0, 255] => &WATER_TILE,
        [255, 0, 0] => &SPAWN_TILE,
        [165, 42, 42] => &WALL_TILE,
        _ => &DEFAULT_GROUND_TILE,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ObjectDescriptor {
    name: &'static str,
    /// Footprint in tiles, anchored at the marker pixel's tile.
    footprint: (u32, u32),
    walkable: bool,
    display_color: [u8; 4],
}

const SMALL_TREE_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "small_tree",
    footprint: (1, 1),
    walkable: false,
    display_color: [30, 90, 30, 255],
};
const LARGE_TREE_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "large_tree",
    footprint: (2, 2),
    walkable: false,
    display_color: [24, 76, 24, 255],
};
const BUSH_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "bush",
    footprint: (1, 1),
    walkable: false,
    display_color: [52, 130, 52, 255],
};
const HOUSE_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "house",
    footprint: (3, 2),
    walkable: false,
    display_color: [150, 90, 40, 255],
};
const SHED_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "shed",
    footprint: (2, 1),
    walkable: false,
    display_color: [120, 72, 32, 255],
};
const WELL_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "well",
    footprint: (1, 1),
    walkable: false,
    display_color: [90, 90, 110, 255],
};
const CHEST_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "chest",
    // Chests keep their tile walkable; actors are blocked by the chest
    // rectangle instead, so loot stays reachable from every side.
    footprint: (1, 1),
    walkable: true,
    display_color: CHEST_CLOSED_COLOR,
};
const BARREL_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "barrel",
    footprint: (1, 1),
    walkable: false,
    display_color: [150, 90, 50, 255],
};
const STONE_WALL_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "stone_wall",
    footprint: (1, 1),
    walkable: false,
    display_color: [110, 110, 110, 255],
};
const WOODEN_FENCE_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "wooden_fence",
    footprint: (1, 1),
    walkable: false,
    display_color: [96, 72, 48, 255],
};
const BRIDGE_OBJECT: ObjectDescriptor = ObjectDescriptor {
    name: "bridge",
    footprint: (3, 1),
    walkable: true,
    display_color: [160, 140, 110, 255],
};

fn object_descriptor_for(color: engine::Rgb) -> Option<&'static ObjectDescriptor> {
    match color {
        [50, 150, 50] => Some(&SMALL_TREE_OBJECT),
        [40, 120, 40] => Some(&LARGE_TREE_OBJECT),
        [60, 180, 60] => Some(&BUSH_OBJECT),
        [150, 75, 0] => Some(&HOUSE_OBJECT),
        [120, 60, 0] => Some(&SHED_OBJECT),
        [100, 50, 0] => Some(&WELL_OBJECT),
        [200, 200, 0] => Some(&CHEST_OBJECT),
        [180, 100, 50] => Some(&BARREL_OBJECT),
        [100, 100, 100] => Some(&STONE_WALL_OBJECT),
        [80, 60, 40] => Some(&WOODEN_FENCE_OBJECT),
        [150, 150, 150] => Some(&BRIDGE_OBJECT),
        _ => None,
    }
}

#[derive(Debug)]
pub(crate) struct PlacedObject {
    descriptor: &'static ObjectDescriptor,
    bounds: Rect,
}

impl PlacedObject {
    fn tile_coverage(&self, tile_size: u32) -> Vec<(i32, i32)> {
        let tile = tile_size as f32;
        let start_x = (self.bounds.x / tile).floor() as i32;
        let start_y = (self.bounds.y / tile).floor() as i32;
        let end_x = ((self.bounds.x + self.bounds.w - 1.0) / tile).floor() as i32;
        let end_y = ((self.bounds.y + self.bounds.h - 1.0) / tile).floor() as i32;

        let mut tiles = Vec::new();
        for tile_y in start_y..=end_y {
            for tile_x in start_x..=end_x {
                tiles.push((tile_x, tile_y));
            }
        }
        tiles
    }
}

/// A decoded map: terrain grid, placed objects, derived collision data and
/// the nominal spawn. Static for the lifetime of the scene.
#[derive(Debug)]
pub(crate) struct WorldMap {
    tile_size: u32,
    width: u32,
    height: u32,
    terrain: Vec<&'static TileDescriptor>,
    objects: Vec<PlacedObject>,
    blocked_tiles: HashSet<(i32, i32)>,
    nominal_spawn: Vec2,
}

impl WorldMap {
    /// One pixel per tile, row-major. Object markers take priority over tile
    /// colors; the terrain under an object decodes as plain ground. The first
    /// spawn-marker pixel sets the nominal spawn, defaulting to tile (1,1).
    pub(crate) fn decode(raster: &RgbRaster, tile_size: u32) -> Result<Self, String> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(format!(
                "map image is empty ({}x{})",
                raster.width(),
                raster.height()
            ));
        }
        if tile_size == 0 {
            return Err("tile size must be non-zero".to_string());
        }

        let width = raster.width();
        let height = raster.height();
        let mut terrain = Vec::with_capacity(width as usize * height as usize);
        let mut objects = Vec::new();
        let mut spawn_tile: Option<(i32, i32)> = None;

        for y in 0..height {
            for x in 0..width {
                let color = raster.pixel(x, y).unwrap_or([0, 0, 0]);

                if let Some(descriptor) = object_descriptor_for(color) {
                    let origin_x = (x * tile_size) as f32;
                    let origin_y = (y * tile_size) as f32;
                    objects.push(PlacedObject {
                        descriptor,
                        bounds: Rect {
                            x: origin_x,
                            y: origin_y,
                            w: (descriptor.footprint.0 * tile_size) as f32,
                            h: (descriptor.footprint.1 * tile_size) as f32,
                        },
                    });
                    terrain.push(&DEFAULT_GROUND_TILE);
                    continue;
                }

                if spawn_tile.is_none() && color == SPAWN_MARKER_COLOR {
                    spawn_tile = Some((x as i32, y as i32));
                }
                terrain.push(tile_descriptor_for(color));
            }
        }

        let (spawn_x, spawn_y) = spawn_tile.unwrap_or(DEFAULT_SPAWN_TILE);
        let half_tile = tile_size as f32 / 2.0;
        let nominal_spawn = Vec2 {
            x: spawn_x as f32 * tile_size as f32 + half_tile,
            y: spawn_y as f32 * tile_size as f32 + half_tile,
        };

        let mut blocked_tiles = HashSet::new();
        for object in &objects {
            if !object.descriptor.walkable {
                blocked_tiles.extend(object.tile_coverage(tile_size));
            }
        }

        Ok(Self {
            tile_size,
            width,
            height,
            terrain,
            objects,
            blocked_tiles,
            nominal_spawn,
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn tile_at_grid(&self, tile_x: i32, tile_y: i32) -> &'static TileDescriptor {
        if tile_x < 0 || tile_y < 0 || tile_x >= self.width as i32 || tile_y >= self.height as i32 {
            return &VOID_TILE;
        }
        self.terrain[tile_y as usize * self.width as usize + tile_x as usize]
    }

    fn tile_at_pixel(&self, world_x: f32, world_y: f32) -> &'static TileDescriptor {
        let (tile_x, tile_y) = self.pixel_to_tile(world_x, world_y);
        self.tile_at_grid(tile_x, tile_y)
    }

    fn pixel_to_tile(&self, world_x: f32, world_y: f32) -> (i32, i32) {
        (
            (world_x / self.tile_size as f32).floor() as i32,
            (world_y / self.tile_size as f32).floor() as i32,
        )
    }

    fn is_walkable(&self, world_x: f32, world_y: f32) -> bool {
        if !self.tile_at_pixel(world_x, world_y).walkable {
            return false;
        }
        !self
            .blocked_tiles
            .contains(&self.pixel_to_tile(world_x, world_y))
    }

    /// Whether a body-sized box centered on `point` stands clear, sampling
    /// the four corners inset by the collision margin.
    fn is_spawn_point_safe(&self, point: Vec2, body_w: f32, body_h: f32) -> bool {
        let margin = COLLISION_CORNER_MARGIN_PX;
        let left = point.x - body_w / 2.0;
        let top = point.y - body_h / 2.0;
        let corners = [
            (left + margin, top + margin),
            (left + body_w - margin, top + margin),
            (left + margin, top + body_h - margin),
            (left + body_w - margin, top + body_h - margin),
        ];
        corners
            .iter()
            .all(|(corner_x, corner_y)| self.is_walkable(*corner_x, *corner_y))
    }

    /// The nominal spawn when it is safe, otherwise the first safe tile
    /// center found by an expanding border-ring search. Exhausting the search
    /// degrades to the nominal point; an odd start beats no start at all.
    pub(crate) fn find_safe_spawn(&self, body_w: f32, body_h: f32) -> Vec2 {
        if self.is_spawn_point_safe(self.nominal_spawn, body_w, body_h) {
            return self.nominal_spawn;
        }

        let (spawn_tile_x, spawn_tile_y) =
            self.pixel_to_tile(self.nominal_spawn.x, self.nominal_spawn.y);
        let tile = self.tile_size as f32;
        let half_tile = tile / 2.0;

        for radius in 1..=SPAWN_SEARCH_MAX_RADIUS_TILES {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let tile_x = spawn_tile_x + dx;
                    let tile_y = spawn_tile_y + dy;
                    if tile_x < 0
                        || tile_y < 0
                        || tile_x >= self.width as i32
                        || tile_y >= self.height as i32
                    {
                        continue;
                    }
                    let candidate = Vec2 {
                        x: tile_x as f32 * tile + half_tile,
                        y: tile_y as f32 * tile + half_tile,
                    };
                    if self.is_spawn_point_safe(candidate, body_w, body_h) {
                        debug!(
                            tile_x,
                            tile_y, radius, "spawn_relocated_to_nearby_tile"
                        );
                        return candidate;
                    }
                }
            }
        }

        warn!(
            x = self.nominal_spawn.x,
            y = self.nominal_spawn.y,
            "spawn_search_exhausted_using_nominal"
        );
        self.nominal_spawn
    }

    pub(crate) fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    fn world_size_px(&self) -> (f32, f32) {
        (
            (self.width * self.tile_size) as f32,
            (self.height * self.tile_size) as f32,
        )
    }

    fn display_tilemap(&self) -> Tilemap {
        let colors = self
            .terrain
            .iter()
            .map(|descriptor| descriptor.display_color)
            .collect();
        Tilemap::new(self.tile_size, self.width, self.height, colors)
            .expect("terrain grid length matches map dimensions")
    }
}

#[cfg(test)]
mod map_tests {
    use super::*;

    pub(super) fn raster_from_rows(rows: &[&[engine::Rgb]]) -> RgbRaster {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.len()).unwrap_or(0) as u32;
        let mut pixels = Vec::new();
        for row in rows {
            pixels.extend_from_slice(row);
        }
        RgbRaster::from_pixels(width, height, pixels).expect("consistent row lengths")
    }

    pub(super) const G: engine::Rgb = [34, 139, 34];
    pub(super) const W: engine::Rgb = [165, 42, 42];
    pub(super) const B: engine::Rgb = [0, 0, 255];
    pub(super) const S: engine::Rgb = [255, 0, 0];

    #[test]
    fn unknown_colors_decode_as_walkable_ground() {
        let map = WorldMap::decode(&raster_from_rows(&[&[[7, 7, 7], G]]), 32).expect("decode");
        assert_eq!(map.tile_at_grid(0, 0).name, "ground");
        assert!(map.tile_at_grid(0, 0).walkable);
    }

    #[test]
    fn out_of_bounds_tiles_are_void_and_unwalkable() {
        let map = WorldMap::decode(&raster_from_rows(&[&[G, G]]), 32).expect("decode");
        assert_eq!(map.tile_at_grid(-1, 0).name, "void");
        assert_eq!(map.tile_at_grid(0, 5).name, "void");
        assert!(!map.is_walkable(-1.0, 0.0));
        assert!(!map.is_walkable(100.0, 0.0));
    }

    #[test]
    fn water_and_walls_block_walkability() {
        let map = WorldMap::decode(&raster_from_rows(&[&[G, B, W]]), 32).expect("decode");
        assert!(map.is_walkable(16.0, 16.0));
        assert!(!map.is_walkable(48.0, 16.0));
        assert!(!map.is_walkable(80.0, 16.0));
    }

    #[test]
    fn object_markers_take_priority_and_ground_shows_underneath() {
        let tree = [50, 150, 50];
        let map = WorldMap::decode(&raster_from_rows(&[&[G, tree]]), 32).expect("decode");
        assert_eq!(map.objects().len(), 1);
        assert_eq!(map.objects()[0].descriptor.name, "small_tree");
        // The terrain grid shows ground, but the object blocks the tile.
        assert_eq!(map.tile_at_grid(1, 0).name, "ground");
        assert!(!map.is_walkable(48.0, 16.0));
    }

    #[test]
    fn multi_tile_footprint_blocks_every_covered_tile() {
        let big_tree = [40, 120, 40];
        let map = WorldMap::decode(
            &raster_from_rows(&[&[big_tree, G, G], &[G, G, G], &[G, G, G]]),
            32,
        )
        .expect("decode");
        assert!(map.blocked_tiles.contains(&(0, 0)));
        assert!(map.blocked_tiles.contains(&(1, 0)));
        assert!(map.blocked_tiles.contains(&(0, 1)));
        assert!(map.blocked_tiles.contains(&(1, 1)));
        assert!(!map.blocked_tiles.contains(&(2, 0)));
    }

    #[test]
    fn chest_markers_keep_their_tile_walkable() {
        let chest = [200, 200, 0];
        let map = WorldMap::decode(&raster_from_rows(&[&[G, chest]]), 32).expect("decode");
        assert_eq!(map.objects()[0].descriptor.name, "chest");
        assert!(map.is_walkable(48.0, 16.0));
    }

    #[test]
    fn first_spawn_marker_wins_row_major() {
        let map = WorldMap::decode(
            &raster_from_rows(&[&[G, G, G], &[G, S, S], &[G, G, G]]),
            32,
        )
        .expect("decode");
        assert_eq!(map.nominal_spawn, Vec2 { x: 48.0, y: 48.0 });
    }

    #[test]
    fn missing_spawn_marker_defaults_to_tile_one_one() {
        let map = WorldMap::decode(
            &raster_from_rows(&[&[G, G, G], &[G, G, G], &[G, G, G]]),
            32,
        )
        .expect("decode");
        assert_eq!(map.nominal_spawn, Vec2 { x: 48.0, y: 48.0 });
    }

    #[test]
    fn empty_raster_is_a_decode_error() {
        let raster = RgbRaster::from_pixels(0, 0, Vec::new()).expect("empty raster");
        assert!(WorldMap::decode(&raster, 32).is_err());
    }

    #[test]
    fn safe_spawn_returns_nominal_when_clear() {
        let rows: Vec<Vec<engine::Rgb>> = vec![vec![G; 10]; 10];
        let borrowed: Vec<&[engine::Rgb]> = rows.iter().map(|row| row.as_slice()).collect();
        let map = WorldMap::decode(&raster_from_rows(&borrowed), 32).expect("decode");
        let spawn = map.find_safe_spawn(32.0, 32.0);
        assert_eq!(spawn, Vec2 { x: 48.0, y: 48.0 });
    }

    #[test]
    fn unsafe_spawn_relocates_to_nearest_open_ring() {
        // The default spawn tile (1,1) and its neighborhood are flooded; the
        // nearest open tiles sit outside the 4x4 water block.
        let mut rows: Vec<Vec<engine::Rgb>> = vec![vec![G; 8]; 8];
        for row in rows.iter_mut().take(4) {
            for cell in row.iter_mut().take(4) {
                *cell = B;
            }
        }
        let borrowed: Vec<&[engine::Rgb]> = rows.iter().map(|row| row.as_slice()).collect();
        let map = WorldMap::decode(&raster_from_rows(&borrowed), 32).expect("decode");

        let spawn = map.find_safe_spawn(32.0, 32.0);
        assert_ne!(spawn, map.nominal_spawn);
        assert!(map.is_spawn_point_safe(spawn, 32.0, 32.0));
    }

    #[test]
    fn exhausted_spawn_search_degrades_to_nominal() {
        let rows: Vec<Vec<engine::Rgb>> = vec![vec![B; 6]; 6];
        let borrowed: Vec<&[engine::Rgb]> = rows.iter().map(|row| row.as_slice()).collect();
        let map = WorldMap::decode(&raster_from_rows(&borrowed), 32).expect("decode");

        let spawn = map.find_safe_spawn(32.0, 32.0);
        assert_eq!(spawn, map.nominal_spawn);
    }

    #[test]
    fn display_tilemap_mirrors_terrain_colors() {
        let map = WorldMap::decode(&raster_from_rows(&[&[G, B]]), 32).expect("decode");
        let tilemap = map.display_tilemap();
        assert_eq!(tilemap.color_at(0, 0), Some(GRASS_DISPLAY_COLOR));
        assert_eq!(tilemap.color_at(1, 0), Some(WATER_TILE.display_color));
    }
}
