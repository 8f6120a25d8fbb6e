use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voxmap_raster::{TILE_SIZE, TileGrid};
use voxmap_world::BlockPos;

use crate::MAX_GRID_SIZE;
use crate::error::WallError;

/// Direction a wall's frames face, derived from the creator's yaw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    South,
    North,
    East,
    West,
}

impl Orientation {
    /// South for `[315, 45)`, west `[45, 135)`, north `[135, 225)`, east otherwise.
    pub fn from_yaw(yaw: f64) -> Self {
        let yaw = yaw.rem_euclid(360.0);
        if !(45.0..315.0).contains(&yaw) {
            Orientation::South
        } else if yaw < 135.0 {
            Orientation::West
        } else if yaw < 225.0 {
            Orientation::North
        } else {
            Orientation::East
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::South => "south",
            Orientation::North => "north",
            Orientation::East => "east",
            Orientation::West => "west",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "south" => Some(Orientation::South),
            "north" => Some(Orientation::North),
            "east" => Some(Orientation::East),
            "west" => Some(Orientation::West),
            _ => None,
        }
    }

    /// `(dx, dz, fx, fz)`: column step along the wall and forward offset.
    fn steps(self) -> (i32, i32, i32, i32) {
        match self {
            Orientation::South => (-1, 0, 0, 2),
            Orientation::North => (1, 0, 0, -2),
            Orientation::East => (0, -1, 2, 0),
            Orientation::West => (0, 1, -2, 0),
        }
    }

    /// Offset from backing block to the frame hung on it.
    fn frame_offset(self) -> (i32, i32) {
        match self {
            Orientation::South => (0, -1),
            Orientation::North => (0, 1),
            Orientation::East => (-1, 0),
            Orientation::West => (1, 0),
        }
    }

    /// Frame block metadata understood by the host.
    pub fn frame_meta(self) -> u8 {
        match self {
            Orientation::South => 3,
            Orientation::North => 2,
            Orientation::East => 5,
            Orientation::West => 4,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grid slot of a wall: a backing block plus a frame showing one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlacement {
    pub slot: usize,
    pub gx: u32,
    pub gy: u32,
    pub backing: BlockPos,
    pub frame: BlockPos,
    pub facing: Orientation,
    pub tile_id: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WallInfo {
    pub region: String,
    pub size: u32,
    pub origin: BlockPos,
    pub facing: Orientation,
    pub image_path: PathBuf,
    pub tile_ids: TileGrid<u64>,
}

pub fn check_grid_size(size: u32) -> Result<(), WallError> {
    if size == 0 || size > MAX_GRID_SIZE {
        return Err(WallError::InvalidGridSize(size));
    }
    Ok(())
}

impl WallInfo {
    /// Builds a wall whose tiles take `ids` in gx-major order.
    pub fn new(
        region: impl Into<String>,
        size: u32,
        origin: BlockPos,
        facing: Orientation,
        image_path: impl Into<PathBuf>,
        ids: Range<u64>,
    ) -> Result<Self, WallError> {
        check_grid_size(size)?;
        let tile_ids =
            TileGrid::from_vec(size, ids.collect()).ok_or(WallError::InvalidGridSize(size))?;
        Ok(Self {
            region: region.into(),
            size,
            origin,
            facing,
            image_path: image_path.into(),
            tile_ids,
        })
    }

    /// Pixel side of the square image this wall displays.
    #[inline]
    pub fn target_side(&self) -> u32 {
        self.size * TILE_SIZE
    }

    #[inline]
    pub fn slots(&self) -> usize {
        (self.size * self.size) as usize
    }

    pub fn tile_id(&self, gx: u32, gy: u32) -> Option<u64> {
        self.tile_ids.get(gx, gy).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.tile_ids.iter().map(|(_, id)| *id)
    }

    /// World placement of slot `i`, filled row by row from the bottom.
    pub fn placement(&self, slot: usize) -> Option<FramePlacement> {
        if slot >= self.slots() {
            return None;
        }
        let n = self.size as usize;
        let gx = (slot % n) as u32;
        let gy = (slot / n) as u32;
        let (dx, dz, fx, fz) = self.facing.steps();
        let offset = -((self.size as i32 - 1) / 2) + gx as i32;
        let backing = BlockPos::new(
            self.origin.x + offset * dx + fx,
            self.origin.y + gy as i32,
            self.origin.z + offset * dz + fz,
        );
        let (ox, oz) = self.facing.frame_offset();
        Some(FramePlacement {
            slot,
            gx,
            gy,
            backing,
            frame: backing.offset(ox, 0, oz),
            facing: self.facing,
            tile_id: self.tile_id(gx, gy)?,
        })
    }

    pub fn placements(&self) -> impl Iterator<Item = FramePlacement> + '_ {
        (0..self.slots()).filter_map(move |i| self.placement(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_quadrants() {
        assert_eq!(Orientation::from_yaw(0.0), Orientation::South);
        assert_eq!(Orientation::from_yaw(-10.0), Orientation::South);
        assert_eq!(Orientation::from_yaw(315.0), Orientation::South);
        assert_eq!(Orientation::from_yaw(45.0), Orientation::West);
        assert_eq!(Orientation::from_yaw(180.0), Orientation::North);
        assert_eq!(Orientation::from_yaw(224.9), Orientation::North);
        assert_eq!(Orientation::from_yaw(225.0), Orientation::East);
        assert_eq!(Orientation::from_yaw(-90.0), Orientation::East);
    }

    #[test]
    fn south_wall_layout() {
        let wall = WallInfo::new("w", 3, BlockPos::new(10, 64, 10), Orientation::South, "w.png", 100..109)
            .unwrap();
        let first = wall.placement(0).unwrap();
        // start offset -1, step dx=-1, forward fz=+2
        assert_eq!(first.backing, BlockPos::new(11, 64, 12));
        assert_eq!(first.frame, BlockPos::new(11, 64, 11));
        assert_eq!(first.tile_id, 100);
        let last = wall.placement(8).unwrap();
        assert_eq!((last.gx, last.gy), (2, 2));
        assert_eq!(last.backing, BlockPos::new(9, 66, 12));
        assert_eq!(last.tile_id, 108);
        // slot 1 is gx=1, gy=0 which holds id index 1*3+0
        assert_eq!(wall.placement(1).unwrap().tile_id, 103);
        assert!(wall.placement(9).is_none());
    }

    #[test]
    fn east_wall_faces_west_side() {
        let wall = WallInfo::new("w", 2, BlockPos::new(0, 70, 0), Orientation::East, "w.png", 0..4)
            .unwrap();
        let p = wall.placement(1).unwrap();
        // offset 0 + gx 1 = 1, dz=-1, fx=+2
        assert_eq!(p.backing, BlockPos::new(2, 70, -1));
        assert_eq!(p.frame, BlockPos::new(1, 70, -1));
        assert_eq!(p.facing.frame_meta(), 5);
    }

    #[test]
    fn grid_size_bounds() {
        assert!(matches!(check_grid_size(0), Err(WallError::InvalidGridSize(0))));
        assert!(matches!(check_grid_size(101), Err(WallError::InvalidGridSize(101))));
        assert!(check_grid_size(100).is_ok());
        assert!(WallInfo::new("w", 2, BlockPos::default(), Orientation::North, "p", 0..3).is_err());
    }
}
