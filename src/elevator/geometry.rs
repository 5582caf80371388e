use log::warn;

use crate::shared::{BlockPos, Region};
use crate::world::{Aabb, WorldGrid};

/**
 * Blocks that make up the car and the envelope they move in.
 *
 * `blocks` is in scan order: ascending x, then y, then z. The first entry is
 * the master block, which anchors the car's position. Both are shifted in
 * place while the car moves; the horizontal bounds and `height` come from
 * the region and never change with movement.
 */
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarGeometry {
    pub(crate) master: Option<BlockPos>,
    pub(crate) blocks: Vec<BlockPos>,
    low_x: i32,
    high_x: i32,
    low_z: i32,
    high_z: i32,
    height: i32,
}

impl CarGeometry {
    /// Scans `region` for non-air blocks. `ignore` is treated as air, for
    /// rescans triggered by a block that is about to disappear.
    pub fn scan(region: &Region, world: &dyn WorldGrid, ignore: Option<BlockPos>) -> CarGeometry {
        let (min, max) = (region.min(), region.max());
        let mut blocks = Vec::new();
        if !region.is_valid() {
            warn!(
                "Region {} .. {} is too large to scan, treating it as empty",
                region.loc1, region.loc2
            );
            return CarGeometry {
                master: None,
                blocks,
                low_x: min.x,
                high_x: max.x,
                low_z: min.z,
                high_z: max.z,
                height: region.height(),
            };
        }
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let pos = BlockPos::new(x, y, z);
                    if Some(pos) != ignore && !world.block(pos).is_air() {
                        blocks.push(pos);
                    }
                }
            }
        }

        CarGeometry {
            // Scan order visits the smallest coordinates first
            master: blocks.first().copied(),
            blocks,
            low_x: min.x,
            high_x: max.x,
            low_z: min.z,
            high_z: max.z,
            height: region.height(),
        }
    }

    pub fn master(&self) -> Option<BlockPos> {
        self.master
    }

    pub fn blocks(&self) -> &[BlockPos] {
        &self.blocks
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Horizontal extent as `(low_x, high_x, low_z, high_z)`, inclusive.
    pub fn horizontal_bounds(&self) -> (i32, i32, i32, i32) {
        (self.low_x, self.high_x, self.low_z, self.high_z)
    }

    /// Space riders occupy: the full horizontal extent, `height` blocks
    /// starting at the master block.
    pub fn envelope(&self) -> Option<Aabb> {
        let master = self.master?;
        // In f64 so a car at the edge of the i32 range cannot overflow
        Some(Aabb {
            min: [self.low_x as f64, master.y as f64, self.low_z as f64],
            max: [
                self.high_x as f64 + 1.0,
                master.y as f64 + self.height as f64,
                self.high_z as f64 + 1.0,
            ],
        })
    }

    pub fn lowest_y(&self) -> Option<i32> {
        self.blocks.iter().map(|b| b.y).min()
    }

    pub fn highest_y(&self) -> Option<i32> {
        self.blocks.iter().map(|b| b.y).max()
    }

    /// Whether shifting every block by `dy` keeps the car inside `region`.
    /// A shift past the `i32` range never fits.
    pub fn fits_after_shift(&self, region: &Region, dy: i32) -> bool {
        let (Some(low), Some(high)) = (self.lowest_y(), self.highest_y()) else {
            return false;
        };
        match (low.checked_add(dy), high.checked_add(dy)) {
            (Some(low), Some(high)) => low >= region.min().y && high <= region.max().y,
            _ => false,
        }
    }
}
