use std::collections::{BTreeMap, HashMap};

use super::{Aabb, BlockState, Entity, EntityId, WorldGrid};
use crate::shared::{BlockPos, Region};

/// Sparse in-memory world. Unset positions read back as air.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    id: String,
    blocks: HashMap<BlockPos, BlockState>,
    entities: BTreeMap<EntityId, Entity>,
    next_entity: u64,
}

impl MemoryWorld {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn fill(&mut self, region: Region, state: BlockState) {
        let (min, max) = (region.min(), region.max());
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_block(BlockPos::new(x, y, z), state);
                }
            }
        }
    }

    pub fn spawn(&mut self, position: [f64; 3], flying: bool) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(
            id,
            Entity {
                id,
                position,
                flying,
            },
        );
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Number of non-air blocks stored.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl WorldGrid for MemoryWorld {
    fn id(&self) -> &str {
        &self.id
    }

    fn block(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or(BlockState::AIR)
    }

    fn set_block(&mut self, pos: BlockPos, state: BlockState) {
        if state.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, state);
        }
    }

    fn entities_in(&self, aabb: &Aabb) -> Vec<Entity> {
        self.entities
            .values()
            .filter(|entity| aabb.contains(entity.position))
            .copied()
            .collect()
    }

    fn teleport(&mut self, id: EntityId, position: [f64; 3]) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = position;
        }
    }
}
