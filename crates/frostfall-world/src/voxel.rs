//! The voxel world seam.
//!
//! Everything in the simulation that reads or writes blocks goes through
//! the [`VoxelWorld`] trait. [`ChunkedWorld`] is the in-memory
//! implementation used by the engine binary and by tests: chunk columns
//! keyed by [`ChunkPos`], each holding sparse per-column block maps so the
//! surface height is a single ordered-map lookup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use frostfall_types::{BlockKind, BlockPos, BlockState, ChunkPos};

use crate::error::WorldError;

/// Default lowest buildable y.
pub const DEFAULT_MIN_Y: i32 = -64;

/// Default highest buildable y.
pub const DEFAULT_MAX_Y: i32 = 320;

// ---------------------------------------------------------------------------
// VoxelWorld trait
// ---------------------------------------------------------------------------

/// Block access for a single dimension.
///
/// Reads of unloaded cells return [`BlockState::AIR`]; callers that must
/// not act on unloaded terrain check [`VoxelWorld::is_loaded`] first.
pub trait VoxelWorld {
    /// Lowest buildable y.
    fn min_y(&self) -> i32;

    /// Highest buildable y.
    fn max_y(&self) -> i32;

    /// Whether the cell is inside the build range and its chunk is loaded.
    fn is_loaded(&self, pos: BlockPos) -> bool;

    /// The block at `pos`.
    fn block(&self, pos: BlockPos) -> BlockState;

    /// Replace the block at `pos`.
    fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Result<(), WorldError>;

    /// The y of the highest ground block in the column, ignoring air and
    /// frozen atmosphere. `None` if the column is unloaded or empty.
    fn surface_y(&self, x: i32, z: i32) -> Option<i32>;

    /// Whether nothing but air or frozen atmosphere lies above `pos`.
    fn sees_sky(&self, pos: BlockPos) -> bool {
        self.surface_y(pos.x, pos.z).is_none_or(|top| top < pos.y)
    }

    /// Whether the column containing `(x, z)` is loaded.
    fn is_column_loaded(&self, x: i32, z: i32) -> bool {
        self.is_loaded(BlockPos::new(x, self.min_y(), z))
    }
}

// ---------------------------------------------------------------------------
// ChunkedWorld
// ---------------------------------------------------------------------------

/// One chunk column: sparse non-air blocks per `(x, z)` column, ordered by y.
#[derive(Debug, Clone, Default)]
struct Chunk {
    columns: HashMap<(i32, i32), BTreeMap<i32, BlockState>>,
}

/// In-memory chunked world.
///
/// Chunks hold their contents while unloaded; loading only controls
/// visibility to [`VoxelWorld`] callers.
#[derive(Debug, Clone)]
pub struct ChunkedWorld {
    min_y: i32,
    max_y: i32,
    chunks: HashMap<ChunkPos, Chunk>,
    loaded: BTreeSet<ChunkPos>,
}

impl ChunkedWorld {
    /// Create an empty world with the given vertical build range.
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            min_y,
            max_y,
            chunks: HashMap::new(),
            loaded: BTreeSet::new(),
        }
    }

    /// Mark a chunk as loaded, creating it if needed.
    pub fn load_chunk(&mut self, chunk: ChunkPos) {
        self.chunks.entry(chunk).or_default();
        self.loaded.insert(chunk);
    }

    /// Load every chunk whose column intersects the square of half-width
    /// `radius` blocks around `(x, z)`.
    pub fn load_area(&mut self, x: i32, z: i32, radius: i32) {
        let min = BlockPos::new(x.saturating_sub(radius), 0, z.saturating_sub(radius)).chunk();
        let max = BlockPos::new(x.saturating_add(radius), 0, z.saturating_add(radius)).chunk();
        for cx in min.x..=max.x {
            for cz in min.z..=max.z {
                self.load_chunk(ChunkPos::new(cx, cz));
            }
        }
    }

    /// Hide a chunk from callers without discarding its contents.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) {
        self.loaded.remove(&chunk);
    }

    /// Whether the chunk is loaded.
    pub fn is_chunk_loaded(&self, chunk: ChunkPos) -> bool {
        self.loaded.contains(&chunk)
    }

    /// Number of loaded chunks.
    pub fn loaded_chunk_count(&self) -> usize {
        self.loaded.len()
    }

    /// Fill the inclusive box between `a` and `b` with `state`.
    ///
    /// Cells outside loaded chunks are skipped. Returns the number of cells
    /// written.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, state: BlockState) -> usize {
        let mut written: usize = 0;
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    if self.set_block(BlockPos::new(x, y, z), state).is_ok() {
                        written = written.saturating_add(1);
                    }
                }
            }
        }
        written
    }

    /// Count cells of `kind` across every chunk, loaded or not.
    pub fn count_kind(&self, kind: BlockKind) -> usize {
        self.chunks
            .values()
            .flat_map(|chunk| chunk.columns.values())
            .flat_map(BTreeMap::values)
            .filter(|state| state.kind == kind)
            .count()
    }

    fn column(&self, x: i32, z: i32) -> Option<&BTreeMap<i32, BlockState>> {
        let chunk = BlockPos::new(x, 0, z).chunk();
        if !self.loaded.contains(&chunk) {
            return None;
        }
        self.chunks.get(&chunk)?.columns.get(&(x, z))
    }
}

impl Default for ChunkedWorld {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_Y, DEFAULT_MAX_Y)
    }
}

impl VoxelWorld for ChunkedWorld {
    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.max_y
    }

    fn is_loaded(&self, pos: BlockPos) -> bool {
        pos.y >= self.min_y && pos.y <= self.max_y && self.loaded.contains(&pos.chunk())
    }

    fn block(&self, pos: BlockPos) -> BlockState {
        if pos.y < self.min_y || pos.y > self.max_y {
            return BlockState::AIR;
        }
        self.column(pos.x, pos.z)
            .and_then(|column| column.get(&pos.y))
            .copied()
            .unwrap_or(BlockState::AIR)
    }

    fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Result<(), WorldError> {
        if pos.y < self.min_y || pos.y > self.max_y {
            return Err(WorldError::OutOfBounds {
                pos,
                min_y: self.min_y,
                max_y: self.max_y,
            });
        }
        let chunk_pos = pos.chunk();
        if !self.loaded.contains(&chunk_pos) {
            return Err(WorldError::Unloaded(pos));
        }
        let chunk = self.chunks.entry(chunk_pos).or_default();
        if state.kind.is_air() {
            if let Some(column) = chunk.columns.get_mut(&(pos.x, pos.z)) {
                column.remove(&pos.y);
                if column.is_empty() {
                    chunk.columns.remove(&(pos.x, pos.z));
                }
            }
        } else {
            chunk
                .columns
                .entry((pos.x, pos.z))
                .or_default()
                .insert(pos.y, state);
        }
        Ok(())
    }

    fn surface_y(&self, x: i32, z: i32) -> Option<i32> {
        self.column(x, z)?
            .iter()
            .rev()
            .find(|(_, state)| state.kind != BlockKind::FrozenAtmosphere)
            .map(|(y, _)| *y)
    }
}
