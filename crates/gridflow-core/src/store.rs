//! Indexed block store: an arena of blocks plus an id → slot index.
//!
//! Slot order is the drawing order (back to front). Spatial queries and
//! routing read the store; mutations go through explicit methods that keep
//! the index and the connection lists consistent.

use std::collections::{HashMap, HashSet};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::{Axis, Side};
use crate::block::{Block, BlockId, Connection};
use crate::grid::GridConfig;
use crate::routing::{self, RoutedPath};
use crate::spatial::{self, Direction};

/// Block store errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("Block already exists: {0}")]
    DuplicateBlock(BlockId),
    #[error("Block cannot connect to itself: {0}")]
    SelfConnection(BlockId),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Serialized form exchanged with the storage collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    blocks: Vec<Block>,
}

/// A connection together with the path drawn for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedConnector {
    pub connection: Connection,
    pub path: RoutedPath,
}

/// All blocks of one diagram.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: Vec<Block>,
    index: HashMap<BlockId, usize>,
}

impl BlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from blocks in drawing order.
    ///
    /// Connections that `connect` would refuse are dropped with a warning:
    /// self-connections, connections held by a block other than their
    /// source, repeated pairs (the last one wins) and dangling targets.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> StoreResult<Self> {
        let mut store = Self::new();
        for block in blocks {
            store.insert(block)?;
        }
        let known: HashSet<BlockId> = store.index.keys().copied().collect();
        for block in &mut store.blocks {
            block.connections.retain(|c| {
                let keep = known.contains(&c.to);
                if !keep {
                    log::warn!("dropping connection {} -> {}: unknown target", c.from, c.to);
                }
                keep
            });
        }
        Ok(store)
    }

    /// Add a block on top of the others.
    pub fn insert(&mut self, mut block: Block) -> StoreResult<BlockId> {
        let id = block.id;
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateBlock(id));
        }
        retain_own_connections(&mut block);
        self.index.insert(id, self.blocks.len());
        self.blocks.push(block);
        Ok(id)
    }

    /// Remove a block and every connection that points at it.
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let slot = self.index.remove(&id)?;
        let block = self.blocks.remove(slot);
        for (i, other) in self.blocks.iter().enumerate().skip(slot) {
            self.index.insert(other.id, i);
        }
        for other in &mut self.blocks {
            other.connections.retain(|c| c.to != id);
        }
        Some(block)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.index.get(&id).map(|&slot| &self.blocks[slot])
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.index.get(&id).map(|&slot| &mut self.blocks[slot])
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.index.contains_key(&id)
    }

    /// Rectangle of a block, if it exists and has one.
    pub fn rect(&self, id: BlockId) -> Option<Rect> {
        self.get(id)?.rect()
    }

    /// Blocks in drawing order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Move a block so its rectangle starts at `origin`.
    pub fn move_to(&mut self, id: BlockId, origin: Point) -> StoreResult<()> {
        let block = self.get_mut(id).ok_or(StoreError::UnknownBlock(id))?;
        block.translate_to(origin);
        Ok(())
    }

    /// Topmost block whose rectangle contains `point` (edges inclusive).
    pub fn block_at(&self, point: Point) -> Option<&Block> {
        self.blocks
            .iter()
            .rev()
            .find(|b| b.rect().is_some_and(|r| spatial::point_in_rect(point, r)))
    }

    /// Ids of blocks touching the selection rectangle, in drawing order.
    pub fn blocks_in_rect(&self, selection: Rect) -> Vec<BlockId> {
        let selection = selection.abs();
        self.blocks
            .iter()
            .filter(|b| b.rect().is_some_and(|r| spatial::rects_intersect(selection, r)))
            .map(|b| b.id)
            .collect()
    }

    /// Bounding box of all blocks.
    pub fn bounds(&self) -> Option<Rect> {
        self.blocks
            .iter()
            .filter_map(Block::rect)
            .reduce(|acc, r| acc.union(r))
    }

    fn others(&self, id: BlockId) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.id != id)
    }

    /// Block whose center is closest to the center of `id`.
    pub fn nearest(&self, id: BlockId) -> Option<&Block> {
        spatial::nearest_by_center(self.get(id)?, self.others(id))
    }

    /// Block closest to `id` along an axis, optionally in one direction.
    pub fn nearest_on_axis(
        &self,
        id: BlockId,
        axis: Axis,
        direction: Option<Direction>,
    ) -> Option<&Block> {
        spatial::nearest_on_axis(self.get(id)?, self.others(id), axis, direction)
    }

    /// Closest block beyond the `side` edge of `id`.
    pub fn nearest_in_direction(&self, id: BlockId, side: Side) -> Option<&Block> {
        spatial::nearest_in_direction(self.get(id)?, self.others(id), side)
    }

    /// Connect `from_side` of `from` to `to_side` of `to`.
    ///
    /// Connecting an already connected pair replaces its sides.
    pub fn connect(
        &mut self,
        from: BlockId,
        from_side: Side,
        to: BlockId,
        to_side: Side,
    ) -> StoreResult<Connection> {
        if from == to {
            return Err(StoreError::SelfConnection(from));
        }
        if !self.contains(to) {
            return Err(StoreError::UnknownBlock(to));
        }
        let source = self.get_mut(from).ok_or(StoreError::UnknownBlock(from))?;

        let connection = Connection {
            from,
            to,
            from_side,
            to_side,
        };
        match source.connections.iter_mut().find(|c| c.to == to) {
            Some(existing) => *existing = connection,
            None => source.connections.push(connection),
        }
        log::debug!("connected {from} ({from_side:?}) -> {to} ({to_side:?})");
        Ok(connection)
    }

    /// Connect `side` of `from` to the nearest block in that direction,
    /// entering it from the opposite side.
    pub fn auto_connect(&mut self, from: BlockId, side: Side) -> StoreResult<Option<Connection>> {
        if !self.contains(from) {
            return Err(StoreError::UnknownBlock(from));
        }
        let Some(target) = self.nearest_in_direction(from, side).map(|b| b.id) else {
            log::debug!("auto-connect {from} ({side:?}): no candidate");
            return Ok(None);
        };
        self.connect(from, side, target, side.opposite()).map(Some)
    }

    /// Remove the connection from `from` to `to`. Returns whether one existed.
    pub fn disconnect(&mut self, from: BlockId, to: BlockId) -> bool {
        let Some(source) = self.get_mut(from) else {
            return false;
        };
        let before = source.connections.len();
        source.connections.retain(|c| c.to != to);
        source.connections.len() != before
    }

    /// Every stored connection.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.blocks.iter().flat_map(|b| b.connections.iter())
    }

    /// Connections that end at `id`.
    pub fn incoming(&self, id: BlockId) -> impl Iterator<Item = &Connection> {
        self.connections().filter(move |c| c.to == id)
    }

    /// Route one connection against the current geometry.
    ///
    /// Returns `None` when an endpoint is missing or has no rectangle.
    pub fn route(&self, connection: &Connection, grid: &GridConfig) -> Option<RoutedPath> {
        let (Some(from), Some(to)) = (self.rect(connection.from), self.rect(connection.to))
        else {
            log::debug!(
                "skipping connector {} -> {}: endpoint missing",
                connection.from,
                connection.to
            );
            return None;
        };
        Some(routing::route(
            from,
            connection.from_side,
            to,
            connection.to_side,
            grid.unit(),
        ))
    }

    /// Paths for every drawable connection.
    pub fn connectors(&self, grid: &GridConfig) -> Vec<RoutedConnector> {
        self.connections()
            .filter_map(|connection| {
                self.route(connection, grid).map(|path| RoutedConnector {
                    connection: *connection,
                    path,
                })
            })
            .collect()
    }

    /// Serialize the blocks to JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        let snapshot = Snapshot {
            blocks: self.blocks.clone(),
        };
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load blocks from JSON.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Self::from_blocks(snapshot.blocks)
    }
}

/// Keep only connections that start at `block` and end elsewhere, one per
/// target.
fn retain_own_connections(block: &mut Block) {
    let id = block.id;
    let mut seen = HashSet::new();
    let mut kept: Vec<Connection> = block
        .connections
        .drain(..)
        .rev()
        .filter(|c| {
            if c.from != id || c.to == id {
                log::warn!("dropping connection {} -> {} held by {id}", c.from, c.to);
                return false;
            }
            seen.insert(c.to)
        })
        .collect();
    kept.reverse();
    block.connections = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn block(x: f64, y: f64, w: f64, h: f64) -> Block {
        Block::rectangle(Rect::from_origin_size((x, y), (w, h)))
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = BlockStore::new();
        let b = block(0.0, 0.0, 40.0, 40.0);
        let id = store.insert(b.clone()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id), Some(&b));
        assert_eq!(store.insert(b), Err(StoreError::DuplicateBlock(id)));
    }

    #[test]
    fn test_remove_reindexes_and_strips_connections() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        let b = store.insert(block(200.0, 0.0, 40.0, 40.0)).unwrap();
        let c = store.insert(block(400.0, 0.0, 40.0, 40.0)).unwrap();
        store.connect(a, Side::Right, b, Side::Left).unwrap();
        store.connect(c, Side::Left, b, Side::Right).unwrap();

        assert!(store.remove(b).is_some());
        assert!(store.get(b).is_none());
        assert_eq!(store.get(c).map(|blk| blk.id()), Some(c));
        assert_eq!(store.connections().count(), 0);
        assert!(store.remove(b).is_none());
    }

    #[test]
    fn test_block_at_prefers_topmost() {
        let mut store = BlockStore::new();
        let _bottom = store.insert(block(0.0, 0.0, 100.0, 100.0)).unwrap();
        let top = store.insert(block(50.0, 50.0, 100.0, 100.0)).unwrap();
        assert_eq!(store.block_at(Point::new(75.0, 75.0)).map(|b| b.id()), Some(top));
        assert!(store.block_at(Point::new(500.0, 500.0)).is_none());
    }

    #[test]
    fn test_blocks_in_rect() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        let _b = store.insert(block(200.0, 200.0, 40.0, 40.0)).unwrap();
        let selected = store.blocks_in_rect(Rect::new(100.0, 100.0, 40.0, 40.0));
        assert_eq!(selected, vec![a]);
    }

    #[test]
    fn test_nearest_excludes_reference() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = store.insert(block(200.0, 0.0, 100.0, 100.0)).unwrap();
        let c = store.insert(block(0.0, 500.0, 100.0, 100.0)).unwrap();
        assert_eq!(store.nearest(a).map(|blk| blk.id()), Some(b));
        assert_eq!(
            store
                .nearest_on_axis(a, Axis::Y, Some(Direction::Positive))
                .map(|blk| blk.id()),
            Some(c)
        );
        assert_eq!(
            store.nearest_in_direction(b, Side::Left).map(|blk| blk.id()),
            Some(a)
        );
    }

    #[test]
    fn test_connect_validation() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        let missing = Block::rectangle(Rect::ZERO).id();
        assert_eq!(
            store.connect(a, Side::Right, a, Side::Left),
            Err(StoreError::SelfConnection(a))
        );
        assert_eq!(
            store.connect(a, Side::Right, missing, Side::Left),
            Err(StoreError::UnknownBlock(missing))
        );
        assert_eq!(
            store.connect(missing, Side::Right, a, Side::Left),
            Err(StoreError::UnknownBlock(missing))
        );
    }

    #[test]
    fn test_reconnect_replaces_sides() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        let b = store.insert(block(200.0, 0.0, 40.0, 40.0)).unwrap();
        store.connect(a, Side::Right, b, Side::Left).unwrap();
        store.connect(a, Side::Bottom, b, Side::Top).unwrap();

        let connections: Vec<_> = store.connections().collect();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].from_side, Side::Bottom);
        assert_eq!(store.incoming(b).count(), 1);

        assert!(store.disconnect(a, b));
        assert!(!store.disconnect(a, b));
    }

    #[test]
    fn test_auto_connect() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = store.insert(block(300.0, 20.0, 100.0, 100.0)).unwrap();

        let connection = store.auto_connect(a, Side::Right).unwrap();
        assert_eq!(
            connection,
            Some(Connection {
                from: a,
                to: b,
                from_side: Side::Right,
                to_side: Side::Left,
            })
        );
        assert_eq!(store.auto_connect(a, Side::Top), Ok(None));
    }

    #[test]
    fn test_route_skips_missing_endpoints() {
        let grid = GridConfig::default();
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 160.0, 80.0)).unwrap();
        let b = store.insert(block(400.0, 0.0, 160.0, 80.0)).unwrap();
        let line = store.insert(Block::line(vec![Point::new(0.0, 300.0)])).unwrap();
        store.connect(a, Side::Right, b, Side::Left).unwrap();
        store.connect(a, Side::Bottom, line, Side::Top).unwrap();

        let connectors = store.connectors(&grid);
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].connection.to, b);
        assert_eq!(connectors[0].path.start(), Point::new(160.0, 40.0));
    }

    #[test]
    fn test_move_to() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        store.move_to(a, Point::new(80.0, 120.0)).unwrap();
        assert_eq!(store.rect(a), Some(Rect::new(80.0, 120.0, 120.0, 160.0)));
        let missing = Block::rectangle(Rect::ZERO).id();
        assert_eq!(
            store.move_to(missing, Point::ZERO),
            Err(StoreError::UnknownBlock(missing))
        );
    }

    #[test]
    fn test_json_snapshot() {
        let mut store = BlockStore::new();
        let a = store.insert(block(0.0, 0.0, 40.0, 40.0)).unwrap();
        let b = store
            .insert(Block::text(Point::new(200.0, 0.0), Size::new(200.0, 200.0), "Text"))
            .unwrap();
        store.connect(a, Side::Right, b, Side::Left).unwrap();

        let json = store.to_json().unwrap();
        let loaded = BlockStore::from_json(&json).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(b), store.get(b));
        assert_eq!(loaded.connections().count(), 1);

        assert!(matches!(
            BlockStore::from_json("{not json"),
            Err(StoreError::Serialization(_))
        ));
    }
    #[test]
    fn test_loading_drops_invalid_connections() {
        let mut a = block(0.0, 0.0, 160.0, 80.0);
        let b = block(400.0, 0.0, 160.0, 80.0);
        let (ida, idb) = (a.id(), b.id());
        let ghost = Block::rectangle(Rect::ZERO).id();
        let conn = |from, to, from_side| Connection {
            from,
            to,
            from_side,
            to_side: Side::Left,
        };
        a.connections = vec![
            conn(ida, ida, Side::Right),
            conn(idb, ida, Side::Right),
            conn(ida, idb, Side::Top),
            conn(ida, idb, Side::Right),
            conn(ida, ghost, Side::Right),
        ];
        let json = serde_json::to_string(&Snapshot {
            blocks: vec![a, b],
        })
        .unwrap();

        let mut loaded = BlockStore::from_json(&json).unwrap();
        let connections: Vec<Connection> = loaded.connections().copied().collect();
        assert_eq!(connections, vec![conn(ida, idb, Side::Right)]);
        assert_eq!(loaded.connectors(&GridConfig::default()).len(), 1);
        assert!(!loaded.disconnect(idb, ida));

        loaded.remove(idb);
        assert_eq!(loaded.connections().count(), 0);
    }
}

