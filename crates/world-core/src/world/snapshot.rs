use contracts::{ViewerMessage, WorldSize};

use super::GridWorld;

impl GridWorld {
    /// Full world snapshot for a newly connected viewer: every entity and
    /// object, unconditionally.
    pub fn viewer_snapshot(&self, tick_duration_ms: u64) -> ViewerMessage {
        let (width, height) = self.dims();
        ViewerMessage::Snapshot {
            tick_id: self.tick(),
            entities: self.entities().values().cloned().collect(),
            objects: self.objects().values().cloned().collect(),
            world_size: WorldSize { width, height },
            tick_duration_ms,
        }
    }
}
