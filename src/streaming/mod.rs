mod jobs;
mod streamer;
mod tiles;
mod worker;

pub use crate::streaming::jobs::{JobQueue, RetrieveTileJob};
pub use crate::streaming::streamer::{PlayerState, TileStreamer};
pub use crate::streaming::tiles::ActiveTiles;
pub use crate::streaming::worker::{run_worker, SharedState, WorkerSettings};
