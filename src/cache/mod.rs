mod resource_cache;
mod sync_barrier;

pub use resource_cache::*;
pub use sync_barrier::*;
