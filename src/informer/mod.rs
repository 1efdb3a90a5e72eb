//! Informer: watch stream → cache → dispatcher.
//!
//! Turns raw [`WatchNotification`](crate::WatchNotification)s into
//! [`ChangeEvent`](crate::ChangeEvent)s by comparing them with the cache,
//! applies each event to the cache before handing it to the dispatcher, and
//! releases the [`SyncBarrier`](crate::SyncBarrier) once the first complete
//! listing has been delivered.
//!
//! ```text
//! ClusterApi::watch_resources()
//!   └─> Informer::run() [1 task per kind]
//!         ├─> Relisted  -> ResourceCache::bulk_load() -> dispatch diff -> mark synced
//!         ├─> Applied   -> Added | Updated            -> apply -> dispatch
//!         ├─> Deleted   -> Deleted                    -> apply -> dispatch
//!         └─> resync tick -> Updated(r, r) for every cached entry
//! ```

mod informer;
pub use informer::*;
