//! Event dispatch
//!
//! The informer hands each [`ChangeEvent`] to an [`EventDispatcher`], which
//! awaits the registered [`EventHandler`] before the next event is taken from
//! the stream. A slow handler therefore stalls the watch instead of dropping
//! events.

mod event_dispatcher;
pub use event_dispatcher::*;


#[cfg(test)]
use mockall::automock;

use crate::ChangeEvent;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> Result<()>;
}

/// Handler for informers that only maintain a cache.
pub struct CacheOnly;

#[async_trait::async_trait]
impl EventHandler for CacheOnly {
    async fn handle(
        &self,
        _event: &ChangeEvent,
    ) -> Result<()> {
        Ok(())
    }
}
