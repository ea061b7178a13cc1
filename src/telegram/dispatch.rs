//! Update dispatch loop
//!
//! A single consumer over the transport's ordered update stream. Handlers
//! run to completion one at a time, so nothing they share needs locking
//! beyond the storage layer's own transaction semantics.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use teloxide::types::{Update, UpdateKind};
use tokio_util::sync::CancellationToken;

use super::handlers::HandlerDeps;
use super::registry::{CommandRegistry, HandlerResult};

/// Why the dispatch loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancellation token fired (graceful shutdown)
    Cancelled,
    /// The transport closed its update stream
    StreamClosed,
}

/// Runs the dispatch loop until cancellation or stream end.
///
/// Updates are processed strictly in delivery order, at most one handler
/// in flight. Cancellation wins whenever it is ready at the same time as
/// an update (`biased`), but a handler that already started always runs
/// to completion. A handler error is logged and never terminates the loop.
pub async fn run_dispatch_loop<S>(
    mut updates: S,
    cancel: CancellationToken,
    registry: Arc<CommandRegistry>,
    deps: Arc<HandlerDeps>,
) -> LoopExit
where
    S: Stream<Item = Update> + Unpin,
{
    log::info!(
        "Dispatch loop started (commands: {})",
        registry.command_names().join(", ")
    );

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                log::info!("Dispatch loop cancelled, shutting down");
                return LoopExit::Cancelled;
            }

            next = updates.next() => match next {
                Some(update) => {
                    let update_id = update.id;
                    if let Err(e) = dispatch_update(&registry, &deps, update).await {
                        // Containment: one bad update must not crash the bot
                        log::error!("Error handling update {}: {}", update_id.0, e);
                    }
                }
                None => {
                    log::warn!("Update stream closed by transport");
                    return LoopExit::StreamClosed;
                }
            }
        }
    }
}

/// Routes one update to its resolved handler.
///
/// Updates without a message body are silently ignored, as are messages
/// that resolve to no handler.
async fn dispatch_update(
    registry: &CommandRegistry,
    deps: &Arc<HandlerDeps>,
    update: Update,
) -> HandlerResult {
    let UpdateKind::Message(msg) = update.kind else {
        return Ok(());
    };

    let Some((handler, args)) = registry.resolve(msg.text()) else {
        return Ok(());
    };

    handler(Arc::clone(deps), msg, args).await
}
