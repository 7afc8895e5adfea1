//! Event dispatch: correlates decoded blocks and transactions with listeners
//!
//! The dispatcher turns each `(SourceHandle, Event)` pair from the subscription
//! layer into a [`BlockView`], notifies block listeners, then walks the block with a
//! cursor and fires one-shot transaction listeners registered by transaction id.

use crate::block::{BlockView, TransactionView};
use crate::config::{Config, FailurePolicy};
use crate::error::Result;
use crate::event::{Event, SourceHandle};
use crate::protocol::WireCodec;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type BlockListener = Arc<dyn Fn(&BlockView) + Send + Sync>;
type TxListener = Box<dyn FnOnce(&TransactionView<'_>) + Send>;

pub type EventSender = mpsc::Sender<(SourceHandle, Event)>;
pub type EventReceiver = mpsc::Receiver<(SourceHandle, Event)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Outcome of dispatching one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub block_number: u64,
    /// Transactions that decoded
    pub transactions: usize,
    /// Transaction listeners fired
    pub delivered: usize,
    /// Indices of envelopes skipped as malformed
    pub malformed: Vec<usize>,
}

/// Totals accumulated by [`EventDispatcher::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub blocks_dispatched: u64,
    pub blocks_rejected: u64,
    pub transactions_seen: u64,
    pub malformed_envelopes: u64,
    pub tx_listeners_fired: u64,
}

impl DispatchStats {
    fn record(&mut self, summary: &DispatchSummary) {
        self.blocks_dispatched += 1;
        self.transactions_seen += summary.transactions as u64;
        self.malformed_envelopes += summary.malformed.len() as u64;
        self.tx_listeners_fired += summary.delivered as u64;
    }
}

pub struct EventDispatcher {
    codec: WireCodec,
    policy: FailurePolicy,
    channel_capacity: usize,
    next_handle: AtomicU64,
    block_listeners: RwLock<Vec<(ListenerHandle, BlockListener)>>,
    tx_listeners: Mutex<HashMap<String, Vec<(ListenerHandle, TxListener)>>>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl EventDispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            codec: WireCodec::new(config.decoder.clone()),
            policy: config.dispatch.failure_policy,
            channel_capacity: config.dispatch.channel_capacity,
            next_handle: AtomicU64::new(0),
            block_listeners: RwLock::new(Vec::new()),
            tx_listeners: Mutex::new(HashMap::new()),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Bounded channel sized from config, for the subscription layer to feed [`run`](Self::run)
    pub fn event_channel(&self) -> (EventSender, EventReceiver) {
        mpsc::channel(self.channel_capacity)
    }

    fn next_handle(&self) -> ListenerHandle {
        ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    pub fn register_block_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&BlockView) + Send + Sync + 'static,
    {
        let handle = self.next_handle();
        let listener: BlockListener = Arc::new(listener);
        self.block_listeners.write().push((handle, listener));
        handle
    }

    pub fn unregister_block_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.block_listeners.write();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    /// Register a listener fired once, for the first transaction seen with `tx_id`.
    pub fn register_tx_listener<F>(&self, tx_id: impl Into<String>, listener: F) -> ListenerHandle
    where
        F: FnOnce(&TransactionView<'_>) + Send + 'static,
    {
        let handle = self.next_handle();
        let listener: TxListener = Box::new(listener);
        self.tx_listeners
            .lock()
            .entry(tx_id.into())
            .or_default()
            .push((handle, listener));
        handle
    }

    pub fn unregister_tx_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.tx_listeners.lock();
        let mut removed = false;
        listeners.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|(h, _)| *h != handle);
            removed |= entries.len() != before;
            !entries.is_empty()
        });
        removed
    }

    pub fn pending_tx_listeners(&self) -> usize {
        self.tx_listeners.lock().values().map(Vec::len).sum()
    }

    /// Decode one block event and notify listeners.
    ///
    /// A malformed block is returned as an error before any listener runs. A malformed
    /// envelope is skipped or returned according to the configured [`FailurePolicy`].
    pub fn dispatch(&self, source: SourceHandle, event: Event) -> Result<DispatchSummary> {
        let view = BlockView::with_decoder(source, event, self.codec.clone())?;

        // Listeners may register or unregister from inside a callback
        let block_listeners: Vec<BlockListener> = self
            .block_listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in &block_listeners {
            listener(&view);
        }

        let mut summary = DispatchSummary {
            block_number: view.block_number(),
            ..Default::default()
        };

        let mut cursor = view.cursor();
        while cursor.has_next() {
            match cursor.advance() {
                Ok(tx) => {
                    summary.transactions += 1;
                    summary.delivered += self.notify_tx_listeners(&tx);
                }
                Err(err) => {
                    warn!(
                        source = %view.source_handle(),
                        block_number = view.block_number(),
                        error = %err,
                        policy = ?self.policy,
                        "malformed envelope in block event"
                    );
                    match self.policy {
                        FailurePolicy::Skip => summary.malformed.extend(err.envelope_index()),
                        FailurePolicy::Abort => return Err(err),
                    }
                }
            }
        }

        debug!(
            source = %view.source_handle(),
            block_number = summary.block_number,
            transactions = summary.transactions,
            malformed = summary.malformed.len(),
            "dispatched block event"
        );

        Ok(summary)
    }

    fn notify_tx_listeners(&self, tx: &TransactionView<'_>) -> usize {
        if tx.tx_id().is_empty() {
            return 0;
        }

        let listeners = self.tx_listeners.lock().remove(tx.tx_id());
        match listeners {
            Some(listeners) => {
                let fired = listeners.len();
                for (_, listener) in listeners {
                    listener(tx);
                }
                fired
            }
            None => 0,
        }
    }

    /// Dispatch events until every sender is dropped.
    pub async fn run(&self, mut receiver: EventReceiver) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Some((source, event)) = receiver.recv().await {
            match self.dispatch(source.clone(), event) {
                Ok(summary) => stats.record(&summary),
                Err(err) => {
                    stats.blocks_rejected += 1;
                    warn!(source = %source, error = %err, "dropping block event");
                }
            }
        }

        info!(
            blocks = stats.blocks_dispatched,
            rejected = stats.blocks_rejected,
            transactions = stats.transactions_seen,
            "event channel closed"
        );
        stats
    }
}
