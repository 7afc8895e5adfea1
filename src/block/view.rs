use crate::block::cursor::TransactionCursor;
use crate::block::transaction::TransactionView;
use crate::error::{DecodeError, Result};
use crate::event::{Event, SourceHandle};
use crate::protocol::{Block, BlockDecoder, EnvelopeDecoder, Sha256Hash, WireCodec};
use tracing::{debug, warn};

/// An immutable, decoded block event together with the source that delivered it.
///
/// The block structure is decoded once, at construction. Envelopes are decoded on
/// demand by [`transaction_at`](Self::transaction_at), so a corrupt envelope only
/// affects lookups of its own index.
#[derive(Debug, Clone)]
pub struct BlockView<D = WireCodec> {
    source: SourceHandle,
    event: Event,
    block: Block,
    decoder: D,
}

impl BlockView<WireCodec> {
    /// Decode `event` with the default wire codec.
    pub fn new(source: SourceHandle, event: Event) -> Result<Self> {
        Self::with_decoder(source, event, WireCodec::default())
    }
}

impl<D: BlockDecoder + EnvelopeDecoder> BlockView<D> {
    pub fn with_decoder(source: SourceHandle, event: Event, decoder: D) -> Result<Self> {
        let block = decoder
            .decode_block(event.block_bytes())
            .map_err(|err| {
                let err = match err {
                    DecodeError::MalformedBlock { .. } => err,
                    other => DecodeError::malformed_block(other.to_string()),
                };
                warn!(source = %source, error = %err, "rejecting block event");
                err
            })?;

        debug!(
            source = %source,
            block_number = block.header.number,
            transactions = block.envelope_count(),
            "decoded block event"
        );

        Ok(BlockView {
            source,
            event,
            block,
            decoder,
        })
    }
}

impl<D: EnvelopeDecoder> BlockView<D> {
    pub fn transaction_count(&self) -> usize {
        self.block.envelope_count()
    }

    /// Decode the transaction at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.transaction_count()`.
    pub fn transaction_at(&self, index: usize) -> Result<TransactionView<'_>> {
        let count = self.transaction_count();
        assert!(
            index < count,
            "transaction index {} out of range for block {} with {} transactions",
            index,
            self.block_number(),
            count
        );

        let info = self
            .decoder
            .decode_envelope(&self.block, index)
            .map_err(|err| {
                let err = match err {
                    DecodeError::MalformedEnvelope { index: i, .. } if i == index => err,
                    other => DecodeError::malformed_envelope(index, other.to_string()),
                };
                debug!(
                    source = %self.source,
                    block_number = self.block_number(),
                    index,
                    error = %err,
                    "envelope failed to decode"
                );
                err
            })?;

        Ok(TransactionView::new(
            index,
            self.block_number(),
            info,
            &self.source,
        ))
    }

    /// Decode every transaction in index order. Stops at the first malformed envelope.
    pub fn all_transaction_views(&self) -> Result<Vec<TransactionView<'_>>> {
        let count = self.transaction_count();
        let mut views = Vec::with_capacity(count);
        for index in 0..count {
            views.push(self.transaction_at(index)?);
        }
        Ok(views)
    }

    /// Lazily decode transactions in index order, one per step.
    pub fn transaction_views(&self) -> impl Iterator<Item = Result<TransactionView<'_>>> + '_ {
        (0..self.transaction_count()).map(move |index| self.transaction_at(index))
    }

    pub fn cursor(&self) -> TransactionCursor<'_, D> {
        TransactionCursor::new(self)
    }

    /// Channel of the first decodable envelope. `None` for blocks without one.
    pub fn channel_id(&self) -> Option<String> {
        self.transaction_views()
            .find_map(|view| view.ok())
            .map(|view| view.channel_id().to_string())
    }
}

impl<D> BlockView<D> {
    pub fn source_handle(&self) -> &SourceHandle {
        &self.source
    }

    pub fn raw_event(&self) -> &Event {
        &self.event
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_number(&self) -> u64 {
        self.block.header.number
    }

    pub fn previous_hash(&self) -> &Sha256Hash {
        &self.block.header.previous_hash
    }

    pub fn data_hash(&self) -> &Sha256Hash {
        &self.block.header.data_hash
    }

    pub fn block_hash(&self) -> Sha256Hash {
        self.block.hash()
    }
}
