use crate::event::SourceHandle;
use crate::protocol::{EnvelopeInfo, HeaderType, TransactionAction, TxValidationCode};
use chrono::{DateTime, Utc};

/// One decoded transaction envelope at a fixed position in its block.
///
/// Borrows the source handle of the [`BlockView`](crate::block::BlockView) it was
/// decoded from and cannot outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionView<'a> {
    index: usize,
    block_number: u64,
    info: EnvelopeInfo,
    source: &'a SourceHandle,
}

impl<'a> TransactionView<'a> {
    pub(crate) fn new(
        index: usize,
        block_number: u64,
        info: EnvelopeInfo,
        source: &'a SourceHandle,
    ) -> Self {
        TransactionView {
            index,
            block_number,
            info,
            source,
        }
    }

    /// Position of this transaction within its block
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// The channel that delivered the enclosing block. Provenance only.
    pub fn source_handle(&self) -> &'a SourceHandle {
        self.source
    }

    pub fn envelope(&self) -> &EnvelopeInfo {
        &self.info
    }

    pub fn into_envelope(self) -> EnvelopeInfo {
        self.info
    }

    pub fn tx_id(&self) -> &str {
        &self.info.channel_header.tx_id
    }

    pub fn channel_id(&self) -> &str {
        &self.info.channel_header.channel_id
    }

    pub fn epoch(&self) -> u64 {
        self.info.channel_header.epoch
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.info.channel_header.timestamp_millis)
    }

    pub fn header_type(&self) -> HeaderType {
        self.info.channel_header.header_type
    }

    pub fn creator(&self) -> &[u8] {
        &self.info.signature_header.creator
    }

    pub fn nonce(&self) -> &[u8] {
        &self.info.signature_header.nonce
    }

    pub fn validation_code(&self) -> TxValidationCode {
        self.info.validation_code
    }

    pub fn is_valid(&self) -> bool {
        self.info.validation_code.is_valid()
    }

    pub fn is_endorser_transaction(&self) -> bool {
        self.info.transaction.is_some()
    }

    pub fn actions(&self) -> &[TransactionAction] {
        self.info.actions()
    }

    pub fn action_count(&self) -> usize {
        self.actions().len()
    }
}
