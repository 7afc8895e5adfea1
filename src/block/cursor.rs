use crate::block::transaction::TransactionView;
use crate::block::view::BlockView;
use crate::error::Result;
use crate::protocol::{EnvelopeDecoder, WireCodec};
use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Active,
    Exhausted,
}

/// Single-pass, forward-only walk over the transactions of a [`BlockView`].
///
/// A failed decode still consumes its position, so the next advance moves past the
/// malformed envelope. The caller decides whether to stop or continue.
#[derive(Debug)]
pub struct TransactionCursor<'a, D = WireCodec> {
    block: &'a BlockView<D>,
    position: usize,
    count: usize,
}

impl<'a, D: EnvelopeDecoder> TransactionCursor<'a, D> {
    pub(crate) fn new(block: &'a BlockView<D>) -> Self {
        TransactionCursor {
            block,
            position: 0,
            count: block.transaction_count(),
        }
    }

    pub fn state(&self) -> CursorState {
        if self.position < self.count {
            CursorState::Active
        } else {
            CursorState::Exhausted
        }
    }

    pub fn has_next(&self) -> bool {
        self.state() == CursorState::Active
    }

    /// Index the next call to [`advance`](Self::advance) will decode
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.count - self.position
    }

    /// Decode the transaction at the current position and move past it.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn advance(&mut self) -> Result<TransactionView<'a>> {
        assert!(
            self.has_next(),
            "advance called on exhausted cursor of block {}",
            self.block.block_number()
        );

        let index = self.position;
        self.position += 1;
        self.block.transaction_at(index)
    }
}

impl<'a, D: EnvelopeDecoder> Iterator for TransactionCursor<'a, D> {
    type Item = Result<TransactionView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.advance())
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<D: EnvelopeDecoder> ExactSizeIterator for TransactionCursor<'_, D> {}

impl<D: EnvelopeDecoder> FusedIterator for TransactionCursor<'_, D> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::event::{Event, SourceHandle};
    use crate::protocol::{BlockBuilder, EnvelopeBuilder};

    fn view_with(envelopes: Vec<Vec<u8>>) -> BlockView {
        let block = envelopes
            .into_iter()
            .fold(BlockBuilder::new(3), |builder, bytes| builder.raw_envelope(bytes))
            .build();
        BlockView::new(
            SourceHandle::new("peer0"),
            Event::new(block.to_bytes().unwrap()),
        )
        .unwrap()
    }

    fn envelope(nonce: u8) -> Vec<u8> {
        EnvelopeBuilder::endorser_transaction("mychannel")
            .nonce(vec![nonce])
            .timestamp_millis(1_700_000_000_000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_block_starts_exhausted() {
        let view = view_with(Vec::new());
        let mut cursor = view.cursor();
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(!cursor.has_next());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_advance_until_exhausted() {
        let view = view_with(vec![envelope(1), envelope(2)]);
        let mut cursor = view.cursor();

        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.advance().unwrap().index(), 0);
        assert_eq!(cursor.state(), CursorState::Active);
        assert_eq!(cursor.advance().unwrap().index(), 1);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_failure_consumes_position() {
        let view = view_with(vec![envelope(1), vec![0xAA; 5], envelope(3)]);
        let mut cursor = view.cursor();

        assert!(cursor.advance().is_ok());
        match cursor.advance() {
            Err(DecodeError::MalformedEnvelope { index, .. }) => assert_eq!(index, 1),
            other => panic!("Expected MalformedEnvelope, got {:?}", other),
        }
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.advance().unwrap().index(), 2);
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_iterator_is_fused() {
        let view = view_with(vec![envelope(1)]);
        let mut cursor = view.cursor();
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_independent_cursors() {
        let view = view_with(vec![envelope(1), envelope(2)]);
        let mut first = view.cursor();
        let _ = first.advance();

        let second = view.cursor();
        assert_eq!(second.position(), 0);
        assert_eq!(first.position(), 1);
    }

    #[test]
    #[should_panic(expected = "exhausted cursor")]
    fn test_advance_past_end_panics() {
        let view = view_with(Vec::new());
        let _ = view.cursor().advance();
    }
}
