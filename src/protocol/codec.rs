/// Decoder seams and the bincode wire codec behind them
use crate::config::DecoderConfig;
use crate::error::{DecodeError, EncodeError, Result};
use crate::protocol::types::{
    Block, ChannelHeader, Envelope, HeaderType, Payload, SignatureHeader, Transaction,
    TransactionAction, TxValidationCode,
};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Turns raw block bytes into a [`Block`].
pub trait BlockDecoder {
    fn decode_block(&self, bytes: &[u8]) -> Result<Block>;
}

/// Decodes the envelope at `index` of an already decoded block.
/// Must be a pure function of `block` and `index`.
pub trait EnvelopeDecoder {
    fn decode_envelope(&self, block: &Block, index: usize) -> Result<EnvelopeInfo>;
}

/// Everything the envelope decoder extracts from one envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub channel_header: ChannelHeader,
    pub signature_header: SignatureHeader,
    pub signature: Vec<u8>,
    pub validation_code: TxValidationCode,
    /// Decoded body, present only for endorser transactions
    pub transaction: Option<Transaction>,
}

impl EnvelopeInfo {
    pub fn actions(&self) -> &[TransactionAction] {
        self.transaction
            .as_ref()
            .map(|tx| tx.actions.as_slice())
            .unwrap_or(&[])
    }
}

fn encoding_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub(crate) fn decode_bounded<T: DeserializeOwned>(
    bytes: &[u8],
    limit: usize,
) -> std::result::Result<T, bincode::Error> {
    encoding_options()
        .with_limit(limit as u64)
        .deserialize(bytes)
}

pub(crate) fn encode<T: Serialize>(
    what: &'static str,
    value: &T,
) -> std::result::Result<Vec<u8>, EncodeError> {
    encoding_options()
        .serialize(value)
        .map_err(|source| EncodeError::Serialize { what, source })
}

impl Block {
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        encode("block", self)
    }
}

impl Envelope {
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        encode("envelope", self)
    }
}

impl Payload {
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        encode("payload", self)
    }
}

impl Transaction {
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        encode("transaction", self)
    }
}

/// The default codec: bincode with fixed-width integers, size limits from
/// [`DecoderConfig`], and trailing bytes rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireCodec {
    config: DecoderConfig,
}

impl WireCodec {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl BlockDecoder for WireCodec {
    fn decode_block(&self, bytes: &[u8]) -> Result<Block> {
        if bytes.is_empty() {
            return Err(DecodeError::malformed_block("empty block payload"));
        }

        if bytes.len() > self.config.max_block_size {
            return Err(DecodeError::malformed_block(format!(
                "block too large: {} bytes (max: {})",
                bytes.len(),
                self.config.max_block_size
            )));
        }

        let block: Block = decode_bounded(bytes, self.config.max_block_size)
            .map_err(|e| DecodeError::malformed_block(e.to_string()))?;

        let filter_len = block.metadata.transactions_filter.len();
        if filter_len != 0 && filter_len != block.envelope_count() {
            return Err(DecodeError::malformed_block(format!(
                "transactions filter covers {} envelopes, block has {}",
                filter_len,
                block.envelope_count()
            )));
        }

        if self.config.verify_data_hash {
            let expected = Block::calculate_data_hash(&block.data);
            if expected != block.header.data_hash {
                return Err(DecodeError::malformed_block(format!(
                    "data hash mismatch. Expected {}, but got {}",
                    hex::encode(expected),
                    hex::encode(block.header.data_hash)
                )));
            }
        }

        Ok(block)
    }
}

impl EnvelopeDecoder for WireCodec {
    fn decode_envelope(&self, block: &Block, index: usize) -> Result<EnvelopeInfo> {
        let malformed = |reason: String| DecodeError::malformed_envelope(index, reason);

        let bytes = block.envelope_bytes(index).ok_or_else(|| {
            malformed(format!(
                "block {} has no envelope at index {} ({} envelopes)",
                block.header.number,
                index,
                block.envelope_count()
            ))
        })?;

        if bytes.is_empty() {
            return Err(malformed("nil envelope".to_string()));
        }

        let limit = self.config.max_envelope_size;
        if bytes.len() > limit {
            return Err(malformed(format!(
                "envelope too large: {} bytes (max: {})",
                bytes.len(),
                limit
            )));
        }

        let envelope: Envelope =
            decode_bounded(bytes, limit).map_err(|e| malformed(format!("envelope: {}", e)))?;

        if envelope.payload.is_empty() {
            return Err(malformed("envelope has no payload".to_string()));
        }

        let payload: Payload = decode_bounded(&envelope.payload, limit)
            .map_err(|e| malformed(format!("payload: {}", e)))?;

        let transaction = match payload.header.channel_header.header_type {
            HeaderType::EndorserTransaction => Some(
                decode_bounded::<Transaction>(&payload.data, limit)
                    .map_err(|e| malformed(format!("endorser transaction: {}", e)))?,
            ),
            _ => None,
        };

        Ok(EnvelopeInfo {
            channel_header: payload.header.channel_header,
            signature_header: payload.header.signature_header,
            signature: envelope.signature,
            validation_code: block.validation_code(index),
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BlockBuilder, EnvelopeBuilder};

    fn endorser_envelope(nonce: &[u8]) -> Vec<u8> {
        EnvelopeBuilder::endorser_transaction("mychannel")
            .creator(b"org1-peer0".to_vec())
            .nonce(nonce.to_vec())
            .timestamp_millis(1_700_000_000_000)
            .action(b"action-header".to_vec(), b"action-payload".to_vec())
            .build()
            .unwrap()
    }

    #[test]
    fn test_decode_block_roundtrip_header() {
        let block = BlockBuilder::new(7)
            .previous_hash([3u8; 32])
            .envelope(endorser_envelope(b"n1"))
            .build();
        let bytes = block.to_bytes().unwrap();

        let decoded = WireCodec::default().decode_block(&bytes).unwrap();
        assert_eq!(decoded.header.number, 7);
        assert_eq!(decoded.header.previous_hash, [3u8; 32]);
        assert_eq!(decoded.envelope_count(), 1);
    }

    #[test]
    fn test_garbage_block_rejected() {
        let result = WireCodec::default().decode_block(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(DecodeError::MalformedBlock { .. })));
    }

    #[test]
    fn test_empty_block_bytes_rejected() {
        let result = WireCodec::default().decode_block(&[]);
        assert!(matches!(result, Err(DecodeError::MalformedBlock { .. })));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = BlockBuilder::new(1).build().to_bytes().unwrap();
        bytes.push(0);
        let result = WireCodec::default().decode_block(&bytes);
        assert!(matches!(result, Err(DecodeError::MalformedBlock { .. })));
    }

    #[test]
    fn test_data_hash_mismatch() {
        let mut block = BlockBuilder::new(2).envelope(endorser_envelope(b"n")).build();
        block.header.data_hash = [0u8; 32];
        let bytes = block.to_bytes().unwrap();

        let strict = WireCodec::default();
        match strict.decode_block(&bytes) {
            Err(DecodeError::MalformedBlock { reason }) => assert!(reason.contains("data hash")),
            other => panic!("Expected MalformedBlock, got {:?}", other),
        }

        let lenient = WireCodec::new(DecoderConfig {
            verify_data_hash: false,
            ..DecoderConfig::default()
        });
        assert!(lenient.decode_block(&bytes).is_ok());
    }

    #[test]
    fn test_block_size_limit() {
        let bytes = BlockBuilder::new(1)
            .envelope(endorser_envelope(b"n"))
            .build()
            .to_bytes()
            .unwrap();
        let codec = WireCodec::new(DecoderConfig {
            max_block_size: 16,
            max_envelope_size: 16,
            verify_data_hash: true,
        });
        assert!(matches!(
            codec.decode_block(&bytes),
            Err(DecodeError::MalformedBlock { .. })
        ));
    }

    #[test]
    fn test_decode_endorser_envelope() {
        let block = BlockBuilder::new(1)
            .envelope(endorser_envelope(b"nonce-1"))
            .build();

        let info = WireCodec::default().decode_envelope(&block, 0).unwrap();
        assert_eq!(info.channel_header.channel_id, "mychannel");
        assert_eq!(info.channel_header.header_type, HeaderType::EndorserTransaction);
        assert_eq!(
            info.channel_header.tx_id,
            crate::protocol::compute_tx_id(b"nonce-1", b"org1-peer0")
        );
        assert_eq!(info.validation_code, TxValidationCode::Valid);
        assert_eq!(info.actions().len(), 1);
        assert_eq!(info.actions()[0].payload, b"action-payload".to_vec());
    }

    #[test]
    fn test_config_envelope_has_no_transaction_body() {
        let envelope = EnvelopeBuilder::new(HeaderType::Config, "mychannel")
            .data(b"config-bytes".to_vec())
            .build()
            .unwrap();
        let block = BlockBuilder::new(0).envelope(envelope).build();

        let info = WireCodec::default().decode_envelope(&block, 0).unwrap();
        assert_eq!(info.channel_header.header_type, HeaderType::Config);
        assert!(info.transaction.is_none());
        assert!(info.actions().is_empty());
    }

    #[test]
    fn test_malformed_envelope_reports_index() {
        let block = BlockBuilder::new(1)
            .envelope(endorser_envelope(b"a"))
            .raw_envelope(vec![1, 2, 3])
            .build();

        let codec = WireCodec::default();
        assert!(codec.decode_envelope(&block, 0).is_ok());
        assert_eq!(
            codec.decode_envelope(&block, 1).unwrap_err().envelope_index(),
            Some(1)
        );
    }

    #[test]
    fn test_nil_and_payloadless_envelopes() {
        let payloadless = Envelope {
            payload: Vec::new(),
            signature: b"sig".to_vec(),
        }
        .to_bytes()
        .unwrap();
        let block = BlockBuilder::new(1)
            .raw_envelope(Vec::new())
            .raw_envelope(payloadless)
            .build();

        let codec = WireCodec::default();
        match codec.decode_envelope(&block, 0) {
            Err(DecodeError::MalformedEnvelope { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("nil envelope"));
            }
            other => panic!("Expected MalformedEnvelope, got {:?}", other),
        }
        match codec.decode_envelope(&block, 1) {
            Err(DecodeError::MalformedEnvelope { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("no payload"));
            }
            other => panic!("Expected MalformedEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_endorser_body() {
        let payload = Payload {
            header: crate::protocol::Header {
                channel_header: ChannelHeader {
                    header_type: HeaderType::EndorserTransaction,
                    version: 0,
                    timestamp_millis: 0,
                    channel_id: "mychannel".to_string(),
                    tx_id: "tx".to_string(),
                    epoch: 0,
                },
                signature_header: SignatureHeader {
                    creator: Vec::new(),
                    nonce: Vec::new(),
                },
            },
            data: vec![0xff; 3],
        };
        let envelope = Envelope {
            payload: payload.to_bytes().unwrap(),
            signature: Vec::new(),
        }
        .to_bytes()
        .unwrap();
        let block = BlockBuilder::new(1).raw_envelope(envelope).build();

        match WireCodec::default().decode_envelope(&block, 0) {
            Err(DecodeError::MalformedEnvelope { reason, .. }) => {
                assert!(reason.contains("endorser transaction"))
            }
            other => panic!("Expected MalformedEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_size_limit() {
        let block = BlockBuilder::new(1)
            .envelope(endorser_envelope(b"n"))
            .build();
        let codec = WireCodec::new(DecoderConfig {
            max_envelope_size: 8,
            ..DecoderConfig::default()
        });
        match codec.decode_envelope(&block, 0) {
            Err(DecodeError::MalformedEnvelope { reason, .. }) => {
                assert!(reason.contains("too large"))
            }
            other => panic!("Expected MalformedEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_length_mismatch_rejected() {
        let mut block = BlockBuilder::new(1)
            .envelope(endorser_envelope(b"a"))
            .envelope(endorser_envelope(b"b"))
            .build();
        block.metadata.transactions_filter.pop();

        let bytes = block.to_bytes().unwrap();
        assert!(matches!(
            WireCodec::default().decode_block(&bytes),
            Err(DecodeError::MalformedBlock { .. })
        ));
    }
}
