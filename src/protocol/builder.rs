/// Builders producing well-formed wire encodings for producers and tests
use crate::error::EncodeError;
use crate::protocol::types::{
    compute_tx_id, Block, BlockHeader, BlockMetadata, ChannelHeader, Envelope, Header,
    HeaderType, Payload, SignatureHeader, Sha256Hash, Transaction, TransactionAction,
    TxValidationCode,
};
use serde_bytes::ByteBuf;

#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    header_type: HeaderType,
    channel_id: String,
    version: i32,
    timestamp_millis: i64,
    epoch: u64,
    tx_id: Option<String>,
    creator: Vec<u8>,
    nonce: Vec<u8>,
    actions: Vec<TransactionAction>,
    data: Vec<u8>,
    signature: Vec<u8>,
}

impl EnvelopeBuilder {
    pub fn new(header_type: HeaderType, channel_id: impl Into<String>) -> Self {
        EnvelopeBuilder {
            header_type,
            channel_id: channel_id.into(),
            version: 0,
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
            epoch: 0,
            tx_id: None,
            creator: Vec::new(),
            nonce: Vec::new(),
            actions: Vec::new(),
            data: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn endorser_transaction(channel_id: impl Into<String>) -> Self {
        Self::new(HeaderType::EndorserTransaction, channel_id)
    }

    pub fn creator(mut self, creator: Vec<u8>) -> Self {
        self.creator = creator;
        self
    }

    pub fn nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Overrides the id otherwise derived from nonce and creator
    pub fn tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    pub fn timestamp_millis(mut self, timestamp_millis: i64) -> Self {
        self.timestamp_millis = timestamp_millis;
        self
    }

    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn action(mut self, header: Vec<u8>, payload: Vec<u8>) -> Self {
        self.actions.push(TransactionAction { header, payload });
        self
    }

    /// Raw payload data for non-endorser envelopes. Ignored for endorser transactions.
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    pub fn resolved_tx_id(&self) -> String {
        self.tx_id
            .clone()
            .unwrap_or_else(|| compute_tx_id(&self.nonce, &self.creator))
    }

    pub fn build_envelope(&self) -> Result<Envelope, EncodeError> {
        let data = match self.header_type {
            HeaderType::EndorserTransaction => Transaction {
                actions: self.actions.clone(),
            }
            .to_bytes()?,
            _ => self.data.clone(),
        };

        let payload = Payload {
            header: Header {
                channel_header: ChannelHeader {
                    header_type: self.header_type,
                    version: self.version,
                    timestamp_millis: self.timestamp_millis,
                    channel_id: self.channel_id.clone(),
                    tx_id: self.resolved_tx_id(),
                    epoch: self.epoch,
                },
                signature_header: SignatureHeader {
                    creator: self.creator.clone(),
                    nonce: self.nonce.clone(),
                },
            },
            data,
        };

        Ok(Envelope {
            payload: payload.to_bytes()?,
            signature: self.signature.clone(),
        })
    }

    pub fn build(&self) -> Result<Vec<u8>, EncodeError> {
        self.build_envelope()?.to_bytes()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    number: u64,
    previous_hash: Sha256Hash,
    envelopes: Vec<ByteBuf>,
    validation_codes: Vec<u8>,
    last_config: u64,
    signatures: Vec<u8>,
}

impl BlockBuilder {
    pub fn new(number: u64) -> Self {
        BlockBuilder {
            number,
            ..Default::default()
        }
    }

    pub fn previous_hash(mut self, previous_hash: Sha256Hash) -> Self {
        self.previous_hash = previous_hash;
        self
    }

    pub fn last_config(mut self, last_config: u64) -> Self {
        self.last_config = last_config;
        self
    }

    pub fn signatures(mut self, signatures: Vec<u8>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn envelope(self, bytes: Vec<u8>) -> Self {
        self.envelope_with_code(bytes, TxValidationCode::Valid)
    }

    pub fn envelope_with_code(mut self, bytes: Vec<u8>, code: TxValidationCode) -> Self {
        self.envelopes.push(ByteBuf::from(bytes));
        self.validation_codes.push(code.as_u8());
        self
    }

    /// Appends bytes as-is. Used for envelopes that are not meant to decode.
    pub fn raw_envelope(self, bytes: Vec<u8>) -> Self {
        self.envelope_with_code(bytes, TxValidationCode::InvalidOtherReason)
    }

    pub fn build(self) -> Block {
        let data_hash = Block::calculate_data_hash(&self.envelopes);
        Block {
            header: BlockHeader {
                number: self.number,
                previous_hash: self.previous_hash,
                data_hash,
            },
            data: self.envelopes,
            metadata: BlockMetadata {
                signatures: self.signatures,
                last_config: self.last_config,
                transactions_filter: self.validation_codes,
            },
        }
    }

    pub fn build_bytes(self) -> Result<Vec<u8>, EncodeError> {
        self.build().to_bytes()
    }
}
