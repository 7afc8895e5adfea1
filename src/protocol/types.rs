/// Wire types for blocks and transaction envelopes
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub previous_hash: Sha256Hash,
    pub data_hash: Sha256Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    #[serde(with = "serde_bytes")]
    pub signatures: Vec<u8>,
    pub last_config: u64,
    /// One validation code per envelope, in envelope order
    #[serde(with = "serde_bytes")]
    pub transactions_filter: Vec<u8>,
}

/// A block: a header plus an ordered sequence of opaque envelope byte strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub data: Vec<ByteBuf>,
    pub metadata: BlockMetadata,
}

impl Block {
    pub fn envelope_count(&self) -> usize {
        self.data.len()
    }

    pub fn envelope_bytes(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index).map(|b| b.as_slice())
    }

    pub fn calculate_data_hash(envelopes: &[ByteBuf]) -> Sha256Hash {
        let mut hasher = Sha256::new();
        for envelope in envelopes {
            hasher.update(envelope.as_slice());
        }
        hasher.finalize().into()
    }

    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.header.number.to_le_bytes());
        hasher.update(self.header.previous_hash);
        hasher.update(self.header.data_hash);
        hasher.finalize().into()
    }

    pub fn validation_code(&self, index: usize) -> TxValidationCode {
        self.metadata
            .transactions_filter
            .get(index)
            .map(|code| TxValidationCode::from_u8(*code))
            .unwrap_or(TxValidationCode::NotValidated)
    }
}

/// A signed transaction envelope. `payload` holds an encoded [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderType {
    Message,
    Config,
    ConfigUpdate,
    EndorserTransaction,
    OrdererTransaction,
    DeliverSeekInfo,
    ChaincodePackage,
}

impl HeaderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderType::Message => "MESSAGE",
            HeaderType::Config => "CONFIG",
            HeaderType::ConfigUpdate => "CONFIG_UPDATE",
            HeaderType::EndorserTransaction => "ENDORSER_TRANSACTION",
            HeaderType::OrdererTransaction => "ORDERER_TRANSACTION",
            HeaderType::DeliverSeekInfo => "DELIVER_SEEK_INFO",
            HeaderType::ChaincodePackage => "CHAINCODE_PACKAGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub header_type: HeaderType,
    pub version: i32,
    pub timestamp_millis: i64,
    pub channel_id: String,
    pub tx_id: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    #[serde(with = "serde_bytes")]
    pub creator: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub channel_header: ChannelHeader,
    pub signature_header: SignatureHeader,
}

/// Envelope payload. For endorser transactions `data` holds an encoded [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub header: Header,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// One action of an endorser transaction. Contents are opaque at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    #[serde(with = "serde_bytes")]
    pub header: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub actions: Vec<TransactionAction>,
}

/// A validation byte with no named code. Only [`TxValidationCode::from_u8`] builds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCode(u8);

impl UnknownCode {
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Committer's verdict on one transaction, as recorded in the block metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxValidationCode {
    Valid,
    NilEnvelope,
    BadPayload,
    BadCommonHeader,
    BadCreatorSignature,
    InvalidEndorserTransaction,
    InvalidConfigTransaction,
    UnsupportedTxPayload,
    BadProposalTxId,
    DuplicateTxId,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    UnknownTxType,
    TargetChainNotFound,
    MarshalTxError,
    NilTxAction,
    ExpiredChaincode,
    ChaincodeVersionConflict,
    BadHeaderExtension,
    BadChannelHeader,
    BadResponsePayload,
    BadRwset,
    IllegalWriteset,
    InvalidWriteset,
    NotValidated,
    InvalidOtherReason,
    Unknown(UnknownCode),
}

impl TxValidationCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => TxValidationCode::Valid,
            1 => TxValidationCode::NilEnvelope,
            2 => TxValidationCode::BadPayload,
            3 => TxValidationCode::BadCommonHeader,
            4 => TxValidationCode::BadCreatorSignature,
            5 => TxValidationCode::InvalidEndorserTransaction,
            6 => TxValidationCode::InvalidConfigTransaction,
            7 => TxValidationCode::UnsupportedTxPayload,
            8 => TxValidationCode::BadProposalTxId,
            9 => TxValidationCode::DuplicateTxId,
            10 => TxValidationCode::EndorsementPolicyFailure,
            11 => TxValidationCode::MvccReadConflict,
            12 => TxValidationCode::PhantomReadConflict,
            13 => TxValidationCode::UnknownTxType,
            14 => TxValidationCode::TargetChainNotFound,
            15 => TxValidationCode::MarshalTxError,
            16 => TxValidationCode::NilTxAction,
            17 => TxValidationCode::ExpiredChaincode,
            18 => TxValidationCode::ChaincodeVersionConflict,
            19 => TxValidationCode::BadHeaderExtension,
            20 => TxValidationCode::BadChannelHeader,
            21 => TxValidationCode::BadResponsePayload,
            22 => TxValidationCode::BadRwset,
            23 => TxValidationCode::IllegalWriteset,
            24 => TxValidationCode::InvalidWriteset,
            254 => TxValidationCode::NotValidated,
            255 => TxValidationCode::InvalidOtherReason,
            other => TxValidationCode::Unknown(UnknownCode(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            TxValidationCode::Valid => 0,
            TxValidationCode::NilEnvelope => 1,
            TxValidationCode::BadPayload => 2,
            TxValidationCode::BadCommonHeader => 3,
            TxValidationCode::BadCreatorSignature => 4,
            TxValidationCode::InvalidEndorserTransaction => 5,
            TxValidationCode::InvalidConfigTransaction => 6,
            TxValidationCode::UnsupportedTxPayload => 7,
            TxValidationCode::BadProposalTxId => 8,
            TxValidationCode::DuplicateTxId => 9,
            TxValidationCode::EndorsementPolicyFailure => 10,
            TxValidationCode::MvccReadConflict => 11,
            TxValidationCode::PhantomReadConflict => 12,
            TxValidationCode::UnknownTxType => 13,
            TxValidationCode::TargetChainNotFound => 14,
            TxValidationCode::MarshalTxError => 15,
            TxValidationCode::NilTxAction => 16,
            TxValidationCode::ExpiredChaincode => 17,
            TxValidationCode::ChaincodeVersionConflict => 18,
            TxValidationCode::BadHeaderExtension => 19,
            TxValidationCode::BadChannelHeader => 20,
            TxValidationCode::BadResponsePayload => 21,
            TxValidationCode::BadRwset => 22,
            TxValidationCode::IllegalWriteset => 23,
            TxValidationCode::InvalidWriteset => 24,
            TxValidationCode::NotValidated => 254,
            TxValidationCode::InvalidOtherReason => 255,
            TxValidationCode::Unknown(code) => code.value(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TxValidationCode::Valid)
    }
}

/// Transaction id as producers derive it: hex SHA-256 of nonce followed by creator
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}
