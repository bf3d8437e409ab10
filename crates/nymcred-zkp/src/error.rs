use nymcred_core::EncodingError;
use nymcred_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZkpError {
    /// The recomputed Fiat–Shamir challenge differs from the one carried.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The challenge matched but a verification equation does not hold.
    #[error("verification failure: {0}")]
    VerificationFailure(String),

    /// The proof is structurally inconsistent with its statement.
    #[error("malformed proof: {0}")]
    Malformed(String),

    /// The prover's witness does not satisfy the statement.
    #[error("invalid witness: {0}")]
    InvalidWitness(String),

    #[error("malformed encoding: {0}")]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
