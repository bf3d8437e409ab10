//! # Secret Scalars
//!
//! `SecretScalar` owns every secret field element in the workspace: the
//! holder's trapdoor, issuer key components, and the blinding factors of a
//! proof in progress. It is neither `Clone` nor `Copy`, has no `Serialize`
//! impl, prints as `<redacted>`, and overwrites its value on drop.

use std::fmt;

use bls12_381::Scalar;
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::group::{sample_nonzero_scalar, sample_scalar};

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar(Scalar);

impl SecretScalar {
    /// Take ownership of a scalar. The caller's copy is not zeroized;
    /// construct from a temporary.
    pub fn new(value: Scalar) -> Self {
        Self(value)
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(sample_scalar(rng))
    }

    pub fn random_nonzero<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(sample_nonzero_scalar(rng))
    }

    /// Borrow the secret value for arithmetic.
    pub fn expose(&self) -> &Scalar {
        &self.0
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretScalar(<redacted>)")
    }
}
