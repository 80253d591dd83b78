//! Trait interfaces shared across crates.
//!
//! - [`Signer`]: signing capability attached to an account. Key storage
//!   and derivation stay behind this seam; the wallet only asks for a
//!   signature over a transaction digest.

use crate::address::Address;
use crate::crypto::Signature;
use crate::types::Hash;

/// Signs transaction digests on behalf of one address.
///
/// Implemented by [`KeyPair`](crate::crypto::KeyPair). Hardware or remote
/// signers implement it directly.
pub trait Signer: Send + Sync {
    /// Address whose outputs this signer can spend.
    fn address(&self) -> Address;

    /// Sign a transaction digest.
    fn sign(&self, digest: &Hash) -> Signature;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyPair, verify};
    use std::sync::Arc;

    struct FixedSigner {
        inner: KeyPair,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl Signer for FixedSigner {
        fn address(&self) -> Address {
            self.inner.address()
        }

        fn sign(&self, digest: &Hash) -> Signature {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.sign_bytes(digest.as_bytes())
        }
    }

    #[test]
    fn signer_is_object_safe() {
        let signer: Arc<dyn Signer> = Arc::new(KeyPair::from_secret_bytes([5; 32]));
        let digest = Hash::digest(b"tx");
        let sig = signer.sign(&digest);
        assert!(verify(&signer.address(), digest.as_bytes(), &sig).is_ok());
    }

    #[test]
    fn custom_signer_counts_calls() {
        let signer = FixedSigner {
            inner: KeyPair::from_secret_bytes([6; 32]),
            calls: Default::default(),
        };
        let digest = Hash::digest(b"tx");
        signer.sign(&digest);
        signer.sign(&digest);
        assert_eq!(signer.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
