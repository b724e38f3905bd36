//! # Vote Envelopes
//!
//! One envelope per registered voter per process. The nullifier is
//! SHA-256 over the voter address and process identifier, so the same
//! voter cannot vote twice in one process without colliding; the envelope
//! body is signed with the voter's ed25519 key.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use gig_core::hex::encode_hex;
use gig_core::Address;

/// A voter's signing identity: an on-chain address plus an ed25519 key
/// for the external voting system's envelope scheme.
pub struct VoterKey {
    address: Address,
    signing: SigningKey,
}

impl VoterKey {
    /// Generate a fresh envelope-signing key for a voter address.
    pub fn generate(address: Address) -> Self {
        Self {
            address,
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// The voter's on-chain address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The public half of the envelope-signing key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Seal a ballot for `process_id` with the given choice.
    pub fn seal(&self, process_id: &str, choice: u8) -> VoteEnvelope {
        let nullifier = nullifier(&self.address, process_id);
        let payload = envelope_payload(process_id, &nullifier, choice);
        let signature = self.signing.sign(&payload);
        VoteEnvelope {
            process_id: process_id.to_string(),
            voter: self.address.clone(),
            nullifier,
            choice,
            public_key: encode_hex(self.signing.verifying_key().as_bytes()),
            signature: encode_hex(&signature.to_bytes()),
        }
    }
}

/// The per-voter, per-process vote nullifier:
/// `0x` + hex(SHA-256(voter address bytes ‖ process id bytes)).
pub fn nullifier(voter: &Address, process_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voter.to_bytes());
    hasher.update(process_id.as_bytes());
    encode_hex(&hasher.finalize())
}

fn envelope_payload(process_id: &str, nullifier: &str, choice: u8) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(process_id.as_bytes());
    hasher.update(nullifier.as_bytes());
    hasher.update([choice]);
    hasher.finalize().to_vec()
}

/// A sealed, signed vote ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEnvelope {
    /// The voting process this ballot belongs to.
    pub process_id: String,
    /// The voter's on-chain address.
    pub voter: Address,
    /// Per-voter, per-process uniqueness token.
    pub nullifier: String,
    /// The selected option index.
    pub choice: u8,
    /// Hex-encoded ed25519 public key.
    pub public_key: String,
    /// Hex-encoded ed25519 signature over the envelope payload.
    pub signature: String,
}

impl VoteEnvelope {
    /// Verify the envelope's signature against its own public key.
    pub fn verify(&self) -> bool {
        let Ok(key_bytes) = gig_core::hex::decode_hex(&self.public_key) else {
            return false;
        };
        let key_bytes: [u8; 32] = match key_bytes.try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(sig_bytes) = gig_core::hex::decode_hex(&self.signature) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match sig_bytes.try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        let payload = envelope_payload(&self.process_id, &self.nullifier, self.choice);
        key.verify_strict(&payload, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: &str) -> Address {
        Address::new(format!("0x{last:0>40}")).unwrap()
    }

    #[test]
    fn nullifier_is_deterministic_per_voter_and_process() {
        let a = nullifier(&addr("1"), "proc-1");
        assert_eq!(a, nullifier(&addr("1"), "proc-1"));
        assert_ne!(a, nullifier(&addr("2"), "proc-1"));
        assert_ne!(a, nullifier(&addr("1"), "proc-2"));
        assert_eq!(a.len(), 2 + 64);
    }

    #[test]
    fn sealed_envelope_verifies() {
        let key = VoterKey::generate(addr("1"));
        let envelope = key.seal("proc-1", 0);
        assert!(envelope.verify());
        assert_eq!(envelope.nullifier, nullifier(&addr("1"), "proc-1"));
    }

    #[test]
    fn tampered_envelope_fails_verification() {
        let key = VoterKey::generate(addr("1"));
        let mut envelope = key.seal("proc-1", 0);
        envelope.choice = 1;
        assert!(!envelope.verify());
    }

    #[test]
    fn envelope_serde_roundtrip() {
        let key = VoterKey::generate(addr("1"));
        let envelope = key.seal("proc-1", 1);
        let json = serde_json::to_string(&envelope).unwrap();
        let back: VoteEnvelope = serde_json::from_str(&json).unwrap();
        assert!(back.verify());
    }
}
