//! In-memory voting gateway for tests and the local demo.
//!
//! Mimics the real gateway's observable behavior: a freshly created
//! process is invisible for a configurable number of polls, the block
//! height advances on each height query, and duplicate nullifiers are
//! rejected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::envelope::VoteEnvelope;
use crate::error::GatewayError;
use crate::gateway::{ProcessInfo, ProcessResults, ProcessSpec, VotingGateway};

struct ProcessRecord {
    info: ProcessInfo,
    option_count: u8,
    /// Remaining polls before the process becomes observable.
    hidden_for: u32,
    envelopes: HashMap<String, VoteEnvelope>,
}

/// Simulated gateway; cheap to share behind an `Arc`.
#[derive(Default)]
pub struct MemoryGateway {
    processes: Mutex<HashMap<String, ProcessRecord>>,
    height: AtomicU64,
    next_id: AtomicU64,
    visibility_delay: u32,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose processes stay invisible for the first
    /// `polls` observation attempts, to exercise the backoff path.
    pub fn with_visibility_delay(polls: u32) -> Self {
        Self {
            visibility_delay: polls,
            ..Self::default()
        }
    }

    /// Number of envelopes recorded for a process.
    pub fn envelope_count(&self, process_id: &str) -> usize {
        self.processes
            .lock()
            .get(process_id)
            .map(|p| p.envelopes.len())
            .unwrap_or(0)
    }
}

impl VotingGateway for MemoryGateway {
    async fn create_process(&self, spec: &ProcessSpec) -> Result<String, GatewayError> {
        let id = format!("proc-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let height = self.height.load(Ordering::Relaxed);
        let info = ProcessInfo {
            id: id.clone(),
            start_block: height + 2,
            end_block: height + 2 + spec.duration_blocks,
        };
        self.processes.lock().insert(
            id.clone(),
            ProcessRecord {
                info,
                option_count: spec.option_count,
                hidden_for: self.visibility_delay,
                envelopes: HashMap::new(),
            },
        );
        Ok(id)
    }

    async fn process(&self, id: &str) -> Result<Option<ProcessInfo>, GatewayError> {
        let mut processes = self.processes.lock();
        let Some(record) = processes.get_mut(id) else {
            return Ok(None);
        };
        if record.hidden_for > 0 {
            record.hidden_for -= 1;
            return Ok(None);
        }
        Ok(Some(record.info.clone()))
    }

    async fn block_height(&self) -> Result<u64, GatewayError> {
        // Advances on every query, like a chain mining underneath.
        Ok(self.height.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn submit_envelope(&self, envelope: &VoteEnvelope) -> Result<(), GatewayError> {
        if !envelope.verify() {
            return Err(GatewayError::Rejected {
                operation: "submit_envelope",
                reason: "invalid signature".to_string(),
            });
        }
        let mut processes = self.processes.lock();
        let record = processes
            .get_mut(&envelope.process_id)
            .ok_or_else(|| GatewayError::Rejected {
                operation: "submit_envelope",
                reason: format!("unknown process {}", envelope.process_id),
            })?;
        if envelope.choice >= record.option_count {
            return Err(GatewayError::Rejected {
                operation: "submit_envelope",
                reason: format!("choice {} out of range", envelope.choice),
            });
        }
        if record.envelopes.contains_key(&envelope.nullifier) {
            return Err(GatewayError::Rejected {
                operation: "submit_envelope",
                reason: format!("duplicate nullifier {}", envelope.nullifier),
            });
        }
        record
            .envelopes
            .insert(envelope.nullifier.clone(), envelope.clone());
        Ok(())
    }

    async fn envelope_registered(
        &self,
        process_id: &str,
        nullifier: &str,
    ) -> Result<bool, GatewayError> {
        Ok(self
            .processes
            .lock()
            .get(process_id)
            .map(|p| p.envelopes.contains_key(nullifier))
            .unwrap_or(false))
    }

    async fn results(&self, id: &str) -> Result<ProcessResults, GatewayError> {
        let processes = self.processes.lock();
        let record = processes.get(id).ok_or_else(|| GatewayError::Rejected {
            operation: "results",
            reason: format!("unknown process {id}"),
        })?;
        let mut tallies = vec![0u64; usize::from(record.option_count)];
        for envelope in record.envelopes.values() {
            if let Some(slot) = tallies.get_mut(usize::from(envelope.choice)) {
                *slot += 1;
            }
        }
        Ok(ProcessResults { tallies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::VoterKey;
    use gig_core::Address;

    fn spec() -> ProcessSpec {
        ProcessSpec {
            subject: Address::new(format!("0x{}", "9".repeat(40))).unwrap(),
            duration_blocks: 10,
            option_count: 2,
        }
    }

    #[tokio::test]
    async fn process_becomes_visible_after_delay() {
        let gateway = MemoryGateway::with_visibility_delay(2);
        let id = gateway.create_process(&spec()).await.unwrap();
        assert!(gateway.process(&id).await.unwrap().is_none());
        assert!(gateway.process(&id).await.unwrap().is_none());
        assert!(gateway.process(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_nullifier_is_rejected() {
        let gateway = MemoryGateway::new();
        let id = gateway.create_process(&spec()).await.unwrap();
        let key = VoterKey::generate(Address::new(format!("0x{}", "1".repeat(40))).unwrap());
        gateway.submit_envelope(&key.seal(&id, 0)).await.unwrap();
        let err = gateway.submit_envelope(&key.seal(&id, 1)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
        assert_eq!(gateway.envelope_count(&id), 1);
    }

    #[tokio::test]
    async fn results_tally_choices() {
        let gateway = MemoryGateway::new();
        let id = gateway.create_process(&spec()).await.unwrap();
        for i in 0..5u64 {
            let key = VoterKey::generate(
                Address::new(format!("0x{i:040x}")).unwrap(),
            );
            let choice = u8::from(i >= 2);
            gateway.submit_envelope(&key.seal(&id, choice)).await.unwrap();
        }
        let results = gateway.results(&id).await.unwrap();
        assert_eq!(results.tallies, vec![2, 3]);
    }
}
