//! Simulated chain state and call execution.
//!
//! The world models exactly the contract surface the orchestrator drives:
//! an ERC-20 settlement token, a market factory with 1-based creation
//! indices, markets that create relationships, escrows with hold/release,
//! and a dispute factory. Reverts carry the same short reason strings a
//! contract would, so the connector's revert-reason recovery sees
//! realistic behavior.

use std::collections::HashMap;

use gig_core::hex::{decode_hex, encode_hex};
use gig_core::{Address, RelationshipState};
use gig_registry::abi::{self, address_word, uint_word, AbiType, AbiValue};
use gig_workflow::interfaces::{
    SEL_ALLOWANCE, SEL_APPROVE, SEL_ASSIGN_WORKER, SEL_BALANCE_OF, SEL_CONTRACT_STATUS,
    SEL_CREATE_DEADLINE, SEL_CREATE_DISPUTE, SEL_CREATE_FLAT_RATE, SEL_CREATE_MARKET,
    SEL_CREATE_MILESTONE, SEL_FUND, SEL_HELD_AMOUNT, SEL_MINT, SEL_RESOLVE, SEL_RESOLVE_DISPUTE,
    SEL_SUBMIT_WORK, SEL_TASK_SOLUTION_POINTER, SEL_TRANSFER, SEL_TRANSFER_FROM, SEL_WORKER,
    TOPIC_APPROVAL, TOPIC_DISPUTE_CREATED, TOPIC_MARKET_CREATED, TOPIC_RELATIONSHIP_CREATED,
    TOPIC_TRANSFER,
};

/// A log record produced by a simulated transaction.
#[derive(Debug, Clone)]
pub(crate) struct LogRecord {
    pub address: Address,
    pub topics: Vec<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Market {
    next_relationship_index: u64,
}

#[derive(Debug, Clone)]
struct Relationship {
    escrow: Address,
    employer: Address,
    worker: Option<Address>,
    solution_ptr: String,
    state: RelationshipState,
}

#[derive(Debug, Clone, Default)]
struct Escrow {
    relationship: Option<Address>,
    depositor: Option<Address>,
    held: u128,
}

#[derive(Debug, Clone)]
struct Dispute {
    relationship: Address,
}

#[derive(Debug, Clone)]
pub(crate) struct World {
    accounts: Vec<Address>,
    token: Address,
    market_maker: Address,
    dispute_factory: Address,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    markets: HashMap<Address, Market>,
    next_market_index: u64,
    relationships: HashMap<Address, Relationship>,
    escrows: HashMap<Address, Escrow>,
    disputes: HashMap<Address, Dispute>,
    pub block: u64,
    next_contract: u64,
    pub next_tx: u64,
    pub receipts: HashMap<String, serde_json::Value>,
}

fn contract_address(counter: u64) -> Address {
    Address::new(format!("0x{:040x}", 0xc0de_0000u64 + counter))
        .expect("stub contract addresses are well-formed")
}

fn account_address(index: u64) -> Address {
    Address::new(format!("0x{:040x}", 0xacc0_0000u64 + index))
        .expect("stub account addresses are well-formed")
}

fn sel(hex: &str) -> [u8; 4] {
    let bytes = decode_hex(hex).expect("selector constants are valid hex");
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes);
    out
}

impl World {
    pub fn new(account_count: usize) -> Self {
        let accounts = (0..account_count as u64).map(account_address).collect();
        Self {
            accounts,
            token: contract_address(1),
            market_maker: contract_address(2),
            dispute_factory: contract_address(3),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            markets: HashMap::new(),
            next_market_index: 1,
            relationships: HashMap::new(),
            escrows: HashMap::new(),
            disputes: HashMap::new(),
            block: 0,
            next_contract: 16,
            next_tx: 1,
            receipts: HashMap::new(),
        }
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn token(&self) -> &Address {
        &self.token
    }

    pub fn market_maker(&self) -> &Address {
        &self.market_maker
    }

    pub fn dispute_factory(&self) -> &Address {
        &self.dispute_factory
    }

    pub fn allocate_escrow(&mut self) -> Address {
        self.next_contract += 1;
        let address = contract_address(self.next_contract);
        self.escrows.insert(address.clone(), Escrow::default());
        address
    }

    fn fresh_contract(&mut self) -> Address {
        self.next_contract += 1;
        contract_address(self.next_contract)
    }

    /// Execute a read-only call. Mutating selectors are rejected here;
    /// the RPC layer simulates them on a clone instead.
    pub fn view(&self, to: &Address, data: &[u8]) -> Option<Result<Vec<u8>, String>> {
        let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
        let args = &data[4..];

        if *to == self.token {
            if selector == sel(SEL_BALANCE_OF) {
                return Some(self.decode_then(args, &[AbiType::Address], |w, v| {
                    let account = v[0].as_address().cloned().unwrap_or_else(|| account_address(0));
                    Ok(uint_word(w.balance(&account)).to_vec())
                }));
            }
            if selector == sel(SEL_ALLOWANCE) {
                return Some(self.decode_then(
                    args,
                    &[AbiType::Address, AbiType::Address],
                    |w, v| {
                        let owner = v[0].as_address().cloned();
                        let spender = v[1].as_address().cloned();
                        let (Some(owner), Some(spender)) = (owner, spender) else {
                            return Err("BAD_ARGS".to_string());
                        };
                        Ok(uint_word(w.allowance(&owner, &spender)).to_vec())
                    },
                ));
            }
        }

        if let Some(relationship) = self.relationships.get(to) {
            if selector == sel(SEL_CONTRACT_STATUS) {
                return Some(Ok(uint_word(u128::from(relationship.state.status_word())).to_vec()));
            }
            if selector == sel(SEL_WORKER) {
                // Unassigned reads back as the zero address.
                let word = relationship
                    .worker
                    .as_ref()
                    .map(address_word)
                    .unwrap_or([0u8; 32]);
                return Some(Ok(word.to_vec()));
            }
            if selector == sel(SEL_TASK_SOLUTION_POINTER) {
                let encoded = abi::encode(
                    &[AbiType::String],
                    &[AbiValue::String(relationship.solution_ptr.clone())],
                )
                .map_err(|e| e.to_string());
                return Some(encoded);
            }
        }

        if let Some(escrow) = self.escrows.get(to) {
            if selector == sel(SEL_HELD_AMOUNT) {
                return Some(Ok(uint_word(escrow.held).to_vec()));
            }
        }

        None
    }

    fn decode_then(
        &self,
        args: &[u8],
        types: &[AbiType],
        f: impl FnOnce(&Self, Vec<AbiValue>) -> Result<Vec<u8>, String>,
    ) -> Result<Vec<u8>, String> {
        let values = abi::decode(types, args).map_err(|e| e.to_string())?;
        f(self, values)
    }

    fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Execute a state-changing call. `Err` is a revert reason.
    pub fn execute(
        &mut self,
        from: &Address,
        to: &Address,
        data: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| "UNKNOWN_FUNCTION".to_string())?;
        let args = &data[4..];

        if *to == self.token {
            return self.execute_token(from, selector, args);
        }
        if *to == self.market_maker {
            return self.execute_market_maker(from, selector, args);
        }
        if *to == self.dispute_factory {
            return self.execute_dispute_factory(from, selector, args);
        }
        if self.markets.contains_key(to) {
            return self.execute_market(from, to.clone(), selector, args);
        }
        if self.relationships.contains_key(to) {
            return self.execute_relationship(from, to.clone(), selector, args);
        }
        if self.escrows.contains_key(to) {
            return self.execute_escrow(from, to.clone(), selector, args);
        }
        if self.disputes.contains_key(to) {
            return self.execute_dispute(from, to.clone(), selector, args);
        }
        Err("UNKNOWN_CONTRACT".to_string())
    }

    fn execute_token(
        &mut self,
        from: &Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector == sel(SEL_APPROVE) {
            let v = decode_args(args, &[AbiType::Address, AbiType::Uint])?;
            let spender = arg_address(&v, 0)?;
            let amount = arg_uint(&v, 1)?;
            self.allowances.insert((from.clone(), spender.clone()), amount);
            return Ok(vec![self.approval_log(from, &spender, amount)]);
        }
        if selector == sel(SEL_TRANSFER) {
            let v = decode_args(args, &[AbiType::Address, AbiType::Uint])?;
            let recipient = arg_address(&v, 0)?;
            let amount = arg_uint(&v, 1)?;
            self.move_tokens(&from.clone(), &recipient, amount)?;
            return Ok(vec![self.transfer_log(from, &recipient, amount)]);
        }
        if selector == sel(SEL_TRANSFER_FROM) {
            let v = decode_args(args, &[AbiType::Address, AbiType::Address, AbiType::Uint])?;
            let owner = arg_address(&v, 0)?;
            let recipient = arg_address(&v, 1)?;
            let amount = arg_uint(&v, 2)?;
            self.spend_allowance(&owner, from, amount)?;
            self.move_tokens(&owner, &recipient, amount)?;
            return Ok(vec![self.transfer_log(&owner, &recipient, amount)]);
        }
        if selector == sel(SEL_MINT) {
            // Development token: anyone can mint.
            let v = decode_args(args, &[AbiType::Address, AbiType::Uint])?;
            let recipient = arg_address(&v, 0)?;
            let amount = arg_uint(&v, 1)?;
            *self.balances.entry(recipient.clone()).or_insert(0) += amount;
            return Ok(vec![self.transfer_log(&self.token.clone(), &recipient, amount)]);
        }
        Err("UNKNOWN_FUNCTION".to_string())
    }

    fn execute_market_maker(
        &mut self,
        from: &Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector != sel(SEL_CREATE_MARKET) {
            return Err("UNKNOWN_FUNCTION".to_string());
        }
        let v = decode_args(args, &[AbiType::String])?;
        let name = arg_string(&v, 0)?;
        let market = self.fresh_contract();
        let index = self.next_market_index;
        self.next_market_index += 1;
        self.markets.insert(
            market.clone(),
            Market {
                next_relationship_index: 1,
            },
        );
        let data = abi::encode(
            &[AbiType::Address, AbiType::String],
            &[AbiValue::Address(from.clone()), AbiValue::String(name)],
        )
        .map_err(|e| e.to_string())?;
        Ok(vec![LogRecord {
            address: self.market_maker.clone(),
            topics: vec![
                TOPIC_MARKET_CREATED.to_string(),
                encode_hex(&address_word(&market)),
                encode_hex(&uint_word(u128::from(index))),
            ],
            data,
        }])
    }

    fn execute_market(
        &mut self,
        from: &Address,
        market: Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        let known = [
            sel(SEL_CREATE_FLAT_RATE),
            sel(SEL_CREATE_MILESTONE),
            sel(SEL_CREATE_DEADLINE),
        ];
        if !known.contains(&selector) {
            return Err("UNKNOWN_FUNCTION".to_string());
        }
        let v = decode_args(args, &[AbiType::Address, AbiType::String, AbiType::Uint])?;
        let escrow = arg_address(&v, 0)?;

        let relationship = self.fresh_contract();
        let entry = self
            .markets
            .get_mut(&market)
            .ok_or_else(|| "UNKNOWN_CONTRACT".to_string())?;
        let index = entry.next_relationship_index;
        entry.next_relationship_index += 1;

        self.relationships.insert(
            relationship.clone(),
            Relationship {
                escrow: escrow.clone(),
                employer: from.clone(),
                worker: None,
                solution_ptr: String::new(),
                state: RelationshipState::Proposed,
            },
        );
        let bound = self.escrows.entry(escrow).or_default();
        bound.relationship = Some(relationship.clone());

        Ok(vec![LogRecord {
            address: market,
            topics: vec![
                TOPIC_RELATIONSHIP_CREATED.to_string(),
                encode_hex(&address_word(&relationship)),
                encode_hex(&uint_word(u128::from(index))),
            ],
            data: abi::encode(&[AbiType::Address], &[AbiValue::Address(from.clone())])
                .map_err(|e| e.to_string())?,
        }])
    }

    fn execute_relationship(
        &mut self,
        from: &Address,
        address: Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector == sel(SEL_ASSIGN_WORKER) {
            let v = decode_args(args, &[AbiType::Address, AbiType::Uint, AbiType::String])?;
            let worker = arg_address(&v, 0)?;
            let r = self.relationship_mut(&address)?;
            if r.employer != *from {
                return Err("NOT_EMPLOYER".to_string());
            }
            if !matches!(
                r.state,
                RelationshipState::Proposed | RelationshipState::Funded
            ) {
                return Err("INVALID_STATE".to_string());
            }
            r.worker = Some(worker);
            r.state = RelationshipState::Assigned;
            return Ok(Vec::new());
        }
        if selector == sel(SEL_SUBMIT_WORK) {
            let v = decode_args(args, &[AbiType::String])?;
            let ptr = arg_string(&v, 0)?;
            let r = self.relationship_mut(&address)?;
            if r.worker.as_ref() != Some(from) {
                return Err("NOT_WORKER".to_string());
            }
            if r.state != RelationshipState::Assigned {
                return Err("INVALID_STATE".to_string());
            }
            r.solution_ptr = ptr;
            r.state = RelationshipState::Submitted;
            return Ok(Vec::new());
        }
        if selector == sel(SEL_RESOLVE) {
            let r = self.relationship_mut(&address)?;
            if r.employer != *from {
                return Err("NOT_EMPLOYER".to_string());
            }
            if r.state != RelationshipState::Submitted {
                return Err("INVALID_STATE".to_string());
            }
            r.state = RelationshipState::Resolved;
            let escrow = r.escrow.clone();
            let worker = r.worker.clone().ok_or_else(|| "NO_WORKER".to_string())?;
            return self.release_escrow(&escrow, &worker);
        }
        Err("UNKNOWN_FUNCTION".to_string())
    }

    fn execute_escrow(
        &mut self,
        from: &Address,
        address: Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector != sel(SEL_FUND) {
            return Err("UNKNOWN_FUNCTION".to_string());
        }
        let v = decode_args(args, &[AbiType::Uint])?;
        let amount = arg_uint(&v, 0)?;

        let relationship = self
            .escrows
            .get(&address)
            .and_then(|e| e.relationship.clone())
            .ok_or_else(|| "UNBOUND_ESCROW".to_string())?;
        {
            let r = self.relationship_mut(&relationship)?;
            if r.state != RelationshipState::Proposed {
                return Err("INVALID_STATE".to_string());
            }
        }

        self.spend_allowance(&from.clone(), &address, amount)?;
        self.move_tokens(&from.clone(), &address, amount)?;

        let escrow = self
            .escrows
            .get_mut(&address)
            .ok_or_else(|| "UNKNOWN_CONTRACT".to_string())?;
        escrow.held += amount;
        escrow.depositor = Some(from.clone());
        self.relationship_mut(&relationship)?.state = RelationshipState::Funded;

        Ok(vec![self.transfer_log(from, &address, amount)])
    }

    fn execute_dispute_factory(
        &mut self,
        _from: &Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector != sel(SEL_CREATE_DISPUTE) {
            return Err("UNKNOWN_FUNCTION".to_string());
        }
        let v = decode_args(args, &[AbiType::Address, AbiType::String, AbiType::String])?;
        let relationship = arg_address(&v, 0)?;
        {
            let r = self.relationship_mut(&relationship)?;
            if !matches!(
                r.state,
                RelationshipState::Assigned | RelationshipState::Submitted
            ) {
                return Err("INVALID_STATE".to_string());
            }
            r.state = RelationshipState::Disputed;
        }
        let dispute = self.fresh_contract();
        self.disputes.insert(
            dispute.clone(),
            Dispute {
                relationship: relationship.clone(),
            },
        );
        Ok(vec![LogRecord {
            address: self.dispute_factory.clone(),
            topics: vec![
                TOPIC_DISPUTE_CREATED.to_string(),
                encode_hex(&address_word(&dispute)),
                encode_hex(&uint_word(u128::from(self.disputes.len() as u64))),
            ],
            data: abi::encode(&[AbiType::Address], &[AbiValue::Address(relationship)])
                .map_err(|e| e.to_string())?,
        }])
    }

    fn execute_dispute(
        &mut self,
        _from: &Address,
        address: Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<LogRecord>, String> {
        if selector != sel(SEL_RESOLVE_DISPUTE) {
            return Err("UNKNOWN_FUNCTION".to_string());
        }
        let v = decode_args(args, &[AbiType::Bool])?;
        let release_to_worker = v
            .first()
            .and_then(|x| x.as_bool())
            .ok_or_else(|| "BAD_ARGS".to_string())?;

        let relationship = self
            .disputes
            .get(&address)
            .map(|d| d.relationship.clone())
            .ok_or_else(|| "UNKNOWN_CONTRACT".to_string())?;
        let (escrow, worker, depositor) = {
            let r = self.relationship_mut(&relationship)?;
            if r.state != RelationshipState::Disputed {
                return Err("INVALID_STATE".to_string());
            }
            r.state = RelationshipState::Arbitrated;
            let escrow = r.escrow.clone();
            let worker = r.worker.clone();
            let depositor = self
                .escrows
                .get(&escrow)
                .and_then(|e| e.depositor.clone());
            (escrow, worker, depositor)
        };

        let beneficiary = if release_to_worker {
            worker.ok_or_else(|| "NO_WORKER".to_string())?
        } else {
            depositor.ok_or_else(|| "NO_DEPOSITOR".to_string())?
        };
        self.release_escrow(&escrow, &beneficiary)
    }

    fn release_escrow(
        &mut self,
        escrow: &Address,
        beneficiary: &Address,
    ) -> Result<Vec<LogRecord>, String> {
        let held = {
            let e = self
                .escrows
                .get_mut(escrow)
                .ok_or_else(|| "UNKNOWN_CONTRACT".to_string())?;
            let held = e.held;
            e.held = 0;
            held
        };
        if held > 0 {
            self.move_tokens(escrow, beneficiary, held)?;
        }
        Ok(vec![self.transfer_log(escrow, beneficiary, held)])
    }

    fn relationship_mut(&mut self, address: &Address) -> Result<&mut Relationship, String> {
        self.relationships
            .get_mut(address)
            .ok_or_else(|| "UNKNOWN_CONTRACT".to_string())
    }

    fn move_tokens(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), String> {
        let balance = self.balance(from);
        if balance < amount {
            return Err("INSUFFICIENT_BALANCE".to_string());
        }
        self.balances.insert(from.clone(), balance - amount);
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), String> {
        let key = (owner.clone(), spender.clone());
        let allowance = self.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err("INSUFFICIENT_ALLOWANCE".to_string());
        }
        self.allowances.insert(key, allowance - amount);
        Ok(())
    }

    fn transfer_log(&self, from: &Address, to: &Address, amount: u128) -> LogRecord {
        LogRecord {
            address: self.token.clone(),
            topics: vec![
                TOPIC_TRANSFER.to_string(),
                encode_hex(&address_word(from)),
                encode_hex(&address_word(to)),
            ],
            data: uint_word(amount).to_vec(),
        }
    }

    fn approval_log(&self, owner: &Address, spender: &Address, amount: u128) -> LogRecord {
        LogRecord {
            address: self.token.clone(),
            topics: vec![
                TOPIC_APPROVAL.to_string(),
                encode_hex(&address_word(owner)),
                encode_hex(&address_word(spender)),
            ],
            data: uint_word(amount).to_vec(),
        }
    }
}

fn decode_args(args: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, String> {
    abi::decode(types, args).map_err(|e| e.to_string())
}

fn arg_address(values: &[AbiValue], index: usize) -> Result<Address, String> {
    values
        .get(index)
        .and_then(|v| v.as_address())
        .cloned()
        .ok_or_else(|| "BAD_ARGS".to_string())
}

fn arg_uint(values: &[AbiValue], index: usize) -> Result<u128, String> {
    values
        .get(index)
        .and_then(|v| v.as_uint())
        .ok_or_else(|| "BAD_ARGS".to_string())
}

fn arg_string(values: &[AbiValue], index: usize) -> Result<String, String> {
    values
        .get(index)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| "BAD_ARGS".to_string())
}
