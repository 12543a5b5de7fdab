//! Batched close/burn transaction assembly
//!
//! One blockhash per batch, accounts re-validated against current chain
//! state, one aggregated fee transfer at the end. Transactions are returned
//! unsigned; the wallet signs them.

use super::classifier::{classify_account, ClassificationPolicy};
use super::fees::{self, FeeBreakdown};
use super::types::{BuiltTransaction, InstructionView, ReclaimAction, SkippedAccount};
use crate::cache::MetadataCache;
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use crate::rpc::{parse_pubkey, parse_wallet_address, LedgerRpc, MintFact, TokenAccountFact};
use crate::tokens::MetadataSource;
use base64::Engine;
use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, packet::PACKET_DATA_SIZE,
    pubkey::Pubkey, system_instruction, transaction::Transaction,
};
use std::collections::HashSet;
use std::sync::Arc;

pub struct TransactionBuilder {
    rpc: Arc<dyn LedgerRpc>,
    cache: Arc<MetadataCache>,
    metadata: Arc<dyn MetadataSource>,
    policy: Arc<dyn ClassificationPolicy>,
    fee_wallet: Pubkey,
    max_accounts: usize,
}

/// An account that passed re-validation
struct Included {
    id: String,
    address: Pubkey,
    instructions: Vec<Instruction>,
    fee: FeeBreakdown,
}

struct Compiled {
    instructions: Vec<Instruction>,
    fees: FeeBreakdown,
    serialized: Vec<u8>,
}

impl TransactionBuilder {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        cache: Arc<MetadataCache>,
        metadata: Arc<dyn MetadataSource>,
        policy: Arc<dyn ClassificationPolicy>,
        fee_wallet: Pubkey,
        max_accounts: usize,
    ) -> Self {
        Self {
            rpc,
            cache,
            metadata,
            policy,
            fee_wallet,
            max_accounts: max_accounts.max(1),
        }
    }

    /// Build one unsigned transaction applying `action` to `account_ids`
    pub async fn build(
        &self,
        wallet: &str,
        account_ids: &[String],
        action: ReclaimAction,
    ) -> ReclaimResult<BuiltTransaction> {
        if action == ReclaimAction::Ignore {
            return Err(ReclaimError::InvalidRequest(
                "action must be close or burn".to_string(),
            ));
        }
        let owner = parse_wallet_address(wallet)?;

        let mut seen = HashSet::new();
        let ids: Vec<&String> = account_ids
            .iter()
            .filter(|id| seen.insert(id.trim().to_string()))
            .collect();
        if ids.len() > self.max_accounts {
            return Err(ReclaimError::InvalidRequest(format!(
                "{} accounts requested, at most {} fit in one transaction",
                ids.len(),
                self.max_accounts
            )));
        }

        let gross = self.cache.rent_minimum(self.rpc.as_ref()).await?;

        let mut included = Vec::new();
        let mut skipped = Vec::new();
        for id in ids {
            match self.revalidate(&owner, id, action, gross).await {
                Ok(entry) => included.push(entry),
                Err(reason) => {
                    logger::warning(
                        LogTag::Builder,
                        &format!("Skipping {} for {}: {}", id, action, reason),
                    );
                    skipped.push(SkippedAccount {
                        account: id.clone(),
                        reason,
                    });
                }
            }
        }

        if included.is_empty() {
            return Err(ReclaimError::EmptyBatch {
                action: action.to_string(),
            });
        }

        let blockhash = self.rpc.get_latest_blockhash().await?;

        // Greedy fill: accounts that would push the packet over the limit are skipped
        let mut accepted: Vec<Included> = Vec::with_capacity(included.len());
        let mut compiled: Option<Compiled> = None;
        for entry in included {
            accepted.push(entry);
            let attempt = self.compile(&owner, &accepted, blockhash)?;
            if attempt.serialized.len() <= PACKET_DATA_SIZE {
                compiled = Some(attempt);
                continue;
            }
            if let Some(rejected) = accepted.pop() {
                let reason = format!(
                    "transaction would exceed {} bytes with this account",
                    PACKET_DATA_SIZE
                );
                logger::warning(
                    LogTag::Builder,
                    &format!("Skipping {} for {}: {}", rejected.id, action, reason),
                );
                skipped.push(SkippedAccount {
                    account: rejected.id,
                    reason,
                });
            }
        }

        let Some(compiled) = compiled else {
            return Err(ReclaimError::EmptyBatch {
                action: action.to_string(),
            });
        };

        logger::info(
            LogTag::Builder,
            &format!(
                "Built {} transaction for {}: {} included, {} skipped, {} bytes, fee {} lamports",
                action,
                wallet,
                accepted.len(),
                skipped.len(),
                compiled.serialized.len(),
                compiled.fees.fee
            ),
        );

        Ok(BuiltTransaction {
            wallet: owner.to_string(),
            action,
            instructions: compiled.instructions.iter().map(InstructionView::from).collect(),
            blockhash: blockhash.to_string(),
            fee_payer: owner.to_string(),
            transaction: base64::engine::general_purpose::STANDARD.encode(&compiled.serialized),
            included: accepted.iter().map(|e| e.address.to_string()).collect(),
            skipped,
            fees: compiled.fees,
        })
    }

    /// Account instructions plus the aggregated fee transfer, serialized
    fn compile(
        &self,
        owner: &Pubkey,
        entries: &[Included],
        blockhash: Hash,
    ) -> ReclaimResult<Compiled> {
        let fees = entries
            .iter()
            .fold(FeeBreakdown::default(), |acc, entry| acc.combine(entry.fee));
        let mut instructions: Vec<Instruction> = entries
            .iter()
            .flat_map(|entry| entry.instructions.iter().cloned())
            .collect();
        if fees.fee > 0 {
            instructions.push(system_instruction::transfer(owner, &self.fee_wallet, fees.fee));
        }

        let transaction = assemble(&instructions, owner, blockhash)?;
        let serialized = bincode::serialize(&transaction).map_err(|e| {
            ReclaimError::InvalidRequest(format!("transaction serialization failed: {}", e))
        })?;

        Ok(Compiled {
            instructions,
            fees,
            serialized,
        })
    }

    /// Re-check one account against current state; `Err` carries the skip reason
    async fn revalidate(
        &self,
        owner: &Pubkey,
        id: &str,
        action: ReclaimAction,
        gross: u64,
    ) -> Result<Included, String> {
        let address = parse_pubkey(id).map_err(|e| e.to_string())?;

        let account = self
            .rpc
            .get_token_account(&address)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "account no longer exists".to_string())?;

        if account.owner != owner.to_string() {
            return Err("account is not owned by this wallet".to_string());
        }

        let mint = self
            .cache
            .mint_fact(self.rpc.as_ref(), &account.mint)
            .await
            .map_err(|e| e.to_string())?;

        let verdict = classify_account(&account, mint.as_ref(), self.policy.as_ref());
        if verdict.category.action() != action {
            return Err(verdict
                .reason
                .unwrap_or_else(|| format!("account now qualifies for {}", verdict.category.action())));
        }

        let decimals = if action == ReclaimAction::Burn {
            self.burn_decimals(&account, mint.as_ref()).await
        } else {
            account.decimals
        };
        let instructions = account_instructions(&address, owner, &account, decimals, action)?;
        Ok(Included {
            id: id.to_string(),
            address,
            instructions,
            fee: fees::split(gross),
        })
    }

    /// Mint decimals, else the metadata index hint, else the account's own field
    async fn burn_decimals(&self, account: &TokenAccountFact, mint: Option<&MintFact>) -> u8 {
        if let Some(mint) = mint {
            return mint.decimals;
        }
        let hint = self
            .cache
            .metadata(self.metadata.as_ref(), &[account.mint.clone()])
            .await
            .get(&account.mint)
            .and_then(|m| m.decimals);
        hint.unwrap_or(account.decimals)
    }
}

fn token_program_id(account: &TokenAccountFact) -> Pubkey {
    if account.is_token_2022 {
        spl_token_2022::id()
    } else {
        spl_token::id()
    }
}

/// Burn (when asked) then close, both paying out to the wallet
fn account_instructions(
    address: &Pubkey,
    owner: &Pubkey,
    account: &TokenAccountFact,
    decimals: u8,
    action: ReclaimAction,
) -> Result<Vec<Instruction>, String> {
    let program_id = token_program_id(account);
    let mut instructions = Vec::with_capacity(2);

    if action == ReclaimAction::Burn {
        let mint_key = parse_pubkey(&account.mint).map_err(|e| e.to_string())?;
        let amount = account
            .balance()
            .ok_or_else(|| format!("unparsable balance '{}'", account.amount))?;

        let burn = if account.is_token_2022 {
            spl_token_2022::instruction::burn_checked(
                &program_id, address, &mint_key, owner, &[], amount, decimals,
            )
        } else {
            spl_token::instruction::burn_checked(
                &program_id, address, &mint_key, owner, &[], amount, decimals,
            )
        }
        .map_err(|e| format!("failed to build burn instruction: {}", e))?;
        instructions.push(burn);
    }

    let close = if account.is_token_2022 {
        spl_token_2022::instruction::close_account(&program_id, address, owner, owner, &[])
    } else {
        spl_token::instruction::close_account(&program_id, address, owner, owner, &[])
    }
    .map_err(|e| format!("failed to build close instruction: {}", e))?;
    instructions.push(close);

    Ok(instructions)
}

/// Compile the unsigned transaction, checking payer and blockhash are set
fn assemble(instructions: &[Instruction], payer: &Pubkey, blockhash: Hash) -> ReclaimResult<Transaction> {
    if blockhash == Hash::default() {
        return Err(ReclaimError::MissingBlockhash);
    }
    let message = Message::new_with_blockhash(instructions, Some(payer), &blockhash);
    if message.header.num_required_signatures == 0 || message.account_keys.first() != Some(payer) {
        return Err(ReclaimError::MissingFeePayer);
    }
    Ok(Transaction::new_unsigned(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use crate::constants::USDC_MINT;
    use crate::errors::ErrorKind;
    use crate::reclaim::classifier::HeuristicPolicy;
    use crate::rpc::testing::{mint_fact, token_account, MockLedger, TEST_RENT_MINIMUM};
    use crate::tokens::metadata::testing::FakeMetadata;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;
    use std::str::FromStr;

    struct Fixture {
        ledger: Arc<MockLedger>,
        builder: TransactionBuilder,
        owner: Pubkey,
        fee_wallet: Pubkey,
    }

    fn fixture(ledger: MockLedger, owner: Pubkey) -> Fixture {
        fixture_with_metadata(ledger, owner, FakeMetadata::default())
    }

    fn fixture_with_metadata(ledger: MockLedger, owner: Pubkey, metadata: FakeMetadata) -> Fixture {
        let ledger = Arc::new(ledger);
        let fee_wallet = Keypair::new().pubkey();
        let builder = TransactionBuilder::new(
            ledger.clone(),
            Arc::new(MetadataCache::new(&CacheSettings::default())),
            Arc::new(metadata),
            Arc::new(HeuristicPolicy::default()),
            fee_wallet,
            20,
        );
        Fixture {
            ledger,
            builder,
            owner,
            fee_wallet,
        }
    }

    fn decode(built: &BuiltTransaction) -> Transaction {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&built.transaction)
            .unwrap();
        bincode::deserialize(&bytes).unwrap()
    }

    fn fee_transfer_lamports(tx: &Transaction) -> Option<u64> {
        let system = solana_sdk::system_program::id();
        tx.message.instructions.iter().find_map(|ix| {
            let program = tx.message.account_keys[ix.program_id_index as usize];
            if program != system {
                return None;
            }
            // SystemInstruction::Transfer: u32 tag 2, then u64 lamports
            let lamports: [u8; 8] = ix.data[4..12].try_into().ok()?;
            Some(u64::from_le_bytes(lamports))
        })
    }

    #[tokio::test]
    async fn test_close_batch_single_fee_transfer() {
        let owner = Keypair::new().pubkey();
        let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let a = token_account(&owner, &mint_a, 0, 6);
        let b = token_account(&owner, &mint_b, 0, 6);
        let ledger = MockLedger::new()
            .with_account(a.clone())
            .with_account(b.clone())
            .with_mint(mint_fact(&mint_a, 6, 100))
            .with_mint(mint_fact(&mint_b, 6, 100));
        let f = fixture(ledger, owner);

        let built = f
            .builder
            .build(&owner.to_string(), &[a.address.clone(), b.address.clone()], ReclaimAction::Close)
            .await
            .unwrap();

        // Two closes plus one fee transfer
        assert_eq!(built.instructions.len(), 3);
        assert_eq!(built.included, vec![a.address, b.address]);
        assert_eq!(built.fees, fees::split_each([TEST_RENT_MINIMUM, TEST_RENT_MINIMUM]));
        assert_eq!(built.fee_payer, owner.to_string());
        assert_eq!(built.blockhash, f.ledger.blockhash().to_string());
        assert_eq!(f.ledger.call_count("getLatestBlockhash"), 1);

        let tx = decode(&built);
        assert_eq!(tx.message.recent_blockhash, f.ledger.blockhash());
        assert_eq!(tx.message.account_keys[0], owner);
        assert!(tx.message.account_keys.contains(&f.fee_wallet));
        assert_eq!(fee_transfer_lamports(&tx), Some(2 * 203_928));
    }

    #[tokio::test]
    async fn test_burn_emits_burn_then_close() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();
        let mut account = token_account(&owner, &mint, 500, 9);
        account.is_token_2022 = true;
        let ledger = MockLedger::new()
            .with_account(account.clone())
            .with_mint(mint_fact(&mint, 6, 1_000_000));
        let f = fixture(ledger, owner);

        let built = f
            .builder
            .build(&owner.to_string(), &[account.address.clone()], ReclaimAction::Burn)
            .await
            .unwrap();

        assert_eq!(built.instructions.len(), 3);
        let token_2022 = spl_token_2022::id().to_string();
        assert_eq!(built.instructions[0].program_id, token_2022);
        assert_eq!(built.instructions[1].program_id, token_2022);

        let data = base64::engine::general_purpose::STANDARD
            .decode(&built.instructions[0].data)
            .unwrap();
        match spl_token_2022::instruction::TokenInstruction::unpack(&data).unwrap() {
            spl_token_2022::instruction::TokenInstruction::BurnChecked { amount, decimals } => {
                assert_eq!(amount, 500);
                // Mint decimals win over the account's field
                assert_eq!(decimals, 6);
            }
            other => panic!("expected BurnChecked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_accounts_skipped_and_excluded_from_fee() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();
        let usdc = Pubkey::from_str(USDC_MINT).unwrap();
        let closeable = token_account(&owner, &mint, 0, 6);
        let refilled = token_account(&owner, &mint, 7, 6);
        let foreign = token_account(&Keypair::new().pubkey(), &mint, 0, 6);
        let protected = token_account(&owner, &usdc, 0, 6);
        let vanished = Pubkey::new_unique().to_string();
        let ledger = MockLedger::new()
            .with_account(closeable.clone())
            .with_account(refilled.clone())
            .with_account(foreign.clone())
            .with_account(protected.clone())
            .with_mint(mint_fact(&mint, 6, 100))
            .with_mint(mint_fact(&usdc, 6, 100));
        let f = fixture(ledger, owner);

        let ids = vec![
            closeable.address.clone(),
            refilled.address.clone(),
            foreign.address.clone(),
            vanished.clone(),
            "not-an-address".to_string(),
            protected.address.clone(),
        ];
        let built = f
            .builder
            .build(&owner.to_string(), &ids, ReclaimAction::Close)
            .await
            .unwrap();

        assert_eq!(built.included, vec![closeable.address, protected.address]);
        let skipped: Vec<&str> = built.skipped.iter().map(|s| s.account.as_str()).collect();
        assert_eq!(
            skipped,
            vec![refilled.address.as_str(), foreign.address.as_str(), vanished.as_str(), "not-an-address"]
        );
        assert_eq!(built.fees.fee, 2 * fees::split(TEST_RENT_MINIMUM).fee);
        assert_eq!(fee_transfer_lamports(&decode(&built)), Some(built.fees.fee));
    }

    #[tokio::test]
    async fn test_nothing_qualifies_is_empty_batch() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();
        let holding = token_account(&owner, &mint, 10, 6);
        let ledger = MockLedger::new()
            .with_account(holding.clone())
            .with_mint(mint_fact(&mint, 6, 100));
        let f = fixture(ledger, owner);

        let err = f
            .builder
            .build(&owner.to_string(), &[holding.address], ReclaimAction::Close)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyBatch);
        // No blockhash fetched for an empty batch
        assert_eq!(f.ledger.call_count("getLatestBlockhash"), 0);

        let err = f
            .builder
            .build(&owner.to_string(), &[], ReclaimAction::Burn)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyBatch);
    }

    #[tokio::test]
    async fn test_request_limits() {
        let owner = Keypair::new().pubkey();
        let f = fixture(MockLedger::new(), owner);

        let too_many: Vec<String> = (0..21).map(|_| Pubkey::new_unique().to_string()).collect();
        let err = f
            .builder
            .build(&owner.to_string(), &too_many, ReclaimAction::Close)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = f
            .builder
            .build(&owner.to_string(), &too_many[..1], ReclaimAction::Ignore)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapsed() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();
        let a = token_account(&owner, &mint, 0, 6);
        let ledger = MockLedger::new()
            .with_account(a.clone())
            .with_mint(mint_fact(&mint, 6, 100));
        let f = fixture(ledger, owner);

        let built = f
            .builder
            .build(&owner.to_string(), &[a.address.clone(), a.address.clone()], ReclaimAction::Close)
            .await
            .unwrap();
        assert_eq!(built.included.len(), 1);
        assert_eq!(built.fees.gross, TEST_RENT_MINIMUM);
    }

    fn burned_decimals(built: &BuiltTransaction) -> u8 {
        let data = base64::engine::general_purpose::STANDARD
            .decode(&built.instructions[0].data)
            .unwrap();
        match spl_token::instruction::TokenInstruction::unpack(&data).unwrap() {
            spl_token::instruction::TokenInstruction::BurnChecked { decimals, .. } => decimals,
            other => panic!("expected BurnChecked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_burn_decimals_fall_back_to_metadata_then_account() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();
        let account = token_account(&owner, &mint, 42, 9);

        // No mint fact: the metadata hint is used
        let metadata = FakeMetadata::default()
            .with(&mint.to_string(), "Hinted", "HNT")
            .with_decimals(&mint.to_string(), 4);
        let f = fixture_with_metadata(MockLedger::new().with_account(account.clone()), owner, metadata);
        let built = f
            .builder
            .build(&owner.to_string(), &[account.address.clone()], ReclaimAction::Burn)
            .await
            .unwrap();
        assert_eq!(burned_decimals(&built), 4);

        // Neither mint fact nor hint: the account's own field
        let f = fixture(MockLedger::new().with_account(account.clone()), owner);
        let built = f
            .builder
            .build(&owner.to_string(), &[account.address.clone()], ReclaimAction::Burn)
            .await
            .unwrap();
        assert_eq!(burned_decimals(&built), 9);
    }

    #[tokio::test]
    async fn test_full_burn_batch_fits_one_packet() {
        let owner = Keypair::new().pubkey();
        let mut ledger = MockLedger::new();
        let mut ids = Vec::new();
        for _ in 0..20 {
            let mint = Pubkey::new_unique();
            let account = token_account(&owner, &mint, 1_000, 6);
            ids.push(account.address.clone());
            ledger = ledger.with_account(account).with_mint(mint_fact(&mint, 6, 1_000_000));
        }
        let f = fixture(ledger, owner);

        let built = f
            .builder
            .build(&owner.to_string(), &ids, ReclaimAction::Burn)
            .await
            .unwrap();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&built.transaction)
            .unwrap();
        assert!(bytes.len() <= PACKET_DATA_SIZE, "transaction is {} bytes", bytes.len());
        assert!(!built.included.is_empty());
        assert!(built.included.len() < ids.len());
        assert_eq!(built.included.len() + built.skipped.len(), ids.len());
        // Overflow accounts come from the tail, in request order
        assert_eq!(built.included, ids[..built.included.len()].to_vec());
        assert!(built
            .skipped
            .iter()
            .all(|s| s.reason.contains(&PACKET_DATA_SIZE.to_string())));
        // Fee covers only what made it into the packet
        let expected = fees::split_each(built.included.iter().map(|_| TEST_RENT_MINIMUM));
        assert_eq!(built.fees, expected);
        assert_eq!(fee_transfer_lamports(&decode(&built)), Some(expected.fee));
    }

    #[tokio::test]
    async fn test_full_close_batch_fits_without_skips() {
        let owner = Keypair::new().pubkey();
        let mut ledger = MockLedger::new();
        let mut ids = Vec::new();
        for _ in 0..20 {
            let mint = Pubkey::new_unique();
            let account = token_account(&owner, &mint, 0, 6);
            ids.push(account.address.clone());
            ledger = ledger.with_account(account).with_mint(mint_fact(&mint, 6, 1_000_000));
        }
        let f = fixture(ledger, owner);

        let built = f
            .builder
            .build(&owner.to_string(), &ids, ReclaimAction::Close)
            .await
            .unwrap();
        assert_eq!(built.included.len(), 20);
        assert!(built.skipped.is_empty());
    }

    #[test]
    fn test_assemble_requires_blockhash() {
        let payer = Keypair::new().pubkey();
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1);
        let err = assemble(&[ix], &payer, Hash::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingBlockhash);
    }
}
