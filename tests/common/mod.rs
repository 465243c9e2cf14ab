#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use fundledger::accessor::MockAccessor;
use fundledger::domain::{ChainId, EventMeta, FundEvent};
use fundledger::store::{init_db, Repository};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestContext {
    pub repo: Arc<Repository>,
    pub chain_id: ChainId,
    _temp: TempDir,
}

pub async fn setup() -> TestContext {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("test.db").to_string_lossy().to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    TestContext {
        repo: Arc::new(Repository::new(pool)),
        chain_id: ChainId::new("1".to_string()),
        _temp: temp,
    }
}

pub fn fund_address() -> Address {
    Address::repeat_byte(0xf0)
}

pub fn account_a() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn account_b() -> Address {
    Address::repeat_byte(0x0b)
}

/// Event metadata with a tx hash derived from the block number, so each
/// block gets a distinct transaction.
pub fn meta_at(block: u64) -> EventMeta {
    EventMeta {
        fund: fund_address(),
        tx_hash: B256::repeat_byte(block as u8),
        tx_index: 0,
        log_index: 0,
        block_number: block,
        timestamp: 1_700_000_000 + block as i64,
    }
}

pub fn registration(block: u64) -> FundEvent {
    FundEvent::FundRegistered { meta: meta_at(block) }
}

pub fn deposit(block: u64, beneficiary: Address, amount: u64) -> FundEvent {
    FundEvent::Deposit {
        meta: meta_at(block),
        beneficiary,
        amount: U256::from(amount),
    }
}

pub fn withdraw(block: u64, beneficiary: Address, amount: u64) -> FundEvent {
    FundEvent::Withdraw {
        meta: meta_at(block),
        beneficiary,
        amount: U256::from(amount),
        fee: U256::ZERO,
    }
}

pub fn transfer(block: u64, from: Address, to: Address, shares: u64) -> FundEvent {
    FundEvent::Transfer {
        meta: meta_at(block),
        from,
        to,
        value: U256::from(shares),
    }
}

pub fn hardwork(block: u64, tvl: u64, price: u64) -> FundEvent {
    FundEvent::HardWork {
        meta: meta_at(block),
        total_value_locked: U256::from(tvl),
        price_per_share: U256::from(price),
    }
}

/// Accessor for a fund that resolves metadata but starts empty.
pub fn empty_fund_accessor() -> MockAccessor {
    MockAccessor::new()
        .with_symbol("vDAI")
        .with_name("DAI Vault")
        .with_decimals(18)
        .with_underlying(Address::repeat_byte(0xda))
        .with_withdrawal_fee_bps(0)
}

pub async fn process(
    ctx: &TestContext,
    accessor: &MockAccessor,
    event: &FundEvent,
) {
    fundledger::reconcile::process_event(&ctx.repo, accessor, &ctx.chain_id, event)
        .await
        .expect("event processing failed");
}

pub fn position_id(account: Address) -> String {
    fundledger::domain::ids::position_id(&account, &fund_address())
}

pub fn fund_id() -> String {
    fundledger::domain::ids::address_id(&fund_address())
}
