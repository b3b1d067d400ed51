//! The ledger façade: composes C1–C7 into coherent, atomic operations over
//! a single in-memory state backed by a content-addressed snapshot chain.

use crate::commons_pool::CommonsPool;
use crate::conversion;
use crate::dividend_pool::DividendPool;
use crate::registries::{CommunityRegistry, PurposeRegistry, WalletRegistry};
use crate::temporal::{self, TickResult};
use crate::unit;
use omnium_spec::{
    Community, CommunityId, ConversionRequest, LedgerConfig, OmniumError, OmniumResult,
    ProvenanceKind, PurposeChannel, PurposeId, TransactionKind, TransactionRecord, Unit, UnitId,
    Wallet, WalletId,
};
use omnium_store::{
    append, resolve, ContentAddress, ContentStore, FsContentStore, Snapshot,
};
use std::collections::{BTreeMap, HashMap};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A wallet's total value broken down by dimension, as observed at the
/// current clock.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceBreakdown {
    pub total: f64,
    pub by_stratum: BTreeMap<String, f64>,
    pub by_locality: BTreeMap<String, f64>,
    pub by_purpose: BTreeMap<String, f64>,
}

/// The ledger: a single-threaded, cooperative state machine. Every mutator
/// takes `&mut self`, so the borrow checker enforces serialization; there
/// is no internal locking.
pub struct Ledger {
    store: FsContentStore,
    commons_pool: CommonsPool,
    dividend_pool: DividendPool,
    wallets: WalletRegistry,
    communities: CommunityRegistry,
    purposes: PurposeRegistry,
    units: HashMap<UnitId, Unit>,
    transactions: Vec<TransactionRecord>,
    head: Option<ContentAddress>,
}

impl Ledger {
    /// Open a ledger rooted at `config`'s deployment path with fresh,
    /// empty state. Call `load` afterwards to resume from a prior head.
    pub fn open(config: &LedgerConfig) -> OmniumResult<Self> {
        let store = FsContentStore::open(config)?;
        let mut commons_pool = CommonsPool::new();
        commons_pool.set_time(config.genesis_time_ms);
        Ok(Self {
            store,
            commons_pool,
            dividend_pool: DividendPool::new(),
            wallets: WalletRegistry::new(),
            communities: CommunityRegistry::new(),
            purposes: PurposeRegistry::new(),
            units: HashMap::new(),
            transactions: Vec::new(),
            head: None,
        })
    }

    pub fn create_wallet(&mut self, id: WalletId, name: String) -> Wallet {
        let now = self.commons_pool.get_time();
        self.wallets.create(id, name, now)
    }

    pub fn create_community(
        &mut self,
        id: CommunityId,
        name: String,
        description: String,
        boundary_fee: f64,
    ) -> OmniumResult<Community> {
        let now = self.commons_pool.get_time();
        self.communities.create(id, name, description, boundary_fee, now)
    }

    pub fn create_purpose(
        &mut self,
        id: PurposeId,
        name: String,
        description: String,
        conversion_discount: f64,
    ) -> OmniumResult<PurposeChannel> {
        let now = self.commons_pool.get_time();
        self.purposes.create(id, name, description, conversion_discount, now)
    }

    /// Mint a fresh T0 unit of `amount` into `wallet_id`.
    pub fn mint(
        &mut self,
        amount: f64,
        wallet_id: &str,
        note: Option<String>,
    ) -> OmniumResult<Unit> {
        if !self.wallets.exists(wallet_id) {
            return Err(OmniumError::WalletUnknown(wallet_id.to_string()));
        }
        self.commons_pool.mint(amount)?;
        let now = self.commons_pool.get_time();
        let transaction_id = new_id();
        let minted = unit::create(
            amount,
            omnium_spec::Stratum::T0,
            vec![],
            vec![],
            wallet_id.to_string(),
            ProvenanceKind::Minted,
            None,
            note.clone(),
            transaction_id.clone(),
            now,
        );
        self.units.insert(minted.id.clone(), minted.clone());
        self.transactions.push(TransactionRecord {
            id: transaction_id,
            kind: TransactionKind::Mint,
            timestamp: now,
            input_unit_ids: vec![],
            output_unit_ids: vec![minted.id.clone()],
            fees: 0.0,
            description: note.unwrap_or_default(),
        });
        tracing::info!(unit = %minted.id, amount, wallet = wallet_id, "minted unit");
        Ok(minted)
    }

    /// Transfer a unit (or a split-off `amount` of it) to `to_wallet_id`.
    pub fn transfer(
        &mut self,
        unit_id: &str,
        to_wallet_id: &str,
        amount: Option<f64>,
        note: Option<String>,
    ) -> OmniumResult<()> {
        let original = self
            .units
            .get(unit_id)
            .cloned()
            .ok_or_else(|| OmniumError::UnitUnknown(unit_id.to_string()))?;
        if !self.wallets.exists(to_wallet_id) {
            return Err(OmniumError::WalletUnknown(to_wallet_id.to_string()));
        }
        let now = self.commons_pool.get_time();
        if unit::is_locked(&original, now) {
            return Err(OmniumError::Locked(unit_id.to_string()));
        }

        let transaction_id = new_id();
        let (remainder, mut transferred) = match amount {
            Some(requested) if requested <= 0.0 || requested > original.magnitude => {
                return Err(OmniumError::Amount(format!(
                    "transfer amount {requested} must be in (0, {}]",
                    original.magnitude
                )));
            }
            Some(requested) if requested < original.magnitude => {
                let (remainder, piece) =
                    unit::split(&original, requested, now, transaction_id.clone())?;
                (Some(remainder), piece)
            }
            _ => (None, original.clone()),
        };

        let kind = if note.is_some() {
            ProvenanceKind::Earned
        } else {
            ProvenanceKind::Gifted
        };
        let transferred_magnitude = transferred.magnitude;
        transferred.owner = to_wallet_id.to_string();
        unit::add_provenance(
            &mut transferred,
            omnium_spec::ProvenanceEntry {
                timestamp: now,
                kind,
                from: Some(original.owner.clone()),
                to: Some(to_wallet_id.to_string()),
                magnitude: transferred_magnitude,
                note: note.clone(),
                transaction_id: transaction_id.clone(),
            },
        );

        if let Some(remainder) = remainder {
            self.units.insert(remainder.id.clone(), remainder);
        }
        self.units.insert(transferred.id.clone(), transferred.clone());
        self.transactions.push(TransactionRecord {
            id: transaction_id,
            kind: TransactionKind::Transfer,
            timestamp: now,
            input_unit_ids: vec![unit_id.to_string()],
            output_unit_ids: vec![transferred.id.clone()],
            fees: 0.0,
            description: note.unwrap_or_default(),
        });
        tracing::info!(unit = %unit_id, to = to_wallet_id, amount = transferred_magnitude, "transferred unit");
        Ok(())
    }

    /// Apply a conversion request to a unit, crediting fees to the
    /// Dividend Pool rather than silently burning them.
    pub fn convert(&mut self, unit_id: &str, request: ConversionRequest) -> OmniumResult<Unit> {
        let original = self
            .units
            .get(unit_id)
            .cloned()
            .ok_or_else(|| OmniumError::UnitUnknown(unit_id.to_string()))?;
        let now = self.commons_pool.get_time();
        let transaction_id = new_id();

        let (_, fees) = conversion::preview(&original, &request, &self.communities, &self.purposes)?;
        let converted = conversion::convert(
            &original,
            &request,
            &self.communities,
            &self.purposes,
            now,
            transaction_id.clone(),
        )?;

        self.dividend_pool.deposit(fees.total());
        self.units.remove(unit_id);
        self.units.insert(converted.id.clone(), converted.clone());
        self.transactions.push(TransactionRecord {
            id: transaction_id,
            kind: TransactionKind::Convert,
            timestamp: now,
            input_unit_ids: vec![unit_id.to_string()],
            output_unit_ids: vec![converted.id.clone()],
            fees: fees.total(),
            description: format!("convert {unit_id}"),
        });
        tracing::info!(unit = %unit_id, new_unit = %converted.id, fee = fees.total(), "converted unit");
        Ok(converted)
    }

    /// Advance the simulated clock by `days` and settle demurrage/dividend
    /// accrual across every unit.
    pub fn tick(&mut self, days: f64) -> TickResult {
        let delta_ms = (days * 86_400_000.0) as i64;
        self.commons_pool.advance_time(delta_ms);
        let now = self.commons_pool.get_time();

        let mut units: Vec<Unit> = self.units.values().cloned().collect();
        let result = temporal::tick(&mut units, &mut self.dividend_pool, now);
        for unit in units {
            self.units.insert(unit.id.clone(), unit);
        }
        tracing::info!(
            updated = result.updated,
            demurrage = result.total_demurrage,
            dividend = result.total_dividend,
            "ticked ledger"
        );
        result
    }

    /// Serialize current state into a snapshot, store it, and advance the
    /// chain head. Returns the new head address.
    pub fn save(&mut self) -> OmniumResult<ContentAddress> {
        let now = self.commons_pool.get_time();
        let snapshot = Snapshot::new(
            now,
            self.commons_pool.state(),
            self.dividend_pool.export(),
            self.units.values().cloned().collect(),
            self.wallets.list(),
            self.communities.list(),
            self.purposes.list(),
        );
        let bytes = snapshot.to_canonical_bytes()?;
        let snapshot_address = self.store.store(&bytes)?;
        let new_head = append(&self.store, snapshot_address, self.head.as_ref(), now, None)?;
        self.store.set_head(&new_head)?;
        self.head = Some(new_head.clone());
        Ok(new_head)
    }

    /// Load state from `head` (or, if `None`, the store's persisted head).
    /// Returns `false` if there is nothing to load.
    pub fn load(&mut self, head: Option<ContentAddress>) -> OmniumResult<bool> {
        let target = match head {
            Some(address) => Some(address),
            None => self.store.get_head()?,
        };
        let Some(address) = target else {
            return Ok(false);
        };
        let pointer = resolve(&self.store, &address)?
            .ok_or_else(|| OmniumError::UnknownCid(address.to_string()))?;
        let bytes = self
            .store
            .retrieve(&pointer.snapshot_address)?
            .ok_or_else(|| OmniumError::UnknownCid(pointer.snapshot_address.to_string()))?;
        let snapshot = Snapshot::from_canonical_bytes(&bytes)?;

        self.commons_pool = CommonsPool::from_state(snapshot.pool);
        self.dividend_pool = DividendPool::import(snapshot.dividend_pool_or_default());
        self.units = snapshot
            .units
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        self.wallets = WalletRegistry::import(snapshot.wallets);
        self.communities = CommunityRegistry::import(snapshot.communities);
        self.purposes = PurposeRegistry::import(snapshot.purposes);
        self.head = Some(address);
        tracing::info!(head = %self.head.as_ref().unwrap(), "loaded ledger state");
        Ok(true)
    }

    pub fn get_unit(&self, unit_id: &str) -> OmniumResult<&Unit> {
        self.units
            .get(unit_id)
            .ok_or_else(|| OmniumError::UnitUnknown(unit_id.to_string()))
    }

    /// This wallet's holdings, broken down by stratum, locality, and
    /// purpose.
    pub fn get_balance(&self, wallet_id: &str) -> OmniumResult<BalanceBreakdown> {
        if !self.wallets.exists(wallet_id) {
            return Err(OmniumError::WalletUnknown(wallet_id.to_string()));
        }
        let mut breakdown = BalanceBreakdown {
            total: 0.0,
            by_stratum: BTreeMap::new(),
            by_locality: BTreeMap::new(),
            by_purpose: BTreeMap::new(),
        };
        for unit in self.units.values().filter(|u| u.owner == wallet_id) {
            breakdown.total += unit.magnitude;
            *breakdown
                .by_stratum
                .entry(unit.stratum.to_string())
                .or_insert(0.0) += unit.magnitude;
            if unit.localities.is_empty() {
                *breakdown
                    .by_locality
                    .entry("global".to_string())
                    .or_insert(0.0) += unit.magnitude;
            }
            for locality in &unit.localities {
                *breakdown.by_locality.entry(locality.clone()).or_insert(0.0) += unit.magnitude;
            }
            if unit.purposes.is_empty() {
                *breakdown
                    .by_purpose
                    .entry("unrestricted".to_string())
                    .or_insert(0.0) += unit.magnitude;
            }
            for purpose in &unit.purposes {
                *breakdown.by_purpose.entry(purpose.clone()).or_insert(0.0) += unit.magnitude;
            }
        }
        Ok(breakdown)
    }

    pub fn list_wallets(&self) -> Vec<Wallet> {
        self.wallets.list()
    }

    pub fn list_communities(&self) -> Vec<Community> {
        self.communities.list()
    }

    pub fn list_purposes(&self) -> Vec<PurposeChannel> {
        self.purposes.list()
    }

    pub fn head(&self) -> Option<ContentAddress> {
        self.head.clone()
    }

    pub fn height(&self) -> OmniumResult<u64> {
        omnium_store::height_of(&self.store, self.head.as_ref())
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }
}
