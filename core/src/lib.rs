//! omnium-core: unit algebra, commons/dividend pools, registries, the
//! conversion and temporal engines, and the ledger facade (components
//! C1–C6 plus the facade that composes them with C7 from `omnium-store`).

mod commons_pool;
mod conversion;
mod dividend_pool;
mod ledger;
mod registries;
mod temporal;
mod unit;

pub use commons_pool::CommonsPool;
pub use conversion::{convert, preview, validate};
pub use dividend_pool::DividendPool;
pub use ledger::{BalanceBreakdown, Ledger};
pub use registries::{CommunityRegistry, PurposeRegistry, WalletRegistry};
pub use temporal::{tick, TickResult};
pub use unit::{add_provenance, create, is_locked, merge, reputation_score, split, summary, UnitSummary};
