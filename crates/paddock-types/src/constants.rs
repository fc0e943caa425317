//! System-wide constants for the Paddock engine.

/// Lowest price an offer may carry.
pub const MIN_PRICE: i64 = 5;

/// Highest price an offer may carry.
pub const MAX_PRICE: i64 = 99;

/// Accepts per round a user may make before penalties apply.
pub const ACCEPT_LIMIT: u32 = 2;

/// Flat fine charged when an over-limit accept cannot be covered by a garnet.
pub const FINE_AMOUNT: i64 = 100;

/// Money every account starts with on first reference.
pub const STARTING_MONEY: i64 = 1000;

/// Garnets every account starts with on first reference.
pub const STARTING_GARNETS: u32 = 3;

/// Buys per round above which the retrospective evaluator reports a user.
pub const ROUND_ACCEPT_QUOTA: u32 = 2;

/// Horse labels a trading channel may be assigned.
pub const HORSE_LABELS: [char; 7] = ['A', 'B', 'C', 'D', 'E', 'F', 'G'];

/// Default file name of the transaction ledger inside the data directory.
pub const LEDGER_FILE_NAME: &str = "transactions.json";

/// Default file name of the market configuration inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Paddock";
