//! Sentinel constants.

use alloy::primitives::{Address, address};

/// Number of blocks subtracted from the backend's latest known block before it
/// is used as a simulation anchor.
///
/// The backend may lag the chain tip; anchoring a few blocks back avoids
/// simulating against a block it has not indexed yet.
pub const BLOCK_LAG_MARGIN: u64 = 3;

/// Gas limit attached to every simulated call.
pub const SIMULATION_GAS_LIMIT: u64 = 30_000_000;

/// Minimum delay enforced by destination-chain bridge receivers between
/// proposal creation and execution, in seconds (4 days).
pub const RECEIVER_TIMELOCK_DELAY: u64 = 4 * 24 * 60 * 60;

/// Sender used for simulated `execute` calls.
///
/// Any externally owned account works here; the governor does not restrict the
/// executor. Using a fixed one keeps simulations reproducible.
pub const EXECUTOR: Address = address!("0x000000000000000000000000000000000000dEaD");

/// Offset applied to an L1 address when it calls an Arbitrum contract through
/// the delayed inbox.
///
/// See <https://docs.arbitrum.io/how-arbitrum-works/l1-to-l2-messaging#address-aliasing>
pub const ARBITRUM_ALIAS_OFFSET: Address = address!("0x1111000000000000000000000000000000001111");

/// The Optimism `L1CrossDomainMessenger` proxy on mainnet.
pub const OPTIMISM_MESSENGER: Address = address!("0x25ace71c97B33Cc4729CF772ae268934F7ab5fA1");

/// The Base `L1CrossDomainMessenger` proxy on mainnet.
pub const BASE_MESSENGER: Address = address!("0x866E82a600A1414e583f7F13623F1aC5d58b0Afa");

/// The Blast `L1CrossDomainMessenger` proxy on mainnet.
pub const BLAST_MESSENGER: Address = address!("0x5D4472f31Bd9385709ec61305AFc749F0fA8e9d0");

/// The Zora `L1CrossDomainMessenger` proxy on mainnet.
pub const ZORA_MESSENGER: Address = address!("0xdC40a14d9abd6F410226f1E6de71aE03441ca506");

/// The OP Stack `L2CrossDomainMessenger` predeploy, identical on every OP
/// Stack chain.
///
/// Bridge receivers on those chains see this address as `msg.sender` when a
/// relayed message is delivered.
pub const OP_L2_MESSENGER: Address = address!("0x4200000000000000000000000000000000000007");

/// The Arbitrum One delayed inbox on mainnet.
pub const ARBITRUM_INBOX: Address = address!("0x4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f");

/// The Polygon PoS `FxRoot` state-sync entrypoint on mainnet.
pub const POLYGON_FX_ROOT: Address = address!("0xfe5e5D361b2ad62c541bAb87C45a0B9B018389a2");

/// The Polygon PoS `FxChild` predeploy that delivers state-synced messages.
pub const POLYGON_FX_CHILD: Address = address!("0x8397259c983751DAf40400790063935a11afa28a");

/// The Scroll `L1ScrollMessenger` proxy on mainnet.
pub const SCROLL_MESSENGER: Address = address!("0x6774Bcbd5ceCeF1336b5300fb5186a12DDD8b367");

/// The Scroll `L2ScrollMessenger` that delivers relayed messages on Scroll.
pub const SCROLL_L2_MESSENGER: Address = address!("0x781e90f1c8Fc4611c9b7497C3B47F99Ef6969CbC");
