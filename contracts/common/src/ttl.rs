//! Persistent-storage TTL management shared by the suite.

use soroban_sdk::{Env, IntoVal, Val};

/// Remaining-lifetime threshold below which an entry is bumped.
pub const TTL_THRESHOLD: u32 = 5_184_000;
/// Target lifetime an entry is extended to when bumped.
pub const TTL_EXTEND_TO: u32 = 10_368_000;

/// Extends the TTL of a persistent entry using the suite-wide thresholds.
///
/// The entry must exist; callers extend immediately after a `set`.
pub fn extend_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
