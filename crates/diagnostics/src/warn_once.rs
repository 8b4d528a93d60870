use std::collections::HashSet;

/// A stable key identifying one class of warning for the purposes of latching.
///
/// Kept as a newtype over `&'static str` (rather than a bare string) so call
/// sites read as self-documenting constants, e.g. `WarnOnceKey("sps.cabac-preferred")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WarnOnceKey(pub &'static str);

/// A bitset (backed by a `HashSet` rather than a literal bitset, since warning
/// classes are identified by name rather than by a dense integer index) that
/// remembers which warning classes have already fired for the current parse.
///
/// Owned exclusively by the Parameters Handler (H.264) or Epoch Context (HDMV);
/// there is no process-wide warning state, so its lifetime equals one parse.
#[derive(Debug, Default, Clone)]
pub struct WarnOnceSet {
    fired: HashSet<WarnOnceKey>,
}

impl WarnOnceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time it is called for a given key, and `false`
    /// on every subsequent call for that same key within this set's lifetime.
    pub fn should_fire(&mut self, key: WarnOnceKey) -> bool {
        self.fired.insert(key)
    }

    /// Resets the set, allowing every warning class to fire again. Used at
    /// epoch boundaries (HDMV) or stream restarts (H.264).
    pub fn reset(&mut self) {
        self.fired.clear();
    }
}
