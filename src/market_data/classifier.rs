// Stablecoin / Ethereum-mainnet tagging used to bucket rows for ranking.
//
// DAI is deliberately absent from the stable set.

pub const STABLE_SYMBOLS: [&str; 7] = ["USDC", "USDT", "USDE", "SUSDE", "PYUSD", "RLUSD", "USDG"];

pub const ETHEREUM_CHAIN_ID: u64 = 1;

const ETHEREUM_CHAIN_NAMES: [&str; 3] = ["ethereum", "eth", "mainnet"];

/// Which single-character wrapper prefixes may be stripped before the set lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StablePolicy {
    /// `aUSDC` -> `USDC`
    #[default]
    InterestBearing,
    /// `aUSDC` -> `USDC` and `wUSDC` -> `USDC`
    InterestBearingOrWrapped,
}

impl StablePolicy {
    pub fn from_flag(strip_wrapped_prefix: bool) -> Self {
        if strip_wrapped_prefix {
            StablePolicy::InterestBearingOrWrapped
        } else {
            StablePolicy::InterestBearing
        }
    }

    fn prefixes(&self) -> &'static [char] {
        match self {
            StablePolicy::InterestBearing => &['A'],
            StablePolicy::InterestBearingOrWrapped => &['A', 'W'],
        }
    }

    pub fn is_stable(&self, symbol: &str) -> bool {
        let s = symbol.trim().to_uppercase();
        if s.is_empty() {
            return false;
        }
        if is_stable_symbol(&s) {
            return true;
        }
        self.prefixes()
            .iter()
            .any(|p| s.strip_prefix(*p).is_some_and(is_stable_symbol))
    }
}

fn is_stable_symbol(s: &str) -> bool {
    STABLE_SYMBOLS.contains(&s)
}

pub fn is_stable(symbol: &str) -> bool {
    StablePolicy::default().is_stable(symbol)
}

/// Chain id wins when known; the name is only consulted without one.
pub fn is_ethereum(chain_id: Option<u64>, chain_name: Option<&str>) -> bool {
    match chain_id {
        Some(id) => id == ETHEREUM_CHAIN_ID,
        None => chain_name
            .map(|name| ETHEREUM_CHAIN_NAMES.contains(&name.trim().to_lowercase().as_str()))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_stables() {
        for sym in STABLE_SYMBOLS {
            assert!(is_stable(sym), "{} should be stable", sym);
        }
        assert!(is_stable("usdc"));
        assert!(is_stable("  sUSDe "));
    }

    #[test]
    fn test_dai_is_not_stable() {
        assert!(!is_stable("DAI"));
        assert!(!is_stable("aDAI"));
    }

    #[test]
    fn test_interest_bearing_prefix() {
        assert!(is_stable("aUSDC"));
        assert!(is_stable("AUSDT"));
        assert!(!is_stable("aWETH"));
        // Wrapped prefix is only stripped under the extended policy
        assert!(!is_stable("wUSDC"));
        assert!(StablePolicy::InterestBearingOrWrapped.is_stable("wUSDC"));
        assert!(StablePolicy::InterestBearingOrWrapped.is_stable("aUSDC"));
    }

    #[test]
    fn test_non_stables() {
        assert!(!is_stable("WETH"));
        assert!(!is_stable("WBTC"));
        assert!(!is_stable(""));
        assert!(!is_stable("A"));
        assert!(!is_stable("USD"));
    }

    #[test]
    fn test_is_ethereum() {
        assert!(is_ethereum(Some(1), None));
        assert!(!is_ethereum(Some(8453), Some("ethereum")));
        assert!(is_ethereum(None, Some("Mainnet")));
        assert!(is_ethereum(None, Some("eth")));
        assert!(!is_ethereum(None, Some("base")));
        assert!(!is_ethereum(None, None));
    }
}
