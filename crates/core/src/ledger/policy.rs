//! Wallet policy values.

use reelpay_shared::WalletConfig;
use reelpay_shared::config::GIFT_MESSAGE_STORAGE_LEN;
use reelpay_shared::types::Coins;

/// Limits applied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletPolicy {
    /// Balance granted to a newly registered account.
    pub starting_balance: Coins,
    /// Largest amount accepted by one top-up.
    pub max_top_up: Coins,
    /// Maximum gift message length in characters.
    pub max_gift_message_len: usize,
}

impl Default for WalletPolicy {
    fn default() -> Self {
        Self::from(WalletConfig::default())
    }
}

impl From<WalletConfig> for WalletPolicy {
    fn from(config: WalletConfig) -> Self {
        Self {
            starting_balance: Coins(config.starting_balance.max(0)),
            max_top_up: Coins(config.max_top_up),
            max_gift_message_len: config
                .max_gift_message_len
                .min(GIFT_MESSAGE_STORAGE_LEN as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config() {
        let policy = WalletPolicy::default();
        assert_eq!(policy.starting_balance, Coins(500));
        assert_eq!(policy.max_top_up, Coins(10_000));
        assert_eq!(policy.max_gift_message_len, 200);
    }

    #[test]
    fn test_negative_starting_balance_clamped() {
        let policy = WalletPolicy::from(WalletConfig {
            starting_balance: -5,
            ..WalletConfig::default()
        });
        assert_eq!(policy.starting_balance, Coins::ZERO);
    }

    #[test]
    fn test_message_limit_capped_at_storage_width() {
        let policy = WalletPolicy::from(WalletConfig {
            max_gift_message_len: 5_000,
            ..WalletConfig::default()
        });
        assert_eq!(policy.max_gift_message_len, 200);

        let policy = WalletPolicy::from(WalletConfig {
            max_gift_message_len: 40,
            ..WalletConfig::default()
        });
        assert_eq!(policy.max_gift_message_len, 40);
    }
}
