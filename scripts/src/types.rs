//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, TxHash, U256};

/// Hands out consecutive nonces for one sender, starting from a baseline
/// fetched once from the node.
///
/// Nothing guards against other transactions from the same account being sent
/// while a sequence is in use; a stale baseline surfaces as a rejected
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceSequence {
    /// The nonce handed out by the next call to [`NonceSequence::next_nonce`]
    next: u64,
}

impl NonceSequence {
    /// A sequence whose first nonce is `base`
    pub fn starting_at(base: u64) -> Self {
        Self { next: base }
    }

    /// The nonce that will be handed out next
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Take the next nonce
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.next;
        self.next += 1;
        nonce
    }
}

/// What a compile / deploy / round-trip run observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripReport {
    /// The address of the deployed contract
    pub contract_address: Address,
    /// The nonce of the deployment transaction
    pub deploy_nonce: u64,
    /// The hash of the deployment transaction
    pub deploy_tx: TxHash,
    /// The stored value read right after deployment
    pub initial_value: U256,
    /// The nonce of the update transaction
    pub update_nonce: u64,
    /// The hash of the update transaction
    pub update_tx: TxHash,
    /// The stored value read after the update
    pub updated_value: U256,
}

impl Display for RoundTripReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "contract:      {:#x}", self.contract_address)?;
        writeln!(f, "deploy tx:     {} (nonce {})", self.deploy_tx, self.deploy_nonce)?;
        writeln!(f, "update tx:     {} (nonce {})", self.update_tx, self.update_nonce)?;
        write!(f, "stored value:  {} -> {}", self.initial_value, self.updated_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_consecutive() {
        let mut nonces = NonceSequence::starting_at(7);
        assert_eq!(nonces.peek(), 7);

        let deploy = nonces.next_nonce();
        let update = nonces.next_nonce();
        assert_eq!(deploy, 7);
        assert_eq!(update, deploy + 1);
        assert_eq!(nonces.peek(), 9);
    }

    #[test]
    fn test_copies_are_independent() {
        let mut nonces = NonceSequence::starting_at(0);
        let mut stale = nonces;

        nonces.next_nonce();
        nonces.next_nonce();

        // A copy taken before the sends still starts at the old baseline
        assert_eq!(stale.next_nonce(), 0);
        assert_eq!(nonces.peek(), 2);
    }

    #[test]
    fn test_report_display() {
        let report = RoundTripReport {
            contract_address: Address::repeat_byte(0x11),
            deploy_nonce: 0,
            deploy_tx: TxHash::repeat_byte(0xaa),
            initial_value: U256::ZERO,
            update_nonce: 1,
            update_tx: TxHash::repeat_byte(0xbb),
            updated_value: U256::from(5),
        };

        let rendered = report.to_string();
        assert!(rendered.contains("0x1111111111111111111111111111111111111111"));
        assert!(rendered.contains("(nonce 0)"));
        assert!(rendered.contains("(nonce 1)"));
        assert!(rendered.ends_with("0 -> 5"));
    }
}
