use std::collections::HashMap;

use crate::models::TransferType;

/// Label returned for any address the book has never seen.
pub const UNKNOWN_WALLET: &str = "Unknown Wallet";

/// Known-entity labels for on-chain addresses.
///
/// The seeded entries cover the exchange and treasury wallets that show up
/// in large-transfer feeds often enough to be worth naming. New entries can
/// be added at runtime without touching any of the type-derivation rules,
/// which only look at labels.
pub struct AddressBook {
    labels: HashMap<String, String>,
}

impl AddressBook {
    pub fn empty() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }

    /// Book pre-seeded with well-known Ethereum and Bitcoin wallets.
    pub fn with_known_entities() -> Self {
        let mut book = Self::empty();

        // Ethereum
        book.insert("0x28C6c06298d514Db089934071355E5743bf21d60", "Binance Hot Wallet");
        book.insert("0x3f5CE5FBFe3E9af3971dD833D26bA9b5C936f0bE", "Binance");
        book.insert("0x5754284f345afc66a98fbB0a0Afe71e0F007B949", "Tether Treasury");
        book.insert("0x742e35Cc6634C0532925a3b8C17f83f85D1d5Eed", "Coinbase");
        book.insert("0x71C7656EC7ab88b098defB751B7401B5f6d8976F", "Kraken");
        book.insert("0x8ba1f109551bD432803012645Hac136c22C501e5", "Render Network");
        book.insert("0x59448FE20378357F206880C58068f095ae63d5A5", "OKX");

        // Bitcoin
        book.insert("bc1qm34lsc65zpw79lxes69zkqmk6ee3ewf0j77s3h", "Binance Hot Wallet");
        book.insert("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", "Genesis Address");
        book.insert("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", "Binance Cold Storage");
        book.insert("1MP1oHwb8KJJjJGLK1CfAZwgZMjE4TjHe3", "Coinbase");
        book.insert("3Kzh9qAqVWQhEsfQz7zEQL1EuSx5tyNLNS", "Bitfinex");

        book
    }

    pub fn insert(&mut self, address: &str, label: &str) {
        self.labels.insert(address.to_string(), label.to_string());
    }

    /// Label for an address, or [`UNKNOWN_WALLET`].
    pub fn classify<'a>(&'a self, address: &str) -> &'a str {
        self.labels
            .get(address)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_WALLET)
    }
}

impl Default for AddressBook {
    fn default() -> Self {
        Self::with_known_entities()
    }
}

/// Derive a transfer type from the counterparty labels of an account-model
/// transfer (Ethereum and friends).
///
/// Rules, first match wins:
/// - from a treasury wallet: treasury_mint
/// - from a protocol wallet (Render Network): protocol_treasury
/// - from an estate/recovery wallet: recovery_transfer
/// - unknown wallet into Binance/OKX: exchange_inflow
/// - Binance/Coinbase into an unknown wallet: exchange_outflow
/// - anything else: large_transfer
pub fn transfer_type_between(from_label: &str, to_label: &str) -> TransferType {
    if from_label.contains("Treasury") {
        return TransferType::TreasuryMint;
    }
    if from_label.contains("Render Network") {
        return TransferType::ProtocolTreasury;
    }
    if from_label.contains("FTX Recovery") {
        return TransferType::RecoveryTransfer;
    }
    if from_label.contains("Unknown") && (to_label.contains("Binance") || to_label.contains("OKX")) {
        return TransferType::ExchangeInflow;
    }
    if (from_label.contains("Binance") || from_label.contains("Coinbase"))
        && to_label.contains("Unknown")
    {
        return TransferType::ExchangeOutflow;
    }
    TransferType::LargeTransfer
}

/// Derive a transfer type from the destination label of a UTXO-model
/// transfer, where only the dominant output is classified.
///
/// Rules, first match wins:
/// - cold-storage wallet: cold_storage_move
/// - Binance/Coinbase wallet: exchange_outflow
/// - the genesis address: historic_move
/// - anything else: large_transfer
pub fn btc_transfer_type(label: &str) -> TransferType {
    if label.contains("Cold Storage") {
        return TransferType::ColdStorageMove;
    }
    if label.contains("Binance") || label.contains("Coinbase") {
        return TransferType::ExchangeOutflow;
    }
    if label.contains("Genesis") {
        return TransferType::HistoricMove;
    }
    TransferType::LargeTransfer
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_and_unknown() {
        let book = AddressBook::with_known_entities();
        assert_eq!(
            book.classify("0x5754284f345afc66a98fbB0a0Afe71e0F007B949"),
            "Tether Treasury"
        );
        assert_eq!(
            book.classify("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"),
            "Binance Cold Storage"
        );
        assert_eq!(book.classify("0xdeadbeef"), UNKNOWN_WALLET);
    }

    #[test]
    fn classify_after_insert() {
        let mut book = AddressBook::empty();
        assert_eq!(book.classify("So1ana111"), UNKNOWN_WALLET);
        book.insert("So1ana111", "Jump Trading");
        assert_eq!(book.classify("So1ana111"), "Jump Trading");
    }

    #[test]
    fn treasury_rule_beats_exchange_rules() {
        assert_eq!(
            transfer_type_between("Tether Treasury", "Binance"),
            TransferType::TreasuryMint
        );
    }

    #[test]
    fn inflow_and_outflow_direction() {
        assert_eq!(
            transfer_type_between(UNKNOWN_WALLET, "Binance Hot Wallet"),
            TransferType::ExchangeInflow
        );
        assert_eq!(
            transfer_type_between(UNKNOWN_WALLET, "OKX"),
            TransferType::ExchangeInflow
        );
        assert_eq!(
            transfer_type_between("Coinbase", UNKNOWN_WALLET),
            TransferType::ExchangeOutflow
        );
        // Exchange to exchange matches neither direction rule
        assert_eq!(
            transfer_type_between("Coinbase", "Kraken"),
            TransferType::LargeTransfer
        );
    }

    #[test]
    fn btc_rules_precedence() {
        // Cold storage wins over the Binance substring
        assert_eq!(
            btc_transfer_type("Binance Cold Storage"),
            TransferType::ColdStorageMove
        );
        assert_eq!(btc_transfer_type("Binance Hot Wallet"), TransferType::ExchangeOutflow);
        assert_eq!(btc_transfer_type("Genesis Address"), TransferType::HistoricMove);
        assert_eq!(btc_transfer_type(UNKNOWN_WALLET), TransferType::LargeTransfer);
    }
}
