pub mod classifier;
pub mod predictor;

pub use classifier::{btc_transfer_type, transfer_type_between, AddressBook, UNKNOWN_WALLET};
pub use predictor::predict_market_impact;
