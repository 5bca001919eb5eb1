pub mod import;
pub mod opendax;
pub mod wallet;

pub use import::{
    BlockchainRecord, CurrencyRecord, ImportReport, ImportSection, SectionReport, WalletRecord,
};
pub use wallet::{WalletKind, WalletStatus};
