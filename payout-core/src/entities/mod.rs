pub mod blockchain;
pub mod currency;
pub mod wallet;
pub mod withdrawal;

use payout_sdk::objects::{WalletKind as SdkWalletKind, WalletStatus as SdkWalletStatus};

/// Wallet kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `payout_sdk::objects::WalletKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "wallet_kind")]
pub enum WalletKind {
    Deposit,
    Fee,
    Hot,
    Warm,
    Cold,
}

impl From<SdkWalletKind> for WalletKind {
    fn from(value: SdkWalletKind) -> Self {
        match value {
            SdkWalletKind::Deposit => WalletKind::Deposit,
            SdkWalletKind::Fee => WalletKind::Fee,
            SdkWalletKind::Hot => WalletKind::Hot,
            SdkWalletKind::Warm => WalletKind::Warm,
            SdkWalletKind::Cold => WalletKind::Cold,
        }
    }
}

/// Wallet status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "wallet_status")]
pub enum WalletStatus {
    Active,
    Disabled,
}

impl From<SdkWalletStatus> for WalletStatus {
    fn from(value: SdkWalletStatus) -> Self {
        match value {
            SdkWalletStatus::Active => WalletStatus::Active,
            SdkWalletStatus::Disabled => WalletStatus::Disabled,
        }
    }
}
