use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Role a wallet plays in custody.
pub enum WalletKind {
    Deposit,
    Fee,
    Hot,
    Warm,
    Cold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    #[default]
    Active,
    Disabled,
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WalletKind::Deposit => "deposit",
            WalletKind::Fee => "fee",
            WalletKind::Hot => "hot",
            WalletKind::Warm => "warm",
            WalletKind::Cold => "cold",
        };
        f.write_str(s)
    }
}
