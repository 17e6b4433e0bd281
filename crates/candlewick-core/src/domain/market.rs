use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Instrument category; decides which provider chain serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketClass {
    Crypto,
    Equity,
    DepositaryReceipt,
}

impl MarketClass {
    pub const ALL: [Self; 3] = [Self::Crypto, Self::Equity, Self::DepositaryReceipt];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Equity => "equity",
            Self::DepositaryReceipt => "depositary-receipt",
        }
    }

    /// Equities and depositary receipts share the equity provider chain.
    pub const fn is_equity_like(self) -> bool {
        matches!(self, Self::Equity | Self::DepositaryReceipt)
    }
}

impl Display for MarketClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketClass {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "crypto" => Ok(Self::Crypto),
            "equity" | "stock" | "stocks" => Ok(Self::Equity),
            "depositary-receipt" | "depositary_receipt" | "cedear" | "cedears" => {
                Ok(Self::DepositaryReceipt)
            }
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_market_aliases() {
        assert_eq!(MarketClass::from_str("CRYPTO").expect("valid"), MarketClass::Crypto);
        assert_eq!(MarketClass::from_str("Stocks").expect("valid"), MarketClass::Equity);
        assert_eq!(
            MarketClass::from_str("cedears").expect("valid"),
            MarketClass::DepositaryReceipt
        );
    }

    #[test]
    fn rejects_unknown_market() {
        let err = MarketClass::from_str("forex").expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::InvalidMarket {
                value: String::from("forex")
            }
        );
    }
}
