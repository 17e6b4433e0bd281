use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest accepted symbol, after trimming.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Uppercase instrument identifier: a ticker (`AAPL`), a ticker with an
/// exchange suffix (`AAPL.BA`, `BRK-B`) or a trading pair (`BTCUSDT`,
/// `1INCHUSDT`). The first character must be a letter or digit.
///
/// Cache keys and provider calls only ever see the normalized form, so
/// `btcusdt`, ` BtcUsdt ` and `BTCUSDT` address the same series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();

        let Some(first) = normalized.chars().next() else {
            return Err(ValidationError::EmptySymbol);
        };
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len: normalized.len(),
                max: MAX_SYMBOL_LEN,
            });
        }
        if !first.is_ascii_alphanumeric() {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }
        if let Some((index, ch)) = normalized
            .char_indices()
            .find(|(_, ch)| !matches!(ch, 'A'..='Z' | '0'..='9' | '.' | '-'))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
