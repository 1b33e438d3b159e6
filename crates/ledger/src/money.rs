use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

const THOUSANDS_SEPARATOR: char = '.';

/// Whole-unit amount of a transaction (no fractional part, ever).
///
/// An `Amount` built through parsing is always strictly positive.
///
/// # Examples
///
/// ```rust
/// use ledger::Amount;
///
/// let amount: Amount = "Rp 15.000".parse().unwrap();
/// assert_eq!(amount.units(), 15_000);
/// assert_eq!(amount.to_string(), "15.000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    /// Keeps only the ASCII digits of `s` and reads them as a base-10 number.
    ///
    /// Separators, currency symbols and signs are all discarded, so
    /// `"Rp 12,500"` and `"12.500"` both give 12500. A leading minus is
    /// dropped too: `"-5"` reads as 5.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(LedgerError::EmptyAmount);
        }

        let units: u64 = digits.parse().map_err(|_| LedgerError::AmountTooLarge)?;
        if units == 0 {
            return Err(LedgerError::AmountNotPositive);
        }

        Ok(Amount(units))
    }
}

/// Parses free text typed by the user into an [`Amount`].
pub fn parse_amount(input: &str) -> Result<Amount, LedgerError> {
    input.parse()
}

/// Groups the digits of `units` by thousands, e.g. `1234567` -> `"1.234.567"`.
#[must_use]
pub fn format_amount(units: u64) -> String {
    let digits = units.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    out
}
