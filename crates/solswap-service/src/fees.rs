// ----- standard library imports
// ----- extra library imports
// ----- local imports
use crate::error::{Error, Result};

// ----- end imports

/// 0.03%
pub const DEFAULT_FEE_NUMERATOR: u64 = 3;
pub const DEFAULT_FEE_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub gross_amount: u64,
    pub fee_amount: u64,
    pub net_amount: u64,
}

/// Fee rate as an exact fraction, strictly below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    numerator: u64,
    denominator: u64,
}

impl std::default::Default for FeeRate {
    fn default() -> Self {
        Self {
            numerator: DEFAULT_FEE_NUMERATOR,
            denominator: DEFAULT_FEE_DENOMINATOR,
        }
    }
}

impl FeeRate {
    pub fn new(numerator: u64, denominator: u64) -> anyhow::Result<Self> {
        anyhow::ensure!(denominator > 0, "fee denominator must be positive");
        anyhow::ensure!(
            numerator < denominator,
            "fee rate {numerator}/{denominator} must be below 1"
        );
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// fee = floor(gross * numerator / denominator), 128-bit intermediate
    pub fn compute_fee(&self, gross_amount: u64) -> Result<FeeBreakdown> {
        if gross_amount == 0 {
            return Err(Error::InvalidAmount(String::from(
                "amount must be greater than zero",
            )));
        }
        let wide = u128::from(gross_amount) * u128::from(self.numerator)
            / u128::from(self.denominator);
        let fee_amount = u64::try_from(wide).map_err(|_| Error::AmountOverflow)?;
        let net_amount = gross_amount
            .checked_sub(fee_amount)
            .ok_or(Error::AmountOverflow)?;
        Ok(FeeBreakdown {
            gross_amount,
            fee_amount,
            net_amount,
        })
    }
}

/// Parses a decimal integer amount in smallest units.
/// Signs, fractions, exponents and values above u64::MAX are rejected.
pub fn parse_amount(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!(
            "{text:?} is not a non-negative integer"
        )));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| Error::InvalidAmount(format!("{text:?} does not fit in 64 bits")))
}
