use crate::Result;
use crate::errors::Error;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 1 ether = 10^18 wei
pub const ETHER_DECIMALS: u32 = 18;

/// トークン量（wei 単位）
///
/// 任意精度の符号なし整数。コントラクトとの受け渡しは常にこの単位で行う。
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Wei(BigUint);

impl Wei {
    pub fn of(value: u128) -> Self {
        Wei(BigUint::from(value))
    }

    pub fn zero() -> Self {
        Wei(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Wei(BigUint::from_bytes_be(bytes))
    }

    fn one_ether() -> BigUint {
        BigUint::from(10_u32).pow(ETHER_DECIMALS)
    }

    /// 人間向けの10進数表記（ether 単位）から wei に変換する
    ///
    /// 数値として解釈できない、有限でない、負、または小数点以下が18桁を超える入力は
    /// `Error::InvalidAmount` になる。
    pub fn from_ether_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let number: f64 = trimmed
            .parse()
            .map_err(|_| Error::InvalidAmount(format!("value must be a number: {input:?}")))?;
        if !number.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "value must be finite: {input:?}"
            )));
        }

        if number < 0.0 {
            return Err(Error::InvalidAmount(format!(
                "value must not be negative: {input:?}"
            )));
        }

        // f64 は検証のみに使い、桁は元の文字列から取る
        let decimal = BigDecimal::from_str(trimmed)
            .or_else(|_| BigDecimal::from_str(&number.to_string()))
            .map_err(|e| Error::InvalidAmount(format!("{input:?}: {e}")))?;

        let scaled = decimal * BigDecimal::from(BigInt::from(Self::one_ether()));
        let (digits, exponent) = scaled.normalized().as_bigint_and_exponent();
        if exponent > 0 {
            return Err(Error::InvalidAmount(format!(
                "too many decimal places (max {ETHER_DECIMALS}): {input:?}"
            )));
        }
        let digits = digits * BigInt::from(10_u32).pow(exponent.unsigned_abs() as u32);
        let wei = digits
            .to_biguint()
            .ok_or_else(|| Error::InvalidAmount(format!("value must not be negative: {input:?}")))?;
        Ok(Wei(wei))
    }

    /// ether 単位の10進数文字列にする（末尾の0は落とす）
    pub fn to_ether_string(&self) -> String {
        let one = Self::one_ether();
        let int = &self.0 / &one;
        let frac = &self.0 % &one;
        if frac.is_zero() {
            return int.to_string();
        }
        let padded = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS as usize);
        format!("{int}.{}", padded.trim_end_matches('0'))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Wei::of(value)
    }
}

impl From<BigUint> for Wei {
    fn from(value: BigUint) -> Self {
        Wei(value)
    }
}

impl From<Wei> for BigUint {
    fn from(wei: Wei) -> Self {
        wei.0
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

// JSON では桁落ちしないよう10進数文字列で出す
impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}
