use crate::error::{DerivationError, DerivationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::ops::{Mul, Neg};
use std::str::FromStr;

/// The sign in front of a term.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Sign {
    /// Composes two signs: the result is `Plus` if and only if both signs are equal.
    pub fn compose(self, other: Sign) -> Sign {
        if self == other {
            Sign::Plus
        } else {
            Sign::Minus
        }
    }

    pub fn flipped(self) -> Sign {
        -self
    }

    pub fn as_char(&self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

impl Default for Sign {
    fn default() -> Self {
        Sign::Plus
    }
}

impl Neg for Sign {
    type Output = Sign;

    fn neg(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

impl Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        self.compose(rhs)
    }
}

impl Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Sign {
    type Err = DerivationError;

    fn from_str(s: &str) -> DerivationResult<Self> {
        match s.trim() {
            "+" => Ok(Sign::Plus),
            "-" => Ok(Sign::Minus),
            other => Err(DerivationError::InvalidRepresentation(format!(
                "sign must be '+' or '-', got \"{}\"",
                other
            ))),
        }
    }
}
