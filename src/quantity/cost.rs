use std::fmt::{Debug, Display, Formatter};

#[repr(transparent)]
#[derive(
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
    serde::Deserialize,
    serde::Serialize,
    Clone,
    Copy,
    Default,
)]
pub struct Cost(pub f64);

impl Cost {
    pub const ZERO: Self = Self(0.0);
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} DKK", self.0)
    }
}

impl Debug for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}DKK", self.0)
    }
}

ordered_float!(Cost);
