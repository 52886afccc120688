//! Balancing configuration.


/// Strategy for turning raw rational coefficients into integers
///
/// Both strategies first divide every coefficient by the smallest one (in absolute value).
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Rescale {
    /// Multiply by the least common multiple of denominators, then divide by the greatest common divisor
    #[default]
    Exact,
    /// Round to `places` decimal places, multiply by the power of ten that clears the longest
    /// fraction, then divide by the greatest common divisor
    ///
    /// This is a heuristic: a ratio such as 4/3 is rounded and the result will not conserve atoms,
    /// which is then reported as [`BalanceError::Unbalanceable`](crate::BalanceError::Unbalanceable).
    /// `places` above [`Rescale::MAX_DECIMAL_PLACES`] is treated as that maximum.
    Decimal { places: u32 },
}
impl Rescale {
    /// Number of decimal places used by [`Rescale::decimal`]
    pub const DEFAULT_DECIMAL_PLACES: u32 = 6;
    /// Largest number of decimal places [`Rescale::Decimal`] rounds to
    pub const MAX_DECIMAL_PLACES: u32 = 30;

    /// Decimal rescaling with [`Rescale::DEFAULT_DECIMAL_PLACES`]
    pub fn decimal() -> Self {
        Self::Decimal { places: Self::DEFAULT_DECIMAL_PLACES }
    }
}

/// Options for [`balance_with`](crate::balance_with) and [`Equation::solve_with`](crate::Equation::solve_with)
///
/// # Example
/// ```
/// use equibal::{BalanceOptions, Rescale};
///
/// let options = BalanceOptions {
///     rescale: Rescale::decimal(),
///     ..Default::default()
/// };
///
/// assert!(!options.allow_underdetermined);
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct BalanceOptions {
    /// How raw coefficients are turned into integers
    pub rescale: Rescale,
    /// Accept systems with more than one free variable by fixing every free variable to 1
    ///
    /// The result is one of many valid balancings and is not guaranteed to be meaningful.
    /// When `false` (the default), such systems fail with
    /// [`BalanceError::Underdetermined`](crate::BalanceError::Underdetermined).
    pub allow_underdetermined: bool,
}
