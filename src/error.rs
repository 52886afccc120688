use thiserror::Error;

/// Errors that can occur while parsing formulas or balancing an equation
#[derive(Clone, Debug, Eq, Hash, PartialEq, Error)]
pub enum BalanceError {
    /// Formula could not be parsed
    #[error("invalid formula `{formula}` at position {position}: {reason}")]
    InvalidFormula {
        formula: String,
        position: usize,
        reason: &'static str,
    },
    /// Formula contains a symbol that is not in the periodic table
    #[error("invalid element `{symbol}` in formula `{formula}`")]
    InvalidElement { formula: String, symbol: String },
    /// Atom count of a formula does not fit into 64 bits
    #[error("atom count overflow in formula `{0}`")]
    CountOverflow(String),

    /// Entered equation is invalid
    #[error("invalid equation: {0}")]
    InvalidEquation(String),
    /// There should be exactly one arrow in the equation
    #[error("there should be exactly one arrow in the equation")]
    InvalidArrowCount,
    /// Reactant or product side has no compounds
    #[error("equation has no {0}")]
    EmptySide(&'static str),

    /// Only the trivial solution exists, or no solution with positive coefficients
    #[error("equation cannot be balanced")]
    Unbalanceable,
    /// Composition matrix has more than one free variable
    #[error("equation has {free_variables} independent solutions, expected exactly one")]
    Underdetermined { free_variables: usize },
    /// Raw coefficient vector cannot be rescaled (zero smallest coefficient)
    #[error("coefficient vector is degenerate")]
    NumericDegeneracy,
    /// Balanced coefficient does not fit into 64 bits
    #[error("stoichiometric coefficient does not fit into 64 bits")]
    CoefficientOverflow,
}
