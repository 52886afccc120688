//! Balancing chemical equations with exact arithmetic.
//!
//! Compounds are parsed into atom counts, arranged into a signed composition matrix
//! (reactants positive, products negative) and reduced to reduced row echelon form over
//! [`malachite::Rational`]. With the single free variable fixed to 1 the reduced matrix
//! gives one rational coefficient per compound, which is then rescaled to the smallest
//! positive integers.
//!
//! ```
//! use equibal::balance;
//!
//! let coefficients = balance(&["C3H8", "O2"], &["CO2", "H2O"]).unwrap();
//!
//! assert_eq!(coefficients.to_string(), "C3H8: 1, O2: 5, CO2: 3, H2O: 4");
//! ```

mod compound;
mod equation;
mod error;
mod options;
mod solver;

pub use compound::Compound;
pub use equation::{Equation, ARROWS};
pub use error::BalanceError;
pub use options::{BalanceOptions, Rescale};
pub use solver::{
    atom_universe, balance_compounds, composition_matrix, integer_coefficients, is_conserved,
    raw_coefficients, reduced_row_echelon, Matrix, ReducedMatrix,
};

use std::fmt::{Display, Formatter};


/// Balances an equation given as formula strings, with default options
/// # Arguments
/// * `reactants` - formulas on the left side of the equation
/// * `products` - formulas on the right side of the equation
/// # Returns
/// * `Ok` - coefficient of every formula, in input order
/// * `Err` - error that occurred during parsing or balancing
/// # Example
/// ```
/// use equibal::balance;
///
/// let coefficients = balance(&["H2", "O2"], &["H2O"]).unwrap();
///
/// assert_eq!(coefficients.get("H2"), Some(2));
/// assert_eq!(coefficients.get("O2"), Some(1));
/// assert_eq!(coefficients.get("H2O"), Some(2));
/// ```
pub fn balance<R: AsRef<str>, P: AsRef<str>>(reactants: &[R], products: &[P]) -> Result<Coefficients, BalanceError> {
    balance_with(reactants, products, &BalanceOptions::default())
}

/// Balances an equation given as formula strings
///
/// If the same formula appears more than once, the mapping keeps its first position
/// and the coefficient of its last occurrence.
pub fn balance_with<R: AsRef<str>, P: AsRef<str>>(reactants: &[R], products: &[P], options: &BalanceOptions) -> Result<Coefficients, BalanceError> {
    let reactants = reactants
        .iter()
        .map(|formula| formula.as_ref().parse())
        .collect::<Result<Vec<Compound>, _>>()?;
    let products = products
        .iter()
        .map(|formula| formula.as_ref().parse())
        .collect::<Result<Vec<Compound>, _>>()?;

    let solutions = balance_compounds(&reactants, &products, options)?;

    let mut coefficients = Coefficients::default();
    for (compound, coefficient) in reactants.iter().chain(&products).zip(solutions) {
        coefficients.insert(compound.original_str(), coefficient);
    }
    Ok(coefficients)
}

/// Stoichiometric coefficient of every formula, in insertion order
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Coefficients {
    entries: Vec<(String, u64)>,
}
impl Coefficients {
    /// Sets the coefficient of `formula`, an existing formula keeps its position
    pub fn insert(&mut self, formula: &str, coefficient: u64) {
        match self.entries.iter_mut().find(|(f, _)| f == formula) {
            Some((_, c)) => *c = coefficient,
            None => self.entries.push((formula.to_string(), coefficient)),
        }
    }

    pub fn get(&self, formula: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(f, _)| f == formula)
            .map(|&(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(f, c)| (f.as_str(), *c))
    }
}

impl IntoIterator for Coefficients {
    type Item = (String, u64);
    type IntoIter = std::vec::IntoIter<(String, u64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Display for Coefficients {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, (formula, coefficient)) in self.iter().enumerate() {
            if i != 0 { write!(f, ", ")?; }
            write!(f, "{}: {}", formula, coefficient)?;
        }
        Ok(())
    }
}





#[cfg(test)]
mod tests {
    use super::*;
    use malachite::num::arithmetic::traits::Gcd;
    use proptest::prelude::*;

    const CATALOGUE: [(&[&str], &[&str]); 10] = [
        (&["H2", "O2"], &["H2O"]),
        (&["Fe", "O2"], &["Fe2O3"]),
        (&["NaOH", "H2SO4"], &["Na2SO4", "H2O"]),
        (&["C3H8", "O2"], &["CO2", "H2O"]),
        (&["KNO3", "C12H22O11"], &["N2", "CO2", "H2O", "K2CO3"]),
        (&["Cu", "HNO3"], &["Cu(NO3)2", "NO", "H2O"]),
        (&["Fe2(SO4)3", "KOH"], &["K2SO4", "Fe(OH)3"]),
        (&["NaBr", "NaBrO3", "H2SO4"], &["Br2", "Na2SO4", "H2O"]),
        (&["K4[Fe(SCN)6]", "K2Cr2O7", "H2SO4"], &["Fe2(SO4)3", "Cr2(SO4)3", "CO2", "H2O", "K2SO4", "KNO3"]),
        (&["NH3", "O2"], &["NO", "H2O"]),
    ];

    fn pairs(coefficients: &Coefficients) -> Vec<(&str, u64)> {
        coefficients.iter().collect()
    }

    fn assert_conserved(reactants: &[&str], products: &[&str], coefficients: &Coefficients) {
        let compounds = reactants.iter().chain(products).map(|f| f.parse::<Compound>().unwrap()).collect::<Vec<_>>();
        for atom in atom_universe(&compounds) {
            let side = |formulas: &[&str]| -> u64 {
                formulas
                    .iter()
                    .map(|f| f.parse::<Compound>().unwrap().count(atom) * coefficients.get(f).unwrap())
                    .sum()
            };
            assert_eq!(side(reactants), side(products), "{:?} is not conserved in {}", atom, coefficients);
        }
    }

    #[test]
    fn scenario_water() {
        let coefficients = balance(&["H2", "O2"], &["H2O"]).unwrap();
        assert_eq!(pairs(&coefficients), vec![("H2", 2), ("O2", 1), ("H2O", 2)]);
    }

    #[test]
    fn scenario_rust() {
        let coefficients = balance(&["Fe", "O2"], &["Fe2O3"]).unwrap();
        assert_eq!(pairs(&coefficients), vec![("Fe", 4), ("O2", 3), ("Fe2O3", 2)]);
    }

    #[test]
    fn scenario_neutralization() {
        let coefficients = balance(&["NaOH", "H2SO4"], &["Na2SO4", "H2O"]).unwrap();
        assert_eq!(pairs(&coefficients), vec![("NaOH", 2), ("H2SO4", 1), ("Na2SO4", 1), ("H2O", 2)]);
    }

    #[test]
    fn scenario_propane() {
        let coefficients = balance(&["C3H8", "O2"], &["CO2", "H2O"]).unwrap();
        assert_eq!(pairs(&coefficients), vec![("C3H8", 1), ("O2", 5), ("CO2", 3), ("H2O", 4)]);
    }

    #[test]
    fn scenario_identity() {
        let coefficients = balance(&["H2"], &["H2"]).unwrap();
        assert_eq!(pairs(&coefficients), vec![("H2", 1)]);
        assert_eq!(coefficients.len(), 1);
    }

    #[test]
    fn string_types() {
        let reactants = vec![String::from("H2"), String::from("O2")];
        let coefficients = balance(&reactants, &["H2O"]).unwrap();
        assert_eq!(coefficients.get("O2"), Some(1));
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(matches!(balance(&["H2", "O2"], &["H2Q"]), Err(BalanceError::InvalidElement { .. })));
        assert!(matches!(balance(&["H2", "(O2"], &["H2O"]), Err(BalanceError::InvalidFormula { .. })));
    }

    #[test]
    fn empty_lists() {
        let none: [&str; 0] = [];
        assert_eq!(balance(&none, &["H2O"]), Err(BalanceError::EmptySide("reactants")));
        assert_eq!(balance(&["H2O"], &none), Err(BalanceError::EmptySide("products")));
    }

    #[test]
    fn options_are_applied() {
        let options = BalanceOptions { rescale: Rescale::decimal(), ..Default::default() };
        let coefficients = balance_with(&["C3H8", "O2"], &["CO2", "H2O"], &options).unwrap();
        assert_eq!(coefficients.to_string(), "C3H8: 1, O2: 5, CO2: 3, H2O: 4");

        assert_eq!(
            balance(&["H2", "O2"], &["H2O", "H2O2"]),
            Err(BalanceError::Underdetermined { free_variables: 2 }),
        );
        let options = BalanceOptions { allow_underdetermined: true, ..Default::default() };
        let coefficients = balance_with(&["H2", "O2"], &["H2O", "H2O2"], &options).unwrap();
        assert_eq!(coefficients.to_string(), "H2: 4, O2: 3, H2O: 2, H2O2: 2");
    }

    #[test]
    fn coefficients_keep_first_position() {
        let mut coefficients = Coefficients::default();
        assert!(coefficients.is_empty());

        coefficients.insert("H2", 1);
        coefficients.insert("O2", 2);
        coefficients.insert("H2", 3);

        assert_eq!(pairs(&coefficients), vec![("H2", 3), ("O2", 2)]);
        assert_eq!(coefficients.get("N2"), None);
        assert_eq!(
            coefficients.into_iter().collect::<Vec<_>>(),
            vec![(String::from("H2"), 3), (String::from("O2"), 2)],
        );
    }

    #[test]
    fn catalogue_is_conserved_and_minimal() {
        for (reactants, products) in CATALOGUE {
            let coefficients = balance(reactants, products).unwrap();
            assert_conserved(reactants, products, &coefficients);

            let gcd = coefficients.iter().fold(0u64, |acc, (_, c)| acc.gcd(c));
            assert_eq!(gcd, 1, "{} is not minimal", coefficients);
        }
    }

    #[test]
    fn deterministic() {
        for (reactants, products) in CATALOGUE {
            assert_eq!(balance(reactants, products), balance(reactants, products));
        }
    }

    fn shuffled_equation() -> impl Strategy<Value = (usize, Vec<&'static str>, Vec<&'static str>)> {
        (0..CATALOGUE.len()).prop_flat_map(|i| {
            let (reactants, products) = CATALOGUE[i];
            (Just(i), Just(reactants.to_vec()).prop_shuffle(), Just(products.to_vec()).prop_shuffle())
        })
    }

    proptest! {
        #[test]
        fn order_of_compounds_does_not_matter((i, reactants, products) in shuffled_equation()) {
            let (original_reactants, original_products) = CATALOGUE[i];
            let expected = balance(original_reactants, original_products).unwrap();
            let shuffled = balance(&reactants, &products).unwrap();

            for (formula, coefficient) in expected.iter() {
                prop_assert_eq!(shuffled.get(formula), Some(coefficient));
            }
        }

        #[test]
        fn scaling_a_compound_keeps_ratios(i in 0..CATALOGUE.len(), k in 1u64..6) {
            // replace the first reactant X by (X)k, which only rescales its own coefficient
            let (reactants, products) = CATALOGUE[i];
            let scaled = format!("({}){}", reactants[0], k);
            let scaled_reactants = std::iter::once(scaled.as_str())
                .chain(reactants.iter().skip(1).copied())
                .collect::<Vec<_>>();

            let expected = balance(reactants, products).unwrap();
            let actual = balance(&scaled_reactants, products).unwrap();

            let x = u128::from(expected.get(reactants[0]).unwrap());
            let x_scaled = u128::from(actual.get(&scaled).unwrap());
            for formula in reactants.iter().skip(1).chain(products) {
                let y = u128::from(expected.get(formula).unwrap());
                let y_scaled = u128::from(actual.get(formula).unwrap());
                prop_assert_eq!(y_scaled * x, u128::from(k) * y * x_scaled);
            }
        }

        #[test]
        fn oxygen_multiples(k in 1u64..8) {
            let oxygen = format!("(O2){}", k);
            let coefficients = balance(&["H2", oxygen.as_str()], &["H2O"]).unwrap();

            prop_assert_eq!(coefficients.get("H2"), coefficients.get("H2O"));
            prop_assert_eq!(coefficients.get(&oxygen), Some(1));
        }
    }
}
