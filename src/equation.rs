use crate::{balance_compounds, BalanceError, BalanceOptions, Compound};
use std::iter::zip;
use std::str::FromStr;


/// Arrows accepted between reactants and products, longer arrows are matched first
pub const ARROWS: [&str; 8] = ["<=>", "<->", "->", "=>", "→", "⟶", "⇌", "="];

/// A struct that represents a chemical equation (e.g. 2H2 + O2 -> 2H2O)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Equation {
    /// String from which the equation was parsed
    original_str: String,
    /// Arrow used in the equation
    arrow: String,
    /// A vector of reactants
    reactants: Vec<Compound>,
    /// A vector of products
    products: Vec<Compound>,
    /// A vector of solutions for reactants (stoichiometric coefficients)
    solutions_reactants: Option<Vec<u64>>,
    /// A vector of solutions for products (stoichiometric coefficients)
    solutions_products: Option<Vec<u64>>,
}
impl Equation {
    /// Solves the equation with default options
    /// # Returns
    /// * `Ok` - if the equation was solved successfully
    /// * `Err` - if the equation was not solved successfully
    pub fn solve(&mut self) -> Result<(), BalanceError> {
        self.solve_with(&BalanceOptions::default())
    }

    /// Solves the equation
    /// # Arguments
    /// * `options` - rescaling strategy and handling of underdetermined systems
    /// # Returns
    /// * `Ok` - if the equation was solved successfully
    /// * `Err` - if the equation was not solved successfully, previous solutions are kept
    pub fn solve_with(&mut self, options: &BalanceOptions) -> Result<(), BalanceError> {
        let solutions = balance_compounds(&self.reactants, &self.products, options)?;
        let (reactants_solutions, products_solutions) = solutions.split_at(self.reactants.len());

        self.solutions_reactants = Some(reactants_solutions.to_vec());
        self.solutions_products = Some(products_solutions.to_vec());

        Ok(())
    }

    /// Returns the original string from which the equation was parsed
    /// # Example
    /// ```
    /// use equibal::Equation;
    ///
    /// let equation_str = "H2 + O2 -> H2O";
    /// let equation: Equation = equation_str.parse().unwrap();
    ///
    /// assert_eq!(equation.original_str(), equation_str);
    /// ```
    pub fn original_str(&self) -> &str {
        &self.original_str
    }

    /// Returns the arrow used in the equation
    pub fn arrow(&self) -> &str {
        &self.arrow
    }

    /// Returns the vector of reactants
    pub fn reactants(&self) -> &Vec<Compound> {
        &self.reactants
    }

    /// Returns the vector of products
    pub fn products(&self) -> &Vec<Compound> {
        &self.products
    }

    /// Returns the vector of solutions for reactants (stoichiometric coefficients)
    /// # Example
    /// ```
    /// use equibal::Equation;
    ///
    /// let mut equation: Equation = "H2 + O2 -> H2O".parse().unwrap();
    /// assert_eq!(equation.solution_reactants(), None);
    ///
    /// equation.solve().unwrap();
    /// assert_eq!(equation.solution_reactants().unwrap(), &[2, 1]);
    /// ```
    pub fn solution_reactants(&self) -> Option<&Vec<u64>> {
        self.solutions_reactants.as_ref()
    }

    /// Returns the vector of solutions for products (stoichiometric coefficients)
    pub fn solution_products(&self) -> Option<&Vec<u64>> {
        self.solutions_products.as_ref()
    }

    /// Returns the solution of the equation as a string, coefficients equal to 1 are omitted
    /// # Example
    /// ```
    /// use equibal::Equation;
    ///
    /// let mut equation: Equation = "Fe + O2 => Fe2O3".parse().unwrap();
    /// equation.solve().unwrap();
    ///
    /// assert_eq!(equation.solution_str().unwrap(), "4Fe + 3O2 => 2Fe2O3");
    /// ```
    pub fn solution_str(&self) -> Option<String> {
        let sols_reacts = self.solutions_reactants.as_ref()?;
        let sols_prods = self.solutions_products.as_ref()?;

        let side_str = |compounds: &[Compound], solutions: &[u64]| -> String {
            zip(compounds, solutions)
                .map(|(compound, &quantity)| {
                    if quantity == 1 {
                        compound.original_str().to_string()
                    } else {
                        format!("{}{}", quantity, compound.original_str())
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };

        Some(format!(
            "{} {} {}",
            side_str(&self.reactants, sols_reacts),
            self.arrow,
            side_str(&self.products, sols_prods),
        ))
    }
}

impl FromStr for Equation {
    type Err = BalanceError;

    /// Parses an equation such as `H2 + O2 -> H2O`
    ///
    /// The equation should contain exactly one arrow from [`ARROWS`].
    /// Compounds are separated by `+`; a leading coefficient on a compound is ignored,
    /// it is recomputed when the equation is solved.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        // find the only arrow, longer arrows are removed before shorter ones are counted
        let mut arrow = None;
        let mut rest = input.to_string();
        for candidate in ARROWS {
            let count = rest.matches(candidate).count();
            if count == 0 { continue; }
            if count > 1 || arrow.is_some() { return Err(BalanceError::InvalidArrowCount); }
            arrow = Some(candidate);
            rest = rest.replace(candidate, " ");
        }
        let arrow = arrow.ok_or(BalanceError::InvalidArrowCount)?;
        let (reactants_str, products_str) = input.split_once(arrow).ok_or(BalanceError::InvalidArrowCount)?;

        Ok(Self {
            original_str: String::from(input),
            arrow: String::from(arrow),
            reactants: parse_side(reactants_str, "reactants")?,
            products: parse_side(products_str, "products")?,
            solutions_reactants: None,
            solutions_products: None,
        })
    }
}

/// Parses one side of the equation
fn parse_side(side: &str, name: &'static str) -> Result<Vec<Compound>, BalanceError> {
    if side.trim().is_empty() { return Err(BalanceError::EmptySide(name)); }

    side.split('+')
        .map(|term| {
            let formula = term
                .trim()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start();
            if formula.is_empty() {
                return Err(BalanceError::InvalidEquation(format!("empty compound in {}", name)));
            }
            formula.parse()
        })
        .collect()
}
