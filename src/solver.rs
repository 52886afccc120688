use crate::{BalanceError, BalanceOptions, Compound, Rescale};
use malachite::num::arithmetic::traits::{Abs, Gcd, Lcm, Pow};
use malachite::num::basic::traits::{One, Zero};
use malachite::{Natural, Rational};
use mendeleev::Element;
use tracing::{debug, trace, warn};


/// Matrix of exact rational numbers, stored row by row
pub type Matrix = Vec<Vec<Rational>>;

/// Balances reactants against products
/// # Arguments
/// * `reactants` - compounds on the left side of the equation
/// * `products` - compounds on the right side of the equation
/// * `options` - rescaling strategy and handling of underdetermined systems
/// # Returns
/// * `Ok` - minimal positive stoichiometric coefficients, reactants first, then products
/// * `Err` - error that occurred during balancing
/// # Example
/// ```
/// use equibal::{balance_compounds, BalanceOptions, Compound};
///
/// let reactants: Vec<Compound> = vec!["Fe".parse().unwrap(), "O2".parse().unwrap()];
/// let products: Vec<Compound> = vec!["Fe2O3".parse().unwrap()];
///
/// let coefficients = balance_compounds(&reactants, &products, &BalanceOptions::default()).unwrap();
/// assert_eq!(coefficients, vec![4, 3, 2]);
/// ```
pub fn balance_compounds(reactants: &[Compound], products: &[Compound], options: &BalanceOptions) -> Result<Vec<u64>, BalanceError> {
    if reactants.is_empty() { return Err(BalanceError::EmptySide("reactants")); }
    if products.is_empty() { return Err(BalanceError::EmptySide("products")); }

    let compounds = reactants.iter().chain(products).cloned().collect::<Vec<_>>();

    let atoms = atom_universe(&compounds);
    let matrix = composition_matrix(&compounds, &atoms, reactants.len());
    debug!(atoms = atoms.len(), compounds = compounds.len(), "built composition matrix");

    let reduced = reduced_row_echelon(matrix);
    debug!(rank = reduced.rank(), nullity = reduced.nullity(), "reduced composition matrix");

    match reduced.nullity() {
        0 => return Err(BalanceError::Unbalanceable),
        1 => {},
        free_variables if !options.allow_underdetermined => {
            return Err(BalanceError::Underdetermined { free_variables });
        },
        free_variables => {
            warn!(free_variables, "underdetermined system, fixing every free variable to 1");
        },
    }

    let raw = raw_coefficients(&reduced);
    trace!(raw = ?raw, "derived raw coefficients");

    let integers = integer_coefficients(&raw, options.rescale)?;
    if !is_conserved(&compounds, &atoms, reactants.len(), &integers) {
        return Err(BalanceError::Unbalanceable);
    }

    let coefficients = integers
        .iter()
        .map(|x| u64::try_from(x).map_err(|_| BalanceError::CoefficientOverflow))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(coefficients = ?coefficients, "balanced equation");

    Ok(coefficients)
}

/// Collects distinct elements of all compounds, in first-occurrence order
/// # Example
/// ```
/// use equibal::{atom_universe, Compound};
/// use mendeleev::Element;
///
/// let compounds: Vec<Compound> = vec!["NaOH".parse().unwrap(), "H2SO4".parse().unwrap()];
///
/// assert_eq!(atom_universe(&compounds), vec![Element::Na, Element::O, Element::H, Element::S]);
/// ```
pub fn atom_universe(compounds: &[Compound]) -> Vec<Element> {
    let mut atoms = Vec::new();
    for atom in compounds.iter().flat_map(Compound::atoms) {
        if !atoms.contains(&atom) {
            atoms.push(atom);
        }
    }
    atoms
}

/// Builds the signed composition matrix (one row per atom, one column per compound)
///
/// Reactant columns hold atom counts as they are, product columns hold negated counts,
/// so every row reads "reactant atoms - product atoms = 0".
/// # Arguments
/// * `compounds` - reactants followed by products
/// * `atoms` - row order, usually from [`atom_universe`]
/// * `reactant_count` - number of leading compounds that are reactants
pub fn composition_matrix(compounds: &[Compound], atoms: &[Element], reactant_count: usize) -> Matrix {
    atoms
        .iter()
        .map(|&atom| compounds
            .iter()
            .enumerate()
            .map(|(col, compound)| {
                let count = Rational::from(compound.count(atom));
                if col < reactant_count { count } else { -count }
            })
            .collect()
        )
        .collect()
}

/// Matrix in reduced row echelon form together with its pivot columns
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReducedMatrix {
    rows: Matrix,
    columns: usize,
    /// Pivot column of each nonzero row, strictly increasing
    pivots: Vec<usize>,
}
impl ReducedMatrix {
    /// Rows of the reduced matrix, zero rows last
    pub fn rows(&self) -> &Matrix {
        &self.rows
    }

    /// Consumes the reduced matrix and returns its rows
    pub fn into_rows(self) -> Matrix {
        self.rows
    }

    /// Number of columns (one per compound)
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Pivot column of each nonzero row
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    /// Number of nonzero rows
    pub fn rank(&self) -> usize {
        self.pivots.len()
    }

    /// Number of free variables (columns without a pivot)
    pub fn nullity(&self) -> usize {
        self.columns - self.rank()
    }
}

/// Reduces matrix to reduced row echelon form (Gauss-Jordan elimination)
///
/// Takes ownership of the matrix, so the caller's copy is never modified.
/// Rank-deficient and inconsistent systems are not errors: they simply leave zero rows
/// and columns without a pivot, see [`ReducedMatrix::nullity`].
/// # Example
/// ```
/// use equibal::reduced_row_echelon;
/// use malachite::Rational;
/// use std::str::FromStr;
///
/// // H2 + O2 -> H2O
/// let matrix = vec![
///     vec![Rational::from(2), Rational::from(0), Rational::from(-2)],
///     vec![Rational::from(0), Rational::from(2), Rational::from(-1)],
/// ];
///
/// let reduced = reduced_row_echelon(matrix);
///
/// assert_eq!(reduced.pivots(), &[0, 1]);
/// assert_eq!(reduced.nullity(), 1);
/// assert_eq!(reduced.rows(), &vec![
///     vec![Rational::from(1), Rational::from(0), Rational::from(-1)],
///     vec![Rational::from(0), Rational::from(1), Rational::from_str("-1/2").unwrap()],
/// ]);
/// ```
pub fn reduced_row_echelon(mut matrix: Matrix) -> ReducedMatrix {
    let rows = matrix.len();
    let columns = matrix.first().map_or(0, Vec::len);
    let mut pivots = Vec::new();

    let mut r = 0;
    let mut lead = 0;
    while r < rows && lead < columns {
        // first row (at or below r) with a nonzero entry in the lead column
        let Some(i) = (r..rows).find(|&i| matrix[i][lead] != Rational::ZERO) else {
            lead += 1;
            continue;
        };
        matrix.swap(i, r);

        let pivot = matrix[r][lead].clone();
        for x in matrix[r].iter_mut() {
            *x /= &pivot;
        }

        let pivot_row = matrix[r].clone();
        for (other, row) in matrix.iter_mut().enumerate() {
            if other == r || row[lead] == Rational::ZERO {
                continue;
            }
            let factor = row[lead].clone();
            for (x, p) in row.iter_mut().zip(&pivot_row) {
                *x -= &factor * p;
            }
        }

        pivots.push(lead);
        r += 1;
        lead += 1;
    }

    ReducedMatrix { rows: matrix, columns, pivots }
}

/// Reads one raw coefficient per compound out of the reduced matrix
///
/// Every free variable is fixed to 1, so a pivot row `x_p + sum(a_j * x_j) = 0` gives
/// `x_p = -sum(a_j)` over the entries right of the pivot. A pivot variable that comes out
/// as exactly zero is replaced by 1.
/// # Example
/// ```
/// use equibal::{raw_coefficients, reduced_row_echelon};
/// use malachite::Rational;
/// use std::str::FromStr;
///
/// // C3H8 + O2 -> CO2 + H2O
/// let matrix = vec![
///     vec![Rational::from(3), Rational::from(0), Rational::from(-1), Rational::from(0)],
///     vec![Rational::from(8), Rational::from(0), Rational::from(0), Rational::from(-2)],
///     vec![Rational::from(0), Rational::from(2), Rational::from(-2), Rational::from(-1)],
/// ];
///
/// let raw = raw_coefficients(&reduced_row_echelon(matrix));
///
/// assert_eq!(raw, vec![
///     Rational::from_str("1/4").unwrap(),
///     Rational::from_str("5/4").unwrap(),
///     Rational::from_str("3/4").unwrap(),
///     Rational::from(1),
/// ]);
/// ```
pub fn raw_coefficients(reduced: &ReducedMatrix) -> Vec<Rational> {
    let mut coefficients = vec![Rational::ONE; reduced.columns()];
    for (row, &pivot) in reduced.rows().iter().zip(reduced.pivots()) {
        let sum = row[pivot + 1..].iter().fold(Rational::ZERO, |acc, x| acc + x);
        coefficients[pivot] = if sum == Rational::ZERO { Rational::ONE } else { -sum };
    }
    coefficients
}

/// Rescales raw coefficients into the minimal tuple of nonnegative integers
/// # Returns
/// * `Ok` - absolute values of the rescaled coefficients, their greatest common divisor is 1
/// * `Err` - [`BalanceError::NumericDegeneracy`] if the vector is empty or its smallest entry is zero
/// # Example
/// ```
/// use equibal::{integer_coefficients, Rescale};
/// use malachite::{Natural, Rational};
/// use std::str::FromStr;
///
/// let raw = vec![Rational::from(2), Rational::from_str("3/2").unwrap(), Rational::from(1)];
///
/// let integers = integer_coefficients(&raw, Rescale::Exact).unwrap();
/// assert_eq!(integers, vec![Natural::from(4u32), Natural::from(3u32), Natural::from(2u32)]);
/// ```
pub fn integer_coefficients(raw: &[Rational], rescale: Rescale) -> Result<Vec<Natural>, BalanceError> {
    let smallest = raw
        .iter()
        .map(|x| x.abs())
        .min()
        .ok_or(BalanceError::NumericDegeneracy)?;
    if smallest == Rational::ZERO { return Err(BalanceError::NumericDegeneracy); }

    let normalized = raw.iter().map(|x| x / &smallest).collect::<Vec<_>>();

    let scaled = match rescale {
        Rescale::Exact => {
            // multiply by the least common multiple of denominators to get integers
            let mut lcm = Natural::ONE;
            for x in normalized.iter() {
                lcm = lcm.lcm(x.denominator_ref());
            }
            let factor = Rational::from(&lcm);
            normalized.iter().map(|x| x * &factor).collect::<Vec<_>>()
        },
        Rescale::Decimal { places } => {
            let places = places.min(Rescale::MAX_DECIMAL_PLACES);
            let scale = Natural::from(10u32).pow(u64::from(places));
            let rounded = normalized.iter().map(|x| round_to_scale(x, &scale)).collect::<Vec<_>>();

            let max_places = rounded.iter().map(|x| decimal_places(x, places)).max().unwrap_or(0);
            let factor = Rational::from(Natural::from(10u32).pow(u64::from(max_places)));
            rounded.iter().map(|x| x * &factor).collect::<Vec<_>>()
        },
    };

    // every scaled value is an integer now, numerators carry their absolute values
    let integers = scaled.iter().map(|x| x.numerator_ref().clone()).collect::<Vec<_>>();
    let gcd = integers.iter().fold(Natural::ZERO, |acc, x| acc.gcd(x));
    if gcd == Natural::ZERO { return Err(BalanceError::NumericDegeneracy); }

    Ok(integers.into_iter().map(|x| x / &gcd).collect())
}

/// Rounds `x` to the nearest multiple of `1 / scale` (halves away from zero)
fn round_to_scale(x: &Rational, scale: &Natural) -> Rational {
    let two = Natural::from(2u32);
    let denominator = x.denominator_ref();
    let numerator = x.numerator_ref() * scale;
    let rounded = (&numerator * &two + denominator) / (denominator * &two);

    let value = Rational::from(rounded) / Rational::from(scale);
    if *x < Rational::ZERO { -value } else { value }
}

/// Number of decimal places of `x`, capped at `max`
fn decimal_places(x: &Rational, max: u32) -> u32 {
    let ten = Rational::from(10u32);
    let mut shifted = x.clone();
    for places in 0..max {
        if shifted.denominator_ref() == &Natural::ONE {
            return places;
        }
        shifted *= &ten;
    }
    max
}

/// Checks that every atom is conserved with the given coefficients
pub fn is_conserved(compounds: &[Compound], atoms: &[Element], reactant_count: usize, coefficients: &[Natural]) -> bool {
    atoms.iter().all(|&atom| {
        let mut reactants_side = Natural::ZERO;
        let mut products_side = Natural::ZERO;
        for (col, (compound, coefficient)) in compounds.iter().zip(coefficients).enumerate() {
            let count = Natural::from(compound.count(atom)) * coefficient;
            if col < reactant_count {
                reactants_side += count;
            } else {
                products_side += count;
            }
        }
        reactants_side == products_side
    })
}
