use crate::BalanceError;
use mendeleev::{ALL_ELEMENTS, Element};
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::FromStr;


/// A struct that represents a chemical compound (e.g. H2O, Ca(OH)2, CuSO4·5H2O)
///
/// Elements are stored in the order in which they first appear in the formula.
/// # Example
/// ```
/// use equibal::Compound;
/// use mendeleev::Element;
///
/// let compound: Compound = "Ca(OH)2".parse().unwrap();
///
/// assert_eq!(compound.original_str(), "Ca(OH)2");
/// assert_eq!(compound.elements(), &[(Element::Ca, 1), (Element::O, 2), (Element::H, 2)]);
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Compound {
    /// String from which the compound was parsed
    original_str: String,
    /// Elements and their quantities, in first-occurrence order
    elements: Vec<(Element, u64)>,
}
impl Compound {
    /// Returns the original string from which the compound was parsed
    pub fn original_str(&self) -> &str {
        &self.original_str
    }

    /// Returns elements and their quantities in the compound
    /// For example, in the compound H2SO4 this is [(H, 2), (S, 1), (O, 4)]
    pub fn elements(&self) -> &[(Element, u64)] {
        &self.elements
    }

    /// Returns the distinct elements of the compound, in first-occurrence order
    pub fn atoms(&self) -> impl Iterator<Item = Element> + '_ {
        self.elements.iter().map(|&(element, _)| element)
    }

    /// Returns the number of atoms of `element` in the compound (0 if absent)
    /// # Example
    /// ```
    /// use equibal::Compound;
    /// use mendeleev::Element;
    ///
    /// let compound: Compound = "Fe2(SO4)3".parse().unwrap();
    ///
    /// assert_eq!(compound.count(Element::O), 12);
    /// assert_eq!(compound.count(Element::H), 0);
    /// ```
    pub fn count(&self, element: Element) -> u64 {
        self.elements
            .iter()
            .find(|(e, _)| *e == element)
            .map_or(0, |&(_, q)| q)
    }
}

impl FromStr for Compound {
    type Err = BalanceError;

    /// Parses a formula in plain notation
    ///
    /// Supports nested groups `()`, `[]`, `{}` with multipliers and adduct parts
    /// separated by `.`, `·` or `*`, each optionally prefixed with a multiplier.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            original_str: input.to_string(),
            elements: parse_formula(input)?,
        })
    }
}

impl Display for Compound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.original_str)
    }
}


#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Token {
    Element(Element),
    Number(u64),
    Open(char),
    Close(char),
    Adduct,
}

fn invalid(input: &str, position: usize, reason: &'static str) -> BalanceError {
    BalanceError::InvalidFormula {
        formula: input.to_string(),
        position,
        reason,
    }
}

/// Splits formula into tokens, each paired with its char position
fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, BalanceError> {
    let letters: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();

    let mut i = 0;
    while i < letters.len() {
        let start = i;
        match letters[i] {
            'A'..='Z' => {
                i += 1;
                while i < letters.len() && letters[i].is_ascii_lowercase() {
                    i += 1;
                }
                let symbol = letters[start..i].iter().collect::<String>();
                let element = ALL_ELEMENTS
                    .iter()
                    .find(|e| e.symbol() == symbol)
                    .copied()
                    .ok_or_else(|| BalanceError::InvalidElement {
                        formula: input.to_string(),
                        symbol,
                    })?;
                tokens.push((start, Token::Element(element)));
            },
            '0'..='9' => {
                let mut number: u64 = 0;
                while i < letters.len() && letters[i].is_ascii_digit() {
                    let digit = u64::from(letters[i] as u8 - b'0');
                    number = number
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(|| BalanceError::CountOverflow(input.to_string()))?;
                    i += 1;
                }
                tokens.push((start, Token::Number(number)));
            },
            c @ ('(' | '[' | '{') => {
                tokens.push((start, Token::Open(c)));
                i += 1;
            },
            c @ (')' | ']' | '}') => {
                tokens.push((start, Token::Close(c)));
                i += 1;
            },
            '.' | '·' | '*' => {
                tokens.push((start, Token::Adduct));
                i += 1;
            },
            _ => return Err(invalid(input, start, "unexpected character")),
        }
    }

    Ok(tokens)
}

fn closing_for(opener: char) -> char {
    match opener {
        '[' => ']',
        '{' => '}',
        _ => ')',
    }
}

/// Adds `count` atoms of `element`, returns `None` on overflow
fn add_atoms(elements: &mut Vec<(Element, u64)>, element: Element, count: u64) -> Option<()> {
    match elements.iter_mut().find(|(e, _)| *e == element) {
        Some((_, q)) => *q = q.checked_add(count)?,
        None => elements.push((element, count)),
    }
    Some(())
}

/// Adds every element of `group` multiplied by `multiplier`, returns `None` on overflow
fn merge(into: &mut Vec<(Element, u64)>, group: &[(Element, u64)], multiplier: u64) -> Option<()> {
    for &(element, count) in group {
        add_atoms(into, element, count.checked_mul(multiplier)?)?;
    }
    Some(())
}

/// Consumes the subscript following an element or a closed group (1 if there is none)
fn take_subscript<I>(tokens: &mut Peekable<I>, input: &str) -> Result<u64, BalanceError>
where
    I: Iterator<Item = (usize, Token)>,
{
    match tokens.peek().copied() {
        Some((position, Token::Number(0))) => Err(invalid(input, position, "zero subscript")),
        Some((_, Token::Number(number))) => {
            tokens.next();
            Ok(number)
        },
        _ => Ok(1),
    }
}

fn parse_formula(input: &str) -> Result<Vec<(Element, u64)>, BalanceError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(invalid(input, 0, "empty formula"));
    }
    let overflow = || BalanceError::CountOverflow(input.to_string());

    // atoms of all finished adduct parts
    let mut total = Vec::new();
    // current adduct part and its multiplier
    let mut part = Vec::new();
    let mut part_multiplier = 1;
    // open groups of the current part: (position, opener, atoms)
    let mut groups: Vec<(usize, char, Vec<(Element, u64)>)> = Vec::new();

    let mut tokens = tokens.into_iter().peekable();
    while let Some((position, token)) = tokens.next() {
        match token {
            Token::Element(element) => {
                let count = take_subscript(&mut tokens, input)?;
                let current = groups.last_mut().map_or(&mut part, |(_, _, atoms)| atoms);
                add_atoms(current, element, count).ok_or_else(overflow)?;
            },
            Token::Open(opener) => groups.push((position, opener, Vec::new())),
            Token::Close(closer) => {
                let (_, opener, atoms) = groups
                    .pop()
                    .ok_or_else(|| invalid(input, position, "unmatched closing bracket"))?;
                if closing_for(opener) != closer {
                    return Err(invalid(input, position, "mismatched closing bracket"));
                }
                if atoms.is_empty() {
                    return Err(invalid(input, position, "empty group"));
                }
                let multiplier = take_subscript(&mut tokens, input)?;
                let current = groups.last_mut().map_or(&mut part, |(_, _, atoms)| atoms);
                merge(current, &atoms, multiplier).ok_or_else(overflow)?;
            },
            Token::Number(_) if position == 0 => {
                return Err(invalid(input, position, "formula cannot start with a coefficient"));
            },
            Token::Number(_) => return Err(invalid(input, position, "unexpected number")),
            Token::Adduct => {
                if let Some(&(open_position, _, _)) = groups.last() {
                    return Err(invalid(input, open_position, "unclosed bracket"));
                }
                if part.is_empty() {
                    return Err(invalid(input, position, "empty adduct part"));
                }
                merge(&mut total, &part, part_multiplier).ok_or_else(overflow)?;
                part.clear();

                part_multiplier = match tokens.peek().copied() {
                    Some((multiplier_position, Token::Number(0))) => {
                        return Err(invalid(input, multiplier_position, "zero multiplier"));
                    },
                    Some((_, Token::Number(multiplier))) => {
                        tokens.next();
                        multiplier
                    },
                    _ => 1,
                };
            },
        }
    }

    if let Some(&(open_position, _, _)) = groups.last() {
        return Err(invalid(input, open_position, "unclosed bracket"));
    }
    if part.is_empty() {
        return Err(invalid(input, input.chars().count(), "empty adduct part"));
    }
    merge(&mut total, &part, part_multiplier).ok_or_else(overflow)?;

    Ok(total)
}
