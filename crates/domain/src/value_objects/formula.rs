//! Formula evaluation for sheet fields such as weapon damage
//!
//! Supports arithmetic over stat bindings ("Strength/2+1") and dice formulas
//! whose numeric part is folded into a single modifier ("2d6 + STR/2" with
//! Strength 10 displays as "2d6+5"). Formulas are user-authored free text:
//! anything that fails to parse is echoed back unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::{StatBlock, StatName};

/// Largest dice count accepted in a single term.
const MAX_DICE_COUNT: u32 = 100;
/// Largest die size accepted.
const MAX_DIE_SIZE: u32 = 1000;

/// Error when parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaParseError {
    /// The formula string is empty
    #[error("Empty formula")]
    Empty,
    /// A character that cannot start any token
    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),
    /// The formula ended mid-expression
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    /// A token in a position where it is not allowed
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    /// Identifier with no binding
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    /// Dice term that is out of range (e.g. "0d6", "1d1")
    #[error("Invalid dice term: {0}")]
    InvalidDice(String),
    /// Dice may only be added at the top level of a formula
    #[error("Dice terms can only be added, not negated, multiplied or divided")]
    MisplacedDice,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Numeric overflow")]
    Overflow,
}

// =============================================================================
// Bindings
// =============================================================================

/// Named integer values a formula may reference.
///
/// Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaBindings {
    values: HashMap<String, i64>,
}

impl FormulaBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every stat total under its full name and abbreviation, plus `level`.
    pub fn from_stats(stats: &StatBlock, level: u32) -> Self {
        let mut bindings = Self::new().with("level", i64::from(level));
        for (name, stat) in stats.iter() {
            bindings.insert_stat(name, stat.total());
        }
        bindings
    }

    pub fn with(mut self, name: &str, value: i64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_uppercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(&name.to_uppercase()).copied()
    }

    fn insert_stat(&mut self, name: StatName, total: i32) {
        self.insert(name.as_str(), i64::from(total));
        self.insert(name.abbreviation(), i64::from(total));
    }
}

// =============================================================================
// Resolved formula
// =============================================================================

/// A single "XdY" term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceTerm {
    /// Number of dice to roll (X in XdY)
    pub count: u32,
    /// Size of each die (Y in XdY)
    pub sides: u32,
}

impl DiceTerm {
    pub fn new(count: u32, sides: u32) -> Result<Self, FormulaParseError> {
        if count == 0 || count > MAX_DICE_COUNT || sides < 2 || sides > MAX_DIE_SIZE {
            return Err(FormulaParseError::InvalidDice(format!("{}d{}", count, sides)));
        }
        Ok(Self { count, sides })
    }

    pub fn min_roll(&self) -> i64 {
        i64::from(self.count)
    }

    pub fn max_roll(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides)
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// A formula with all variables substituted: dice terms plus one modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFormula {
    /// Dice terms in the order they were written
    pub dice: Vec<DiceTerm>,
    /// Sum of every non-dice term
    pub modifier: i64,
}

impl ResolvedFormula {
    /// Parse `input` and substitute `bindings`.
    pub fn parse(input: &str, bindings: &FormulaBindings) -> Result<Self, FormulaParseError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(FormulaParseError::Empty);
        }
        Parser {
            tokens: &tokens,
            pos: 0,
            bindings,
        }
        .parse_formula()
    }

    pub fn has_dice(&self) -> bool {
        !self.dice.is_empty()
    }

    pub fn min_roll(&self) -> i64 {
        self.dice
            .iter()
            .map(DiceTerm::min_roll)
            .fold(self.modifier, i64::saturating_add)
    }

    pub fn max_roll(&self) -> i64 {
        self.dice
            .iter()
            .map(DiceTerm::max_roll)
            .fold(self.modifier, i64::saturating_add)
    }

    /// Rejects formulas whose extreme rolls do not fit in an `i64`.
    fn check_bounds(&self) -> Result<(), FormulaParseError> {
        let mut low = self.modifier;
        let mut high = self.modifier;
        for term in &self.dice {
            low = low
                .checked_add(term.min_roll())
                .ok_or(FormulaParseError::Overflow)?;
            high = high
                .checked_add(term.max_roll())
                .ok_or(FormulaParseError::Overflow)?;
        }
        Ok(())
    }

    /// Roll every dice term with the supplied RNG.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        let individual_rolls: Vec<Vec<i64>> = self
            .dice
            .iter()
            .map(|term| {
                (0..term.count)
                    .map(|_| i64::from(rng.gen_range(1..=term.sides)))
                    .collect()
            })
            .collect();
        let dice_total = individual_rolls
            .iter()
            .flatten()
            .fold(0, |acc: i64, roll| acc.saturating_add(*roll));

        RollResult {
            formula: self.clone(),
            individual_rolls,
            dice_total,
            total: dice_total.saturating_add(self.modifier),
        }
    }
}

impl fmt::Display for ResolvedFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dice.is_empty() {
            return write!(f, "{}", self.modifier);
        }
        let dice: Vec<String> = self.dice.iter().map(ToString::to_string).collect();
        write!(f, "{}", dice.join("+"))?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// Result of rolling a resolved formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    /// The formula that was rolled
    pub formula: ResolvedFormula,
    /// Individual die results, one list per dice term
    pub individual_rolls: Vec<Vec<i64>>,
    /// Sum of dice before modifier
    pub dice_total: i64,
    /// Final total (dice_total + modifier)
    pub total: i64,
}

impl RollResult {
    /// Format as a breakdown string (e.g., "2d6[4, 5] + 3 = 12")
    pub fn breakdown(&self) -> String {
        let dice: Vec<String> = self
            .formula
            .dice
            .iter()
            .zip(&self.individual_rolls)
            .map(|(term, rolls)| {
                let rolls: Vec<String> = rolls.iter().map(ToString::to_string).collect();
                format!("{}[{}]", term, rolls.join(", "))
            })
            .collect();
        let modifier = self.formula.modifier;
        let head = if dice.is_empty() {
            modifier.to_string()
        } else if modifier > 0 {
            format!("{} + {}", dice.join(" + "), modifier)
        } else if modifier < 0 {
            format!("{} - {}", dice.join(" + "), modifier.unsigned_abs())
        } else {
            dice.join(" + ")
        };
        format!("{} = {}", head, self.total)
    }
}

// =============================================================================
// Public entry points
// =============================================================================

/// Evaluate a formula for display.
///
/// Returns the computed number for pure arithmetic, the dice terms with a
/// folded modifier for dice formulas, and `formula` unchanged when it does
/// not parse.
pub fn evaluate(formula: &str, bindings: &FormulaBindings) -> String {
    match ResolvedFormula::parse(formula, bindings) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => formula.to_string(),
    }
}

/// Parse and roll a formula.
pub fn roll<R: Rng + ?Sized>(
    formula: &str,
    bindings: &FormulaBindings,
    rng: &mut R,
) -> Result<RollResult, FormulaParseError> {
    Ok(ResolvedFormula::parse(formula, bindings)?.roll(rng))
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Ident(String),
    Dice(DiceTerm),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Dice(term) => write!(f, "{}", term),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                let is_dice = i + 1 < chars.len()
                    && matches!(chars[i], 'd' | 'D')
                    && chars[i + 1].is_ascii_digit();
                if is_dice {
                    i += 1;
                    let sides_start = i;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let sides: String = chars[sides_start..i].iter().collect();
                    tokens.push(Token::Dice(parse_dice(&digits, &sides)?));
                } else {
                    let number = digits.parse().map_err(|_| FormulaParseError::Overflow)?;
                    tokens.push(Token::Number(number));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                // "d20" is shorthand for "1d20"
                let shorthand_sides = word
                    .strip_prefix(['d', 'D'])
                    .filter(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()));
                match shorthand_sides {
                    Some(sides) => tokens.push(Token::Dice(parse_dice("1", sides)?)),
                    None => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(FormulaParseError::UnexpectedCharacter(other)),
        }
    }

    Ok(tokens)
}

fn parse_dice(count: &str, sides: &str) -> Result<DiceTerm, FormulaParseError> {
    let invalid = || FormulaParseError::InvalidDice(format!("{}d{}", count, sides));
    let count: u32 = count.parse().map_err(|_| invalid())?;
    let sides: u32 = sides.parse().map_err(|_| invalid())?;
    DiceTerm::new(count, sides)
}

// =============================================================================
// Parser
// =============================================================================

/// Recursive-descent parser.
///
/// ```text
/// formula := ['+'|'-'] operand (('+'|'-') operand)*
/// operand := DICE | term
/// term    := factor (('*'|'/') factor)*
/// factor  := '-' factor | '+' factor | NUMBER | IDENT | '(' expr ')'
/// expr    := term (('+'|'-') term)*
/// ```
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    bindings: &'a FormulaBindings,
}

impl<'a> Parser<'a> {
    fn parse_formula(mut self) -> Result<ResolvedFormula, FormulaParseError> {
        let mut dice = Vec::new();
        let mut modifier: i64 = 0;

        let mut negative = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                true
            }
            Some(Token::Plus) => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        loop {
            let dice_operand = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Dice(term)), next) => {
                    if matches!(next, Some(Token::Star | Token::Slash)) {
                        return Err(FormulaParseError::MisplacedDice);
                    }
                    Some(*term)
                }
                _ => None,
            };

            if let Some(term) = dice_operand {
                if negative {
                    return Err(FormulaParseError::MisplacedDice);
                }
                self.pos += 1;
                dice.push(term);
            } else {
                let value = self.parse_term()?;
                let signed = if negative { negate(value)? } else { value };
                modifier = modifier
                    .checked_add(signed)
                    .ok_or(FormulaParseError::Overflow)?;
            }

            match self.next() {
                None => break,
                Some(Token::Plus) => negative = false,
                Some(Token::Minus) => negative = true,
                Some(other) => return Err(FormulaParseError::UnexpectedToken(other.to_string())),
            }
        }

        let resolved = ResolvedFormula { dice, modifier };
        resolved.check_bounds()?;
        Ok(resolved)
    }

    fn parse_expr(&mut self) -> Result<i64, FormulaParseError> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    value = value.checked_add(rhs).ok_or(FormulaParseError::Overflow)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    value = value.checked_sub(rhs).ok_or(FormulaParseError::Overflow)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_term(&mut self) -> Result<i64, FormulaParseError> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    value = value.checked_mul(rhs).ok_or(FormulaParseError::Overflow)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    if rhs == 0 {
                        return Err(FormulaParseError::DivisionByZero);
                    }
                    value = value.checked_div(rhs).ok_or(FormulaParseError::Overflow)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<i64, FormulaParseError> {
        match self.next() {
            None => Err(FormulaParseError::UnexpectedEnd),
            Some(Token::Minus) => negate(self.parse_factor()?),
            Some(Token::Plus) => self.parse_factor(),
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::Ident(name)) => self
                .bindings
                .get(name)
                .ok_or_else(|| FormulaParseError::UnknownVariable(name.clone())),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(FormulaParseError::UnexpectedToken(other.to_string())),
                    None => Err(FormulaParseError::UnexpectedEnd),
                }
            }
            Some(Token::Dice(_)) => Err(FormulaParseError::MisplacedDice),
            Some(other) => Err(FormulaParseError::UnexpectedToken(other.to_string())),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn negate(value: i64) -> Result<i64, FormulaParseError> {
    value.checked_neg().ok_or(FormulaParseError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bindings() -> FormulaBindings {
        FormulaBindings::new()
            .with("level", 3)
            .with("Strength", 10)
            .with("STR", 10)
            .with("Agility", 4)
    }

    #[test]
    fn test_plain_number_evaluates_to_itself() {
        assert_eq!(evaluate("5", &bindings()), "5");
        assert_eq!(evaluate(" 12 ", &bindings()), "12");
    }

    #[test]
    fn test_arithmetic_with_bindings() {
        assert_eq!(evaluate("Strength/2+1", &bindings()), "6");
        assert_eq!(evaluate("str * (level - 1)", &bindings()), "20");
        assert_eq!(evaluate("-Agility", &bindings()), "-4");
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(evaluate("7/2", &bindings()), "3");
        assert_eq!(evaluate("-7/2", &bindings()), "-3");
    }

    #[test]
    fn test_dice_formula_folds_modifier() {
        assert_eq!(evaluate("2d6 + Strength/2", &bindings()), "2d6+5");
        assert_eq!(evaluate("1d8-1", &bindings()), "1d8-1");
        assert_eq!(evaluate("1d8 + 2 - 2", &bindings()), "1d8");
        assert_eq!(evaluate("1d6 + 1d4 + Agility", &bindings()), "1d6+1d4+4");
        assert_eq!(evaluate("Agility + 1d6", &bindings()), "1d6+4");
    }

    #[test]
    fn test_dice_shorthand_and_case() {
        assert_eq!(evaluate("d20", &bindings()), "1d20");
        assert_eq!(evaluate("2D6", &bindings()), "2d6");
    }

    #[test]
    fn test_unparseable_formula_is_echoed() {
        for text in [
            "Fire damage",
            "1d6 fire",
            "Luck + 2",
            "2 +",
            "(3",
            "5 / 0",
            "2 * 1d6",
            "-1d6",
            "0d6",
            "1d1",
            "3 % 2",
            "",
            "   ",
        ] {
            assert_eq!(evaluate(text, &bindings()), text, "formula {:?}", text);
        }
    }

    #[test]
    fn test_parse_errors_are_specific() {
        let b = bindings();
        assert_eq!(ResolvedFormula::parse("", &b), Err(FormulaParseError::Empty));
        assert_eq!(
            ResolvedFormula::parse("Luck", &b),
            Err(FormulaParseError::UnknownVariable("Luck".to_string()))
        );
        assert_eq!(
            ResolvedFormula::parse("4/0", &b),
            Err(FormulaParseError::DivisionByZero)
        );
        assert_eq!(
            ResolvedFormula::parse("1d6*2", &b),
            Err(FormulaParseError::MisplacedDice)
        );
        assert!(matches!(
            ResolvedFormula::parse("0d6", &b),
            Err(FormulaParseError::InvalidDice(_))
        ));
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let b = bindings();
        assert_eq!(
            ResolvedFormula::parse("9223372036854775807 + 1", &b),
            Err(FormulaParseError::Overflow)
        );
        assert_eq!(
            evaluate("99999999999999999999", &b),
            "99999999999999999999"
        );
    }

    #[test]
    fn test_dice_with_extreme_modifier_is_rejected() {
        let b = bindings();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            ResolvedFormula::parse("1d6 + 9223372036854775807", &b),
            Err(FormulaParseError::Overflow)
        );
        assert_eq!(
            roll("1d6 + 9223372036854775807", &b, &mut rng),
            Err(FormulaParseError::Overflow)
        );
        assert_eq!(
            evaluate("1d6 + 9223372036854775807", &b),
            "1d6 + 9223372036854775807"
        );

        // Lowest modifier still fits once the dice minimum is added.
        let lowest = roll("1d6 - 9223372036854775807 - 1", &b, &mut rng).unwrap();
        assert!(lowest.total < 0);
        assert!(lowest.breakdown().contains("- 9223372036854775808"));
    }

    #[test]
    fn test_hand_built_formula_saturates() {
        let formula = ResolvedFormula {
            dice: vec![DiceTerm::new(2, 6).unwrap()],
            modifier: i64::MAX,
        };
        assert_eq!(formula.max_roll(), i64::MAX);
        let result = formula.roll(&mut StdRng::seed_from_u64(5));
        assert_eq!(result.total, i64::MAX);
    }

    #[test]
    fn test_bindings_from_stats_include_level_and_abbreviations() {
        let stats = StatBlock::new();
        let bindings = FormulaBindings::from_stats(&stats, 4);
        assert_eq!(bindings.get("LEVEL"), Some(4));
        assert_eq!(bindings.get("cha"), Some(0));
        assert_eq!(bindings.get("Perception"), Some(0));
        assert_eq!(bindings.get("Luck"), None);
    }

    #[test]
    fn test_min_max_roll() {
        let formula = ResolvedFormula::parse("2d6+3", &bindings()).unwrap();
        assert_eq!(formula.min_roll(), 5);
        assert_eq!(formula.max_roll(), 15);
    }

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let result = roll("1d20+Agility", &bindings(), &mut rng).unwrap();
            assert!(result.total >= 5 && result.total <= 24);
            assert_eq!(result.individual_rolls.len(), 1);
            assert_eq!(result.total, result.dice_total + 4);
        }
    }

    #[test]
    fn test_roll_rejects_unparseable_formula() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(roll("fire", &bindings(), &mut rng).is_err());
    }

    #[test]
    fn test_breakdown_multiple_terms() {
        let result = RollResult {
            formula: ResolvedFormula {
                dice: vec![DiceTerm::new(2, 6).unwrap(), DiceTerm::new(1, 4).unwrap()],
                modifier: 3,
            },
            individual_rolls: vec![vec![4, 5], vec![2]],
            dice_total: 11,
            total: 14,
        };
        assert_eq!(result.breakdown(), "2d6[4, 5] + 1d4[2] + 3 = 14");
    }

    #[test]
    fn test_breakdown_negative_and_flat() {
        let negative = RollResult {
            formula: ResolvedFormula {
                dice: vec![DiceTerm::new(1, 8).unwrap()],
                modifier: -1,
            },
            individual_rolls: vec![vec![6]],
            dice_total: 6,
            total: 5,
        };
        assert_eq!(negative.breakdown(), "1d8[6] - 1 = 5");

        let flat = RollResult {
            formula: ResolvedFormula {
                dice: vec![],
                modifier: 7,
            },
            individual_rolls: vec![],
            dice_total: 0,
            total: 7,
        };
        assert_eq!(flat.breakdown(), "7 = 7");
    }
}
