//! Quick arithmetic for two-operand problems.
//!
//! Math decisions are normally forwarded to an external solver. For the
//! common `a <op> b` case the answer can be computed in-process from the
//! operator category the engine already found:
//!
//! ```rust
//! use mathchat::solver::solve;
//!
//! let solution = solve("what is 7 times 4", "times").unwrap();
//! assert_eq!(solution.answer, 28.0);
//! assert!(solve("1 + 2 + 3", "plus").is_none()); // only two operands
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Signed decimal operands. A leading `-` only counts as a sign when it does
/// not follow a digit, so `5-3` reads as `5` and `3`.
static OPERAND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d+(?:\.\d+)?)").expect("operand regex is valid")
});

/// Binary operator resolved from a math-pattern category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Map a category name to an operator.
    pub fn from_category(category: &str) -> Option<Self> {
        match category.trim().to_ascii_lowercase().as_str() {
            "plus" | "add" | "addition" => Some(Operator::Add),
            "minus" | "subtract" | "subtraction" => Some(Operator::Subtract),
            "times" | "multiply" | "multiplication" => Some(Operator::Multiply),
            "divide" | "division" => Some(Operator::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let value = match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide if rhs == 0.0 => return None,
            Operator::Divide => lhs / rhs,
        };
        value.is_finite().then_some(value)
    }
}

/// Computed answer with the steps that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Normalized expression, e.g. `5 + 3`.
    pub expression: String,
    pub operator: Operator,
    pub answer: f64,
    pub steps: Vec<String>,
}

impl Solution {
    /// Answer without a trailing `.0` for whole numbers.
    pub fn display_answer(&self) -> String {
        format_number(self.answer)
    }
}

/// Solve `message` for `category`. Returns `None` when the category is not an
/// arithmetic operator, the message does not hold exactly two operands, or
/// the result is undefined (division by zero, overflow).
pub fn solve(message: &str, category: &str) -> Option<Solution> {
    let operator = Operator::from_category(category)?;
    let operands = extract_operands(message);
    let [lhs, rhs] = operands.as_slice() else {
        return None;
    };
    let (lhs, rhs) = (*lhs, *rhs);
    let answer = operator.apply(lhs, rhs)?;

    let expression = format!(
        "{} {} {}",
        format_number(lhs),
        operator.symbol(),
        format_number(rhs)
    );
    let steps = vec![
        format!("Read problem: {}", message.trim()),
        format!("Calculate {} = {}", expression, format_number(answer)),
    ];

    Some(Solution {
        expression,
        operator,
        answer,
        steps,
    })
}

/// All signed decimal numbers in `message`, in order.
pub fn extract_operands(message: &str) -> Vec<f64> {
    OPERAND_REGEX
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.6}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
