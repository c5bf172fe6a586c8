//! Problem generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Arithmetic operation of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Symbol shown in the question.
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '×',
            Self::Divide => '÷',
        }
    }
}

/// A generated problem with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathProblem {
    pub left: i64,
    pub right: i64,
    pub operation: Operation,
}

impl MathProblem {
    /// Draw a problem with the thread-local generator.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draw a problem, choosing the operation uniformly.
    ///
    /// Operand ranges keep every answer a small non-negative integer;
    /// division always divides exactly.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..4) {
            0 => Self {
                left: rng.random_range(1..=10),
                right: rng.random_range(1..=10),
                operation: Operation::Add,
            },
            1 => {
                let left = rng.random_range(5..=19);
                Self {
                    left,
                    right: rng.random_range(1..=left),
                    operation: Operation::Subtract,
                }
            }
            2 => Self {
                left: rng.random_range(1..=5),
                right: rng.random_range(1..=5),
                operation: Operation::Multiply,
            },
            _ => {
                let divisor = rng.random_range(2..=5);
                Self {
                    left: divisor * rng.random_range(1..=5),
                    right: divisor,
                    operation: Operation::Divide,
                }
            }
        }
    }

    pub fn answer(&self) -> i64 {
        match self.operation {
            Operation::Add => self.left + self.right,
            Operation::Subtract => self.left - self.right,
            Operation::Multiply => self.left * self.right,
            Operation::Divide => self.left / self.right,
        }
    }

    /// Question text, e.g. `"12 ÷ 4 = ?"`.
    pub fn question(&self) -> String {
        format!("{} {} {} = ?", self.left, self.operation.symbol(), self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_format() {
        let problem = MathProblem {
            left: 12,
            right: 4,
            operation: Operation::Divide,
        };
        assert_eq!(problem.question(), "12 ÷ 4 = ?");
        assert_eq!(problem.answer(), 3);
    }

    #[test]
    fn test_operand_ranges_hold() {
        let mut rng = rand::rng();
        for _ in 0..2000 {
            let p = MathProblem::generate_with(&mut rng);
            match p.operation {
                Operation::Add => {
                    assert!((1..=10).contains(&p.left) && (1..=10).contains(&p.right));
                }
                Operation::Subtract => {
                    assert!((5..=19).contains(&p.left));
                    assert!((1..=p.left).contains(&p.right));
                    assert!(p.answer() >= 0);
                }
                Operation::Multiply => {
                    assert!((1..=5).contains(&p.left) && (1..=5).contains(&p.right));
                }
                Operation::Divide => {
                    assert!((2..=5).contains(&p.right));
                    assert_eq!(p.left % p.right, 0);
                    assert!((1..=5).contains(&p.answer()));
                }
            }
        }
    }

    #[test]
    fn test_all_operations_appear() {
        let mut rng = rand::rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(MathProblem::generate_with(&mut rng).operation);
        }
        assert_eq!(seen.len(), 4);
    }
}
