/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message templates.
//!
//! A [`Template`] is a named, id-tagged, ordered sequence of instructions.
//! Templates are built once by an external source parser (XML or otherwise)
//! and are immutable thereafter; they may be shared by reference across
//! sessions.

use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};

/// Ordered, typed description of a message's fields and their operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier, unique within a stream.
    pub id: u32,
    /// Template name.
    pub name: String,
    /// Ordered field instructions.
    pub instructions: Vec<Instruction>,
}

impl Template {
    /// Creates a template from its ordered instructions.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            id,
            name: name.into(),
            instructions,
        }
    }

    /// Returns true if any instruction, at any nesting depth, has this name.
    #[must_use]
    pub fn defines(&self, name: &str) -> bool {
        fn walk(instructions: &[Instruction], name: &str) -> bool {
            instructions
                .iter()
                .any(|i| i.name == name || walk(&i.children, name))
        }
        walk(&self.instructions, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ValueType;

    #[test]
    fn test_defines_walks_children() {
        let template = Template::new(
            1,
            "Quote",
            vec![
                Instruction::new(1, "Symbol", ValueType::AsciiString),
                Instruction::new(2, "Price", ValueType::Decimal).with_children(vec![
                    Instruction::new(2, "PriceExponent", ValueType::Exponent),
                    Instruction::new(2, "PriceMantissa", ValueType::Mantissa),
                ]),
            ],
        );

        assert!(template.defines("Symbol"));
        assert!(template.defines("PriceMantissa"));
        assert!(!template.defines("Quantity"));
    }
}
