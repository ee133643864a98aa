use super::params::ParameterError;
use std::fmt;

/// The two chemical species placed on alternating sites of a binary honeycomb compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeciesPair {
    a: String,
    b: String,
}

impl SpeciesPair {
    /// Creates a species pair from two element-like symbols.
    ///
    /// Only the symbol syntax is checked (an uppercase letter followed by at most two
    /// lowercase letters); whether the compound is chemically sensible is the caller's
    /// business.
    pub fn new(a: &str, b: &str) -> Result<Self, ParameterError> {
        for (name, symbol) in [("species_a", a), ("species_b", b)] {
            if !is_symbol(symbol) {
                return Err(ParameterError::invalid(
                    name,
                    format!("'{}'", symbol),
                    "must be an element-like symbol such as 'Al' or 'P'",
                ));
            }
        }
        Ok(Self {
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    pub fn a(&self) -> &str {
        &self.a
    }

    pub fn b(&self) -> &str {
        &self.b
    }

    /// Formula-style tag, e.g. "AlP".
    pub fn formula(&self) -> String {
        format!("{}{}", self.a, self.b)
    }
}

impl Default for SpeciesPair {
    fn default() -> Self {
        Self {
            a: "Al".to_string(),
            b: "P".to_string(),
        }
    }
}

impl fmt::Display for SpeciesPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

fn is_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    let rest: Vec<char> = chars.collect();
    rest.len() <= 2 && rest.iter().all(|c| c.is_ascii_lowercase())
}
