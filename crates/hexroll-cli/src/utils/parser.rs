use hexroll::core::models::params::TubeClass;
use hexroll::core::models::species::SpeciesPair;
use hexroll::engine::config::ColoringStrategy;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid species pair '{0}'. Expected two element symbols 'A,B' (e.g., 'Al,P').")]
    InvalidSpeciesPair(String),

    #[error("Invalid repeat counts '{0}'. Expected two positive integers 'NX,NY' (e.g., '4,4').")]
    InvalidRepeats(String),

    #[error("Unknown coloring strategy '{0}'. Expected 'traversal-parity' or 'sublattice'.")]
    UnknownColoring(String),

    #[error("Unknown tube class '{0}'. Expected 'armchair', 'zigzag' or 'chiral'.")]
    UnknownTubeClass(String),
}

fn split_pair(s: &str) -> Option<(&str, &str)> {
    let (first, second) = s.split_once(',')?;
    let (first, second) = (first.trim(), second.trim());
    if first.is_empty() || second.is_empty() || second.contains(',') {
        return None;
    }
    Some((first, second))
}

pub fn parse_species_pair(s: &str) -> Result<SpeciesPair, ParseError> {
    let (a, b) = split_pair(s).ok_or_else(|| ParseError::InvalidSpeciesPair(s.to_string()))?;
    SpeciesPair::new(a, b).map_err(|_| ParseError::InvalidSpeciesPair(s.to_string()))
}

pub fn parse_repeats(s: &str) -> Result<[usize; 2], ParseError> {
    let invalid = || ParseError::InvalidRepeats(s.to_string());
    let (nx, ny) = split_pair(s).ok_or_else(invalid)?;
    let nx: usize = nx.parse().map_err(|_| invalid())?;
    let ny: usize = ny.parse().map_err(|_| invalid())?;
    if nx == 0 || ny == 0 {
        return Err(invalid());
    }
    Ok([nx, ny])
}

pub fn parse_coloring(s: &str) -> Result<ColoringStrategy, ParseError> {
    s.parse()
        .map_err(|_| ParseError::UnknownColoring(s.to_string()))
}

pub fn parse_tube_class(s: &str) -> Result<TubeClass, ParseError> {
    s.parse()
        .map_err(|_| ParseError::UnknownTubeClass(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_species_pairs() {
        let pair = parse_species_pair("B, N").unwrap();
        assert_eq!((pair.a(), pair.b()), ("B", "N"));
        assert_eq!(
            parse_species_pair("Al"),
            Err(ParseError::InvalidSpeciesPair("Al".to_string()))
        );
        assert!(parse_species_pair("Al,P,N").is_err());
        assert!(parse_species_pair("al,p").is_err());
    }

    #[test]
    fn parses_repeat_counts() {
        assert_eq!(parse_repeats("4,2"), Ok([4, 2]));
        assert_eq!(parse_repeats(" 3 , 1 "), Ok([3, 1]));
        assert!(parse_repeats("0,2").is_err());
        assert!(parse_repeats("2x2").is_err());
        assert!(parse_repeats("-1,2").is_err());
    }

    #[test]
    fn parses_strategy_and_class_names() {
        assert_eq!(parse_coloring("sublattice"), Ok(ColoringStrategy::Sublattice));
        assert_eq!(
            parse_coloring("Traversal-Parity"),
            Ok(ColoringStrategy::TraversalParity)
        );
        assert_eq!(
            parse_coloring("random"),
            Err(ParseError::UnknownColoring("random".to_string()))
        );
        assert_eq!(parse_tube_class("Zigzag"), Ok(TubeClass::Zigzag));
        assert!(parse_tube_class("planar").is_err());
    }
}
