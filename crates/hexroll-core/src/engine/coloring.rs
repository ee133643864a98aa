use super::config::{ColoringStrategy, OddCountPolicy};
use super::error::EngineError;
use crate::core::models::site::{AtomSite, LatticeSite, Sublattice};
use crate::core::models::species::SpeciesPair;
use tracing::warn;

/// Assigns one of two species to every site of an ordered sequence.
pub trait SiteColoring: Send + Sync {
    fn name(&self) -> &'static str;

    /// Species of the site at position `index` in generation order.
    fn species_for<'p>(&self, index: usize, site: &LatticeSite, pair: &'p SpeciesPair) -> &'p str;

    fn assign(&self, sites: &[LatticeSite], pair: &SpeciesPair) -> Vec<AtomSite> {
        sites
            .iter()
            .enumerate()
            .map(|(index, site)| {
                AtomSite::new(
                    index,
                    site.position,
                    self.species_for(index, site, pair),
                    Some(site.sublattice),
                )
            })
            .collect()
    }
}

/// Species A on even generation indices, species B on odd ones.
///
/// This follows the order the sites were produced in, not their geometry. For the
/// generators in this crate every A site is emitted directly before its B partner, so
/// the result coincides with [`SublatticeColoring`]; for other orderings it may not.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalParityColoring;

impl SiteColoring for TraversalParityColoring {
    fn name(&self) -> &'static str {
        "traversal-parity"
    }

    fn species_for<'p>(&self, index: usize, _site: &LatticeSite, pair: &'p SpeciesPair) -> &'p str {
        if index % 2 == 0 { pair.a() } else { pair.b() }
    }
}

/// Species A on the A sublattice, species B on the B sublattice, so that every bond
/// joins unlike species.
#[derive(Debug, Clone, Copy, Default)]
pub struct SublatticeColoring;

impl SiteColoring for SublatticeColoring {
    fn name(&self) -> &'static str {
        "sublattice"
    }

    fn species_for<'p>(&self, _index: usize, site: &LatticeSite, pair: &'p SpeciesPair) -> &'p str {
        match site.sublattice {
            Sublattice::A => pair.a(),
            Sublattice::B => pair.b(),
        }
    }
}

impl ColoringStrategy {
    pub fn colorer(&self) -> &'static dyn SiteColoring {
        match self {
            ColoringStrategy::TraversalParity => &TraversalParityColoring,
            ColoringStrategy::Sublattice => &SublatticeColoring,
        }
    }
}

/// Labels `sites` with species, after applying the odd-count policy.
///
/// # Errors
///
/// Returns [`EngineError::UnbalancedSpecies`] if the site count is odd and the policy
/// is [`OddCountPolicy::Reject`]; no site is labelled in that case.
pub fn assign_species(
    sites: &[LatticeSite],
    pair: &SpeciesPair,
    strategy: ColoringStrategy,
    policy: OddCountPolicy,
) -> Result<Vec<AtomSite>, EngineError> {
    let count = sites.len();
    if count % 2 == 1 {
        match policy {
            OddCountPolicy::Reject => return Err(EngineError::UnbalancedSpecies { count }),
            OddCountPolicy::Permit => warn!(
                "Odd site count {}: species {} gets one more site than {}.",
                count,
                pair.a(),
                pair.b()
            ),
        }
    }
    Ok(strategy.colorer().assign(sites, pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::honeycomb::HoneycombLattice;
    use crate::core::lattice::rolling::roll;
    use crate::core::models::params::{ChiralIndex, LatticeParams};
    use nalgebra::Point3;

    fn site(sublattice: Sublattice) -> LatticeSite {
        LatticeSite::new(Point3::origin(), sublattice)
    }

    fn zigzag_sites() -> Vec<LatticeSite> {
        let params = LatticeParams::from_bond_length(2.27).unwrap();
        let lattice = HoneycombLattice::from_params(&params);
        roll(&lattice, &ChiralIndex::new(5, 0).unwrap(), 1).unwrap().sites
    }

    #[test]
    fn zigzag_tube_starts_with_alternating_species() {
        let atoms = assign_species(
            &zigzag_sites(),
            &SpeciesPair::default(),
            ColoringStrategy::TraversalParity,
            OddCountPolicy::Reject,
        )
        .unwrap();
        let first: Vec<&str> = atoms.iter().take(4).map(|a| a.species.as_str()).collect();
        assert_eq!(first, vec!["Al", "P", "Al", "P"]);
        assert_eq!(atoms.iter().filter(|a| a.species == "Al").count(), 10);
    }

    #[test]
    fn both_strategies_agree_on_generated_sites() {
        let sites = zigzag_sites();
        let pair = SpeciesPair::default();
        let parity = TraversalParityColoring.assign(&sites, &pair);
        let sublattice = SublatticeColoring.assign(&sites, &pair);
        assert_eq!(parity, sublattice);
    }

    #[test]
    fn sublattice_coloring_ignores_order() {
        let sites = vec![site(Sublattice::B), site(Sublattice::B), site(Sublattice::A)];
        let pair = SpeciesPair::new("B", "N").unwrap();
        let species: Vec<String> = SublatticeColoring
            .assign(&sites, &pair)
            .into_iter()
            .map(|a| a.species)
            .collect();
        assert_eq!(species, vec!["N", "N", "B"]);

        let parity: Vec<String> = TraversalParityColoring
            .assign(&sites, &pair)
            .into_iter()
            .map(|a| a.species)
            .collect();
        assert_eq!(parity, vec!["B", "N", "B"]);
    }

    #[test]
    fn odd_counts_follow_the_policy() {
        let sites = vec![site(Sublattice::A), site(Sublattice::B), site(Sublattice::A)];
        let pair = SpeciesPair::default();
        assert!(matches!(
            assign_species(&sites, &pair, ColoringStrategy::TraversalParity, OddCountPolicy::Reject),
            Err(EngineError::UnbalancedSpecies { count: 3 })
        ));
        let atoms = assign_species(
            &sites,
            &pair,
            ColoringStrategy::TraversalParity,
            OddCountPolicy::Permit,
        )
        .unwrap();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[2].species, "Al");
    }

    #[test]
    fn strategy_resolves_to_named_colorer() {
        assert_eq!(ColoringStrategy::TraversalParity.colorer().name(), "traversal-parity");
        assert_eq!(ColoringStrategy::Sublattice.colorer().name(), "sublattice");
    }
}
