use nalgebra::Point3;

/// One of the two interpenetrating triangular sublattices of the honeycomb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sublattice {
    /// The site at the origin of the primitive cell.
    A,
    /// The site displaced by `(a1 + a2) / 3`.
    B,
}

impl Sublattice {
    pub fn index(&self) -> usize {
        match self {
            Sublattice::A => 0,
            Sublattice::B => 1,
        }
    }
}

/// A lattice site before species assignment: a position and the sublattice it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeSite {
    pub position: Point3<f64>,
    pub sublattice: Sublattice,
}

impl LatticeSite {
    pub fn new(position: Point3<f64>, sublattice: Sublattice) -> Self {
        Self {
            position,
            sublattice,
        }
    }
}

/// A fully labelled atom of a finished structure.
///
/// `index` is the site's position in generation order; species alternation and
/// serialization order are both defined by it.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// Position in generation order, starting at zero.
    pub index: usize,
    /// Cartesian position in Angstroms.
    pub position: Point3<f64>,
    /// Chemical symbol of the assigned species (e.g. "Al").
    pub species: String,
    /// Sublattice of origin; `None` for sites read back from a file.
    pub sublattice: Option<Sublattice>,
}

impl AtomSite {
    pub fn new(
        index: usize,
        position: Point3<f64>,
        species: &str,
        sublattice: Option<Sublattice>,
    ) -> Self {
        Self {
            index,
            position,
            species: species.to_string(),
            sublattice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_site_copies_all_fields() {
        let site = AtomSite::new(3, Point3::new(1.0, 2.0, 3.0), "P", Some(Sublattice::B));
        assert_eq!(site.index, 3);
        assert_eq!(site.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(site.species, "P");
        assert_eq!(site.sublattice, Some(Sublattice::B));
    }

    #[test]
    fn sublattice_indices_are_zero_and_one() {
        assert_eq!(Sublattice::A.index(), 0);
        assert_eq!(Sublattice::B.index(), 1);
    }
}
