use crate::core::io::traits::StructureFile;
use crate::core::models::cell::{Cell, CellError};
use crate::core::models::site::AtomSite;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Prefix of the auxiliary items that carry structure metadata.
pub const METADATA_PREFIX: &str = "_hexroll_";

const CELL_LENGTH_TAGS: [&str; 3] = ["_cell_length_a", "_cell_length_b", "_cell_length_c"];
const CELL_ANGLE_TAGS: [&str; 3] = ["_cell_angle_alpha", "_cell_angle_beta", "_cell_angle_gamma"];
const SPACE_GROUP_TAGS: [&str; 2] = [
    "_symmetry_space_group_name_h-m",
    "_space_group_name_h-m_alt",
];
const SYMOP_TAGS: [&str; 2] = ["_symmetry_equiv_pos_as_xyz", "_space_group_symop_operation_xyz"];

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CifParseErrorKind,
    },
    #[error("Invalid cell: {0}")]
    Cell(#[from] CellError),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CifParseErrorKind {
    #[error("Invalid number for {tag} (value: '{value}')")]
    InvalidFloat { tag: String, value: String },
    #[error("Item {tag} has no value")]
    MissingValue { tag: String },
    #[error("Value '{value}' does not belong to any item or loop")]
    UnexpectedValue { value: String },
    #[error("Unterminated quoted value")]
    UnterminatedQuote,
    #[error("Loop has {found} values, not a multiple of its {columns} columns")]
    RaggedLoop { columns: usize, found: usize },
    #[error("Semicolon-delimited text fields are not supported")]
    UnsupportedTextField,
}

/// Reader and writer for P1 CIF records.
///
/// The writer emits the cell as lengths and angles, declares space group `P 1` with the
/// single identity operation, writes one `_atom_site` row per atom in site order using
/// fractional coordinates, and stores every metadata entry as a `_hexroll_<key>` item.
/// The reader accepts what the writer produces plus common variations (Cartesian
/// coordinates, standard uncertainties, comments, either quoting style).
pub struct CifFile;

impl StructureFile for CifFile {
    type Error = CifError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let tokens = tokenize(reader)?;
        let block = DataBlock::parse(&tokens)?;
        block.into_structure()
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        if structure.is_empty() {
            return Err(CifError::Inconsistency(
                "Cannot write a structure without atoms".into(),
            ));
        }

        writeln!(writer, "data_{}", block_name(structure))?;
        writeln!(writer, "{:<34}{}", "_symmetry_space_group_name_H-M", "'P 1'")?;
        writeln!(writer, "{:<34}{}", "_symmetry_Int_Tables_number", 1)?;

        let lengths = structure.cell().lengths();
        let angles = structure.cell().angles();
        for (tag, value) in CELL_LENGTH_TAGS.iter().zip(lengths) {
            writeln!(writer, "{:<34}{:.10}", tag, value)?;
        }
        for (tag, value) in CELL_ANGLE_TAGS.iter().zip(angles) {
            writeln!(writer, "{:<34}{:.10}", tag, value)?;
        }

        for (key, value) in structure.metadata() {
            // CIF tags are case-insensitive, so only lowercase keys read back unchanged.
            if key.is_empty()
                || !key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(CifError::Inconsistency(format!(
                    "Metadata key '{}' is not a valid CIF tag suffix",
                    key
                )));
            }
            let tag = format!("{}{}", METADATA_PREFIX, key);
            writeln!(writer, "{:<34}{}", tag, quote(value)?)?;
        }

        writeln!(writer)?;
        writeln!(writer, "loop_")?;
        writeln!(writer, "  _symmetry_equiv_pos_as_xyz")?;
        writeln!(writer, "  'x, y, z'")?;

        writeln!(writer)?;
        writeln!(writer, "loop_")?;
        for tag in [
            "_atom_site_label",
            "_atom_site_type_symbol",
            "_atom_site_fract_x",
            "_atom_site_fract_y",
            "_atom_site_fract_z",
            "_atom_site_occupancy",
        ] {
            writeln!(writer, "  {}", tag)?;
        }

        let mut label_counters: HashMap<&str, usize> = HashMap::new();
        for site in structure.sites() {
            let counter = label_counters.entry(site.species.as_str()).or_insert(0);
            *counter += 1;
            let label = format!("{}{}", site.species, counter);
            let frac = structure.cell().to_fractional(&site.position);
            writeln!(
                writer,
                "  {:<8} {:<3} {:>14.10} {:>14.10} {:>14.10} {:>4.1}",
                label, site.species, frac.x, frac.y, frac.z, 1.0
            )?;
        }

        Ok(())
    }
}

/// Data block name derived from the species counts in order of first appearance, e.g.
/// `Al10P10`.
fn block_name(structure: &Structure) -> String {
    let mut order: Vec<&str> = Vec::new();
    let counts = structure.species_counts();
    for species in structure.species() {
        if !order.contains(&species) {
            order.push(species);
        }
    }
    order
        .into_iter()
        .map(|s| format!("{}{}", s, counts.get(s).copied().unwrap_or(0)))
        .collect()
}

fn quote(value: &str) -> Result<String, CifError> {
    if value.contains('\n') || value.contains('\r') {
        return Err(CifError::Inconsistency(format!(
            "Metadata value '{}' spans several lines",
            value.escape_debug()
        )));
    }
    if !value.contains('\'') {
        Ok(format!("'{}'", value))
    } else if !value.contains('"') {
        Ok(format!("\"{}\"", value))
    } else {
        Err(CifError::Inconsistency(format!(
            "Metadata value '{}' contains both quote characters",
            value
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    text: String,
    line: usize,
    quoted: bool,
}

impl Token {
    fn is_tag(&self) -> bool {
        !self.quoted && self.text.starts_with('_')
    }

    fn is_reserved(&self) -> bool {
        if self.quoted {
            return false;
        }
        let lower = self.text.to_ascii_lowercase();
        lower == "loop_" || lower.starts_with("data_")
    }
}

fn tokenize(reader: &mut impl BufRead) -> Result<Vec<Token>, CifError> {
    let mut tokens = Vec::new();
    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        if line.starts_with(';') {
            return Err(CifError::Parse {
                line: line_num,
                kind: CifParseErrorKind::UnsupportedTextField,
            });
        }
        tokenize_line(&line, line_num, &mut tokens)?;
    }
    Ok(tokens)
}

fn tokenize_line(line: &str, line_num: usize, tokens: &mut Vec<Token>) -> Result<(), CifError> {
    let chars: Vec<char> = line.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        if c == '#' {
            break;
        }
        if c == '\'' || c == '"' {
            // A quote only closes when followed by whitespace or the end of the line.
            let start = pos + 1;
            let mut end = start;
            loop {
                if end >= chars.len() {
                    return Err(CifError::Parse {
                        line: line_num,
                        kind: CifParseErrorKind::UnterminatedQuote,
                    });
                }
                if chars[end] == c && chars.get(end + 1).is_none_or(|n| n.is_whitespace()) {
                    break;
                }
                end += 1;
            }
            tokens.push(Token {
                text: chars[start..end].iter().collect(),
                line: line_num,
                quoted: true,
            });
            pos = end + 1;
        } else {
            let start = pos;
            while pos < chars.len() && !chars[pos].is_whitespace() {
                pos += 1;
            }
            tokens.push(Token {
                text: chars[start..pos].iter().collect(),
                line: line_num,
                quoted: false,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Loop {
    headers: Vec<String>,
    rows: Vec<Vec<Token>>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == tag)
    }
}

#[derive(Debug, Default)]
struct DataBlock {
    items: BTreeMap<String, Token>,
    loops: Vec<Loop>,
}

impl DataBlock {
    /// Collects the items and loops of the first data block.
    fn parse(tokens: &[Token]) -> Result<Self, CifError> {
        let mut block = DataBlock::default();
        let mut seen_block = false;
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            let lower = token.text.to_ascii_lowercase();
            if !token.quoted && lower.starts_with("data_") {
                if seen_block {
                    break;
                }
                seen_block = true;
                i += 1;
            } else if !token.quoted && lower == "loop_" {
                i += 1;
                let mut lp = Loop::default();
                while i < tokens.len() && tokens[i].is_tag() {
                    lp.headers.push(tokens[i].text.to_ascii_lowercase());
                    i += 1;
                }
                let mut values = Vec::new();
                while i < tokens.len() && !tokens[i].is_tag() && !tokens[i].is_reserved() {
                    values.push(tokens[i].clone());
                    i += 1;
                }
                if lp.headers.is_empty() || values.len() % lp.headers.len() != 0 {
                    return Err(CifError::Parse {
                        line: token.line,
                        kind: CifParseErrorKind::RaggedLoop {
                            columns: lp.headers.len(),
                            found: values.len(),
                        },
                    });
                }
                lp.rows = values
                    .chunks(lp.headers.len())
                    .map(|row| row.to_vec())
                    .collect();
                block.loops.push(lp);
            } else if token.is_tag() {
                let value = tokens
                    .get(i + 1)
                    .filter(|v| !v.is_tag() && !v.is_reserved())
                    .ok_or_else(|| CifError::Parse {
                        line: token.line,
                        kind: CifParseErrorKind::MissingValue {
                            tag: token.text.clone(),
                        },
                    })?;
                block.items.insert(lower, value.clone());
                i += 2;
            } else {
                return Err(CifError::Parse {
                    line: token.line,
                    kind: CifParseErrorKind::UnexpectedValue {
                        value: token.text.clone(),
                    },
                });
            }
        }
        if !seen_block {
            return Err(CifError::MissingRecord("data_ block header".into()));
        }
        Ok(block)
    }

    fn number(&self, tag: &str) -> Result<f64, CifError> {
        let token = self
            .items
            .get(tag)
            .ok_or_else(|| CifError::MissingRecord(tag.to_string()))?;
        parse_number(tag, token)
    }

    fn check_p1(&self) -> Result<(), CifError> {
        for tag in SPACE_GROUP_TAGS {
            if let Some(token) = self.items.get(tag) {
                let compact: String = token.text.split_whitespace().collect();
                if !compact.eq_ignore_ascii_case("P1") {
                    return Err(CifError::Inconsistency(format!(
                        "Only P1 records are supported, found space group '{}'",
                        token.text
                    )));
                }
            }
        }
        for lp in &self.loops {
            for tag in SYMOP_TAGS {
                if let Some(col) = lp.column(tag) {
                    for row in &lp.rows {
                        let op: String = row[col].text.split_whitespace().collect();
                        if !op.eq_ignore_ascii_case("x,y,z") {
                            return Err(CifError::Inconsistency(format!(
                                "Only the identity operation is supported, found '{}'",
                                row[col].text
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn into_structure(self) -> Result<Structure, CifError> {
        self.check_p1()?;

        let mut lengths = [0.0; 3];
        let mut angles = [0.0; 3];
        for (k, tag) in CELL_LENGTH_TAGS.iter().enumerate() {
            lengths[k] = self.number(tag)?;
        }
        for (k, tag) in CELL_ANGLE_TAGS.iter().enumerate() {
            angles[k] = self.number(tag)?;
        }
        let cell = Cell::from_parameters(lengths, angles)?;

        let (atom_loop, fractional) = self
            .loops
            .iter()
            .find_map(|lp| {
                if lp.column("_atom_site_fract_x").is_some() {
                    Some((lp, true))
                } else if lp.column("_atom_site_cartn_x").is_some() {
                    Some((lp, false))
                } else {
                    None
                }
            })
            .ok_or_else(|| CifError::MissingRecord("_atom_site loop".into()))?;

        let prefix = if fractional {
            "_atom_site_fract_"
        } else {
            "_atom_site_cartn_"
        };
        let mut coord_cols = [0usize; 3];
        for (k, axis) in ["x", "y", "z"].iter().enumerate() {
            let tag = format!("{}{}", prefix, axis);
            coord_cols[k] = atom_loop
                .column(&tag)
                .ok_or_else(|| CifError::MissingRecord(tag.clone()))?;
        }
        let species_source = match (
            atom_loop.column("_atom_site_type_symbol"),
            atom_loop.column("_atom_site_label"),
        ) {
            (Some(col), _) => (col, false),
            (None, Some(col)) => (col, true),
            (None, None) => {
                return Err(CifError::MissingRecord(
                    "_atom_site_type_symbol or _atom_site_label".into(),
                ));
            }
        };

        let mut sites = Vec::with_capacity(atom_loop.rows.len());
        for (index, row) in atom_loop.rows.iter().enumerate() {
            let species = match species_source {
                (col, false) => row[col].text.clone(),
                (col, true) => symbol_from_label(&row[col].text),
            };
            if species.is_empty() {
                return Err(CifError::Inconsistency(format!(
                    "Atom row {} has no species",
                    index + 1
                )));
            }
            let mut coords = [0.0; 3];
            for (k, &col) in coord_cols.iter().enumerate() {
                coords[k] = parse_number(&atom_loop.headers[col], &row[col])?;
            }
            let point = Point3::new(coords[0], coords[1], coords[2]);
            let position = if fractional {
                cell.to_cartesian(&point)
            } else {
                point
            };
            sites.push(AtomSite::new(index, position, &species, None));
        }
        if sites.is_empty() {
            return Err(CifError::MissingRecord("atom rows".into()));
        }

        let metadata = self
            .items
            .iter()
            .filter_map(|(tag, token)| {
                tag.strip_prefix(METADATA_PREFIX)
                    .map(|key| (key.to_string(), token.text.clone()))
            })
            .collect();

        Ok(Structure::new(sites, cell, [true; 3], metadata))
    }
}

/// Parses a CIF number, dropping a trailing standard uncertainty such as `3.82(2)`.
fn parse_number(tag: &str, token: &Token) -> Result<f64, CifError> {
    let text = token.text.as_str();
    let bare = text.split_once('(').map_or(text, |(value, _)| value);
    bare.parse().map_err(|_| CifError::Parse {
        line: token.line,
        kind: CifParseErrorKind::InvalidFloat {
            tag: tag.to_string(),
            value: text.to_string(),
        },
    })
}

fn symbol_from_label(label: &str) -> String {
    label.chars().take_while(|c| c.is_ascii_alphabetic()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::io::{BufReader, Cursor};

    const TOLERANCE: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn hexagonal_structure() -> Structure {
        let cell = Cell::from_vectors(
            Vector3::new(3.82, 0.0, 0.0),
            Vector3::new(1.91, 3.82 * 3f64.sqrt() / 2.0, 0.0),
            Vector3::new(0.0, 0.0, 20.0),
        )
        .unwrap();
        let sites = vec![
            AtomSite::new(0, Point3::new(0.0, 0.0, 10.0), "Al", None),
            AtomSite::new(1, Point3::new(1.91, 1.102739, 10.0), "P", None),
        ];
        let mut metadata = BTreeMap::new();
        metadata.insert("structure_class".to_string(), "planar".to_string());
        metadata.insert("lattice_constant".to_string(), "3.82".to_string());
        Structure::new(sites, cell, [true; 3], metadata)
    }

    fn write_to_string(structure: &Structure) -> String {
        let mut buffer = Vec::new();
        CifFile::write_to(structure, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn read_from_str(text: &str) -> Result<Structure, CifError> {
        let mut reader = BufReader::new(Cursor::new(text.as_bytes()));
        CifFile::read_from(&mut reader)
    }

    #[test]
    fn written_record_declares_p1_and_metadata_items() {
        let text = write_to_string(&hexagonal_structure());
        let item = |tag: &str| {
            text.lines()
                .find_map(|line| line.strip_prefix(tag))
                .map(str::trim)
        };
        assert!(text.starts_with("data_Al1P1\n"));
        assert_eq!(item("_symmetry_space_group_name_H-M"), Some("'P 1'"));
        assert_eq!(item("_symmetry_Int_Tables_number"), Some("1"));
        assert_eq!(item("_hexroll_structure_class"), Some("'planar'"));
        assert_eq!(item("_hexroll_lattice_constant"), Some("'3.82'"));
        assert!(text.contains("'x, y, z'"));
        let atom_rows: Vec<&str> = text
            .lines()
            .filter(|line| line.trim_start().starts_with("Al1") || line.trim_start().starts_with("P1 "))
            .collect();
        assert_eq!(atom_rows.len(), 2);
    }

    #[test]
    fn round_trip_preserves_atoms_species_cell_and_metadata() {
        let original = hexagonal_structure();
        let parsed = read_from_str(&write_to_string(&original)).unwrap();

        assert_eq!(parsed.len(), original.len());
        assert_eq!(parsed.species(), original.species());
        for (a, b) in original.cell().lengths().iter().zip(parsed.cell().lengths()) {
            assert!(f64_approx_equal(*a, b));
        }
        for (a, b) in original.cell().angles().iter().zip(parsed.cell().angles()) {
            assert!(f64_approx_equal(*a, b));
        }
        for (a, b) in original.sites().iter().zip(parsed.sites()) {
            assert!((a.position - b.position).norm() < TOLERANCE);
            assert_eq!(b.sublattice, None);
        }
        assert_eq!(parsed.metadata(), original.metadata());
        assert_eq!(parsed.pbc(), [true; 3]);
    }

    #[test]
    fn reader_accepts_cartesian_coordinates_uncertainties_and_comments() {
        let text = "\
# generated elsewhere
data_test
_space_group_name_H-M_alt \"P 1\"
_cell_length_a 10.0(1)
_cell_length_b 10.0
_cell_length_c 4.0
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
_hexroll_chiral_indices '(5, 0)'
loop_
_atom_site_label
_atom_site_Cartn_x
_atom_site_Cartn_y
_atom_site_Cartn_z
B1 1.0 2.0 3.0   N1 4.0 5.0 1.5
";
        let structure = read_from_str(text).unwrap();
        assert_eq!(structure.species(), vec!["B", "N"]);
        assert!(f64_approx_equal(structure.sites()[1].position.x, 4.0));
        assert!(f64_approx_equal(structure.cell().lengths()[0], 10.0));
        assert_eq!(structure.metadata_value("chiral_indices"), Some("(5, 0)"));
    }

    #[test]
    fn reader_rejects_missing_cell_parameter() {
        let text = "data_x\n_cell_length_a 1\n_cell_length_b 1\n_cell_angle_alpha 90\n";
        assert!(matches!(
            read_from_str(text),
            Err(CifError::MissingRecord(tag)) if tag == "_cell_length_c"
        ));
    }

    #[test]
    fn reader_rejects_non_p1_records() {
        let text = write_to_string(&hexagonal_structure()).replace("'P 1'", "'P 63/m m c'");
        assert!(matches!(read_from_str(&text), Err(CifError::Inconsistency(_))));
    }

    #[test]
    fn reader_reports_line_of_invalid_number() {
        let text = "data_x\n_cell_length_a abc\n";
        match read_from_str(text) {
            Err(CifError::Parse {
                line,
                kind: CifParseErrorKind::InvalidFloat { value, .. },
            }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reader_rejects_ragged_loops_and_unterminated_quotes() {
        let ragged = "data_x\nloop_\n_a\n_b\n1 2 3\n";
        assert!(matches!(
            read_from_str(ragged),
            Err(CifError::Parse {
                kind: CifParseErrorKind::RaggedLoop { columns: 2, found: 3 },
                ..
            })
        ));
        let unterminated = "data_x\n_hexroll_note 'open\n";
        assert!(matches!(
            read_from_str(unterminated),
            Err(CifError::Parse {
                kind: CifParseErrorKind::UnterminatedQuote,
                ..
            })
        ));
    }

    #[test]
    fn writer_rejects_invalid_metadata() {
        let base = hexagonal_structure();
        let mut metadata = base.metadata().clone();
        metadata.insert("bad key".to_string(), "x".to_string());
        let structure = Structure::new(base.sites().to_vec(), base.cell().clone(), [true; 3], metadata);
        let mut buffer = Vec::new();
        assert!(matches!(
            CifFile::write_to(&structure, &mut buffer),
            Err(CifError::Inconsistency(_))
        ));
    }

    #[test]
    fn writer_rejects_uppercase_metadata_keys() {
        let base = hexagonal_structure();
        let mut metadata = base.metadata().clone();
        metadata.insert("Lattice_Constant".to_string(), "3.82".to_string());
        let structure = Structure::new(base.sites().to_vec(), base.cell().clone(), [true; 3], metadata);
        let mut buffer = Vec::new();
        assert!(matches!(
            CifFile::write_to(&structure, &mut buffer),
            Err(CifError::Inconsistency(_))
        ));
    }

    #[test]
    fn quoted_values_may_contain_the_other_quote_character() {
        let base = hexagonal_structure();
        let mut metadata = BTreeMap::new();
        metadata.insert("note".to_string(), "it's fine".to_string());
        let structure = Structure::new(base.sites().to_vec(), base.cell().clone(), [true; 3], metadata);
        let parsed = read_from_str(&write_to_string(&structure)).unwrap();
        assert_eq!(parsed.metadata_value("note"), Some("it's fine"));
    }

    #[test]
    fn path_round_trip_uses_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AlP.cif");
        let original = hexagonal_structure();
        CifFile::write_to_path(&original, &path).unwrap();
        let parsed = CifFile::read_from_path(&path).unwrap();
        assert_eq!(parsed.species(), original.species());
    }
}
