//! # Aspect definitions and catalogs
//!
//! An **aspect** is a named target separation between two ecliptic longitudes, with an
//! **orb** (tolerance) around it. Catalogs are ordered: when several definitions overlap,
//! the first one declared wins (see [`matcher`]).
//!
//! ## Arc conventions
//!
//! Two longitudes split the circle into a short arc (`[0, 180]`) and a long arc
//! (`[180, 360]`). Most aspects are measured on the short arc. Definitions flagged
//! [`ArcConvention::Reflex`] are measured on the long arc instead, against
//!
//! ```text
//! angle            if angle >= 180
//! 360 - angle      otherwise
//! ```
//!
//! so `Gann74` matches a long arc of 286° and `Gann192` a long arc of 192°.
//!
//! ## Sources
//!
//! - [`AspectCatalog::standard`] – the six classical aspects, orb 1°.
//! - [`AspectCatalog::gann`] – classical aspects with tight orbs plus Gann angles.
//! - [`AspectCatalog::with_gann_angles`] – append custom reflex-measured Gann angles.
//! - [`AspectCatalog::from_csv`] / [`AspectCatalog::from_reader`] – external configuration
//!   with columns `name,angle,orb[,abbrev][,reflex]`.
pub mod matcher;

use std::io::Read;

use ahash::AHashSet;
use camino::Utf8Path;
use serde::Deserialize;
use tracing::warn;

use crate::angle_math::{angular_error, long_arc, short_arc, within_orb};
use crate::aspect_errors::AspectError;
use crate::constants::{Degree, FULL_CIRCLE, HALF_CIRCLE};

pub use matcher::{find_aspect, AspectMatch};

/// Which circular path an aspect is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcConvention {
    #[default]
    Short,
    Reflex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AspectDefinition {
    name: String,
    abbreviation: String,
    angle: Degree,
    orb: Degree,
    arc: ArcConvention,
}

impl AspectDefinition {
    /// Build a short-arc definition.
    ///
    /// Arguments
    /// -----------------
    /// * `name`: unique name inside a catalog (e.g. `"Square"`)
    /// * `angle`: target separation, in `[0, 360)`
    /// * `orb`: tolerance, `>= 0`
    ///
    /// Return
    /// ----------
    /// * The definition, abbreviated by its own name, or
    ///   [`AspectError::InvalidAspectDefinition`] if a value is out of range.
    pub fn new(name: impl Into<String>, angle: Degree, orb: Degree) -> Result<Self, AspectError> {
        Self::with_arc(name, angle, orb, ArcConvention::Short)
    }

    /// Build a definition measured on the long arc.
    pub fn reflex(
        name: impl Into<String>,
        angle: Degree,
        orb: Degree,
    ) -> Result<Self, AspectError> {
        Self::with_arc(name, angle, orb, ArcConvention::Reflex)
    }

    pub fn with_arc(
        name: impl Into<String>,
        angle: Degree,
        orb: Degree,
        arc: ArcConvention,
    ) -> Result<Self, AspectError> {
        let name = name.into();
        let invalid = |reason: &str| AspectError::InvalidAspectDefinition {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !angle.is_finite() || !(0.0..FULL_CIRCLE).contains(&angle) {
            return Err(invalid("angle must lie in [0, 360)"));
        }
        if !orb.is_finite() || orb < 0.0 {
            return Err(invalid("orb must be a non-negative number"));
        }

        Ok(AspectDefinition {
            abbreviation: name.clone(),
            name,
            angle,
            orb,
            arc,
        })
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = abbreviation.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    pub fn angle(&self) -> Degree {
        self.angle
    }

    pub fn orb(&self) -> Degree {
        self.orb
    }

    pub fn arc(&self) -> ArcConvention {
        self.arc
    }

    /// Value the measured arc is compared against.
    pub fn target(&self) -> Degree {
        match self.arc {
            ArcConvention::Short => self.angle,
            ArcConvention::Reflex if self.angle >= HALF_CIRCLE => self.angle,
            ArcConvention::Reflex => FULL_CIRCLE - self.angle,
        }
    }

    /// Separation of two longitudes on this definition's arc.
    pub fn measure(&self, lon1: Degree, lon2: Degree) -> Degree {
        match self.arc {
            ArcConvention::Short => short_arc(lon1, lon2),
            ArcConvention::Reflex => long_arc(lon1, lon2),
        }
    }

    /// Distance between the measured arc and the target.
    ///
    /// Oppositions are measured directly against 180° rather than through the
    /// seam-corrected distance.
    pub fn error(&self, lon1: Degree, lon2: Degree) -> Degree {
        let measured = self.measure(lon1, lon2);
        let target = self.target();
        if target == HALF_CIRCLE {
            (measured - HALF_CIRCLE).abs()
        } else {
            angular_error(measured, target)
        }
    }

    /// `true` when the two longitudes currently form this aspect.
    pub fn matches(&self, lon1: Degree, lon2: Degree) -> bool {
        within_orb(self.measure(lon1, lon2), self.target(), self.orb)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    angle: f64,
    orb: f64,
    #[serde(default)]
    abbrev: Option<String>,
    #[serde(default)]
    reflex: Option<bool>,
}

/// Ordered list of aspect definitions with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectCatalog {
    definitions: Vec<AspectDefinition>,
}

impl AspectCatalog {
    /// Build a catalog, rejecting duplicate names.
    pub fn new(definitions: Vec<AspectDefinition>) -> Result<Self, AspectError> {
        let mut catalog = AspectCatalog::default();
        for definition in definitions {
            catalog.push(definition)?;
        }
        Ok(catalog)
    }

    /// Append a definition at the lowest priority.
    pub fn push(&mut self, definition: AspectDefinition) -> Result<(), AspectError> {
        if self.get(definition.name()).is_some() {
            return Err(AspectError::DuplicateAspect(definition.name().to_string()));
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Conjunction, Semisquare, Sextile, Square, Trine and Opposition, all with a 1° orb.
    pub fn standard() -> Self {
        let table = [
            ("Conjunction", "Conj", 0.0),
            ("Semisquare", "Semi", 45.0),
            ("Sextile", "Sext", 60.0),
            ("Square", "Sq", 90.0),
            ("Trine", "Trine", 120.0),
            ("Opposition", "Opp", 180.0),
        ];
        Self::from_static(table.iter().map(|&(name, abbrev, angle)| {
            (name, abbrev, angle, 1.0, ArcConvention::Short)
        }))
    }

    /// Classical aspects with tight orbs plus the Gann 109° and 74° angles.
    ///
    /// `Gann74` is reflex-measured (long arc of 286°).
    pub fn gann() -> Self {
        use ArcConvention::{Reflex, Short};
        let table = [
            ("Conjunction", "Conj", 0.0, 0.5, Short),
            ("Semisquare", "Semi", 45.0, 0.5, Short),
            ("Sextile", "Sext", 60.0, 1.0, Short),
            ("Square", "Sq", 90.0, 1.0, Short),
            ("Trine", "Trine", 120.0, 1.0, Short),
            ("Gann109", "G109", 109.0, 0.5, Short),
            ("Opposition", "Opp", 180.0, 1.0, Short),
            ("Gann74", "G74", 74.0, 0.5, Reflex),
        ];
        Self::from_static(table.into_iter())
    }

    fn from_static<'a>(
        rows: impl Iterator<Item = (&'a str, &'a str, Degree, Degree, ArcConvention)>,
    ) -> Self {
        let definitions = rows
            .map(|(name, abbrev, angle, orb, arc)| AspectDefinition {
                name: name.to_string(),
                abbreviation: abbrev.to_string(),
                angle,
                orb,
                arc,
            })
            .collect();
        AspectCatalog { definitions }
    }

    /// Append reflex-measured Gann angles, named `Gann{angle}` and abbreviated `G{angle}`.
    pub fn with_gann_angles(mut self, angles: &[Degree], orb: Degree) -> Result<Self, AspectError> {
        for &angle in angles {
            let definition = AspectDefinition::reflex(format!("Gann{angle}"), angle, orb)?
                .with_abbreviation(format!("G{angle}"));
            self.push(definition)?;
        }
        Ok(self)
    }

    /// Read a catalog from CSV text with a header row.
    ///
    /// Required columns are `name`, `angle` and `orb`; `abbrev` and `reflex`
    /// (`true`/`false`) are optional. Lines starting with `#` are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AspectError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut catalog = AspectCatalog::default();
        for row in csv_reader.deserialize::<CatalogRow>() {
            let row = row?;
            let arc = if row.reflex.unwrap_or(false) {
                ArcConvention::Reflex
            } else {
                ArcConvention::Short
            };
            let mut definition = AspectDefinition::with_arc(row.name, row.angle, row.orb, arc)?;
            if let Some(abbrev) = row.abbrev.filter(|a| !a.is_empty()) {
                definition = definition.with_abbreviation(abbrev);
            }
            catalog.push(definition)?;
        }
        for abbreviation in catalog.clashing_abbreviations() {
            warn!(abbreviation, "abbreviation shared by several aspects");
        }
        Ok(catalog)
    }

    /// Read a catalog from a CSV file, see [`AspectCatalog::from_reader`].
    pub fn from_csv(path: &Utf8Path) -> Result<Self, AspectError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn get(&self, name: &str) -> Option<&AspectDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AspectDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name()).collect()
    }

    /// Abbreviations shared by more than one definition, in catalog order.
    ///
    /// Such a catalog stays valid since names are unique, but event
    /// descriptions built from these abbreviations are ambiguous.
    pub fn clashing_abbreviations(&self) -> Vec<&str> {
        let mut seen = AHashSet::new();
        let mut clashes: Vec<&str> = Vec::new();
        for abbreviation in self.definitions.iter().map(|d| d.abbreviation()) {
            if !seen.insert(abbreviation) && !clashes.contains(&abbreviation) {
                clashes.push(abbreviation);
            }
        }
        clashes
    }
}

impl<'a> IntoIterator for &'a AspectCatalog {
    type Item = &'a AspectDefinition;
    type IntoIter = std::slice::Iter<'a, AspectDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod aspects_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_definition_validation() {
        assert!(AspectDefinition::new("Square", 90.0, 1.0).is_ok());
        assert!(AspectDefinition::new("Zero orb", 0.0, 0.0).is_ok());

        assert_eq!(
            AspectDefinition::new("Full", 360.0, 1.0),
            Err(AspectError::InvalidAspectDefinition {
                name: "Full".to_string(),
                reason: "angle must lie in [0, 360)".to_string(),
            })
        );
        assert!(AspectDefinition::new("Neg", -1.0, 1.0).is_err());
        assert!(AspectDefinition::new("NegOrb", 10.0, -0.1).is_err());
        assert!(AspectDefinition::new("NaN", f64::NAN, 1.0).is_err());
        assert!(AspectDefinition::new("  ", 10.0, 1.0).is_err());
    }

    #[test]
    fn test_reflex_target() {
        let g74 = AspectDefinition::reflex("Gann74", 74.0, 0.5).unwrap();
        assert_abs_diff_eq!(g74.target(), 286.0);

        let g192 = AspectDefinition::reflex("Gann192", 192.0, 0.5).unwrap();
        assert_abs_diff_eq!(g192.target(), 192.0);

        let square = AspectDefinition::new("Square", 90.0, 1.0).unwrap();
        assert_abs_diff_eq!(square.target(), 90.0);
    }

    #[test]
    fn test_reflex_measured_on_long_arc() {
        let g192 = AspectDefinition::reflex("Gann192", 192.0, 0.5).unwrap();
        // short arc 168, long arc 192
        assert!(g192.matches(0.0, 168.0));
        assert_abs_diff_eq!(g192.measure(0.0, 168.0), 192.0, epsilon = 1e-12);

        let short192 = AspectDefinition::new("Short192", 192.0, 0.5).unwrap();
        assert!(!short192.matches(0.0, 168.0));
    }

    #[test]
    fn test_opposition_error() {
        let opp = AspectDefinition::new("Opposition", 180.0, 1.0).unwrap();
        assert_abs_diff_eq!(opp.error(10.0, 189.5), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(opp.error(10.0, 190.0), 0.0, epsilon = 1e-9);
        assert!(opp.matches(0.0, 179.2));
    }

    #[test]
    fn test_conjunction_error_across_seam() {
        let conj = AspectDefinition::new("Conjunction", 0.0, 0.5).unwrap();
        assert_abs_diff_eq!(conj.error(359.8, 0.1), 0.3, epsilon = 1e-9);
        assert!(conj.matches(359.8, 0.1));
    }

    #[test]
    fn test_builtin_catalogs() {
        let standard = AspectCatalog::standard();
        assert_eq!(
            standard.names(),
            vec!["Conjunction", "Semisquare", "Sextile", "Square", "Trine", "Opposition"]
        );
        assert!(standard.iter().all(|d| d.orb() == 1.0));

        let gann = AspectCatalog::gann();
        assert_eq!(gann.len(), 8);
        let g74 = gann.get("Gann74").unwrap();
        assert_eq!(g74.arc(), ArcConvention::Reflex);
        assert_eq!(g74.abbreviation(), "G74");
        assert_eq!(gann.get("Conjunction").unwrap().orb(), 0.5);
        assert!(gann.clashing_abbreviations().is_empty());
    }

    #[test]
    fn test_with_gann_angles() {
        let catalog = AspectCatalog::standard()
            .with_gann_angles(&[104.0, 192.5], 0.5)
            .unwrap();
        assert_eq!(catalog.len(), 8);

        let g104 = catalog.get("Gann104").unwrap();
        assert_eq!(g104.abbreviation(), "G104");
        assert_eq!(g104.arc(), ArcConvention::Reflex);
        assert_abs_diff_eq!(g104.target(), 256.0);
        assert!(catalog.get("Gann192.5").is_some());

        let dup = AspectCatalog::standard().with_gann_angles(&[104.0, 104.0], 0.5);
        assert_eq!(dup, Err(AspectError::DuplicateAspect("Gann104".to_string())));
    }

    #[test]
    fn test_catalog_from_reader() {
        let data = "\
name,angle,orb,abbrev,reflex
# classical
Conjunction,0,0.5,Conj,
Square, 90, 1.0 ,Sq,false
Gann74,74,0.5,G74,true
Trine,120,1,,
";
        let catalog = AspectCatalog::from_reader(data.as_bytes()).unwrap();
        assert_eq!(catalog.names(), vec!["Conjunction", "Square", "Gann74", "Trine"]);
        assert_eq!(catalog.get("Square").unwrap().abbreviation(), "Sq");
        assert_eq!(catalog.get("Trine").unwrap().abbreviation(), "Trine");
        assert_eq!(catalog.get("Gann74").unwrap().arc(), ArcConvention::Reflex);
        assert_eq!(catalog.get("Square").unwrap().arc(), ArcConvention::Short);
    }

    #[test]
    fn test_catalog_with_clashing_abbreviations_loads() {
        let data = "\
name,angle,orb,abbrev
Square,90,1,Sq
Semisquare,45,1,Sq
Sesquisquare,135,1,Sq
Trine,120,1,Tr
";
        let catalog = AspectCatalog::from_reader(data.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.clashing_abbreviations(), vec!["Sq"]);
        assert!(AspectCatalog::standard().clashing_abbreviations().is_empty());
    }

    #[test]
    fn test_catalog_from_reader_minimal_columns() {
        let data = "name,angle,orb\nSextile,60,2\n";
        let catalog = AspectCatalog::from_reader(data.as_bytes()).unwrap();
        let sextile = catalog.get("Sextile").unwrap();
        assert_abs_diff_eq!(sextile.orb(), 2.0);
        assert_eq!(sextile.arc(), ArcConvention::Short);
    }

    #[test]
    fn test_catalog_from_reader_errors() {
        let bad_angle = "name,angle,orb\nWide,400,1\n";
        assert!(matches!(
            AspectCatalog::from_reader(bad_angle.as_bytes()),
            Err(AspectError::InvalidAspectDefinition { .. })
        ));

        let bad_number = "name,angle,orb\nSquare,ninety,1\n";
        assert!(matches!(
            AspectCatalog::from_reader(bad_number.as_bytes()),
            Err(AspectError::CsvError(_))
        ));

        let duplicate = "name,angle,orb\nSquare,90,1\nSquare,90,2\n";
        assert_eq!(
            AspectCatalog::from_reader(duplicate.as_bytes()),
            Err(AspectError::DuplicateAspect("Square".to_string()))
        );
    }

    #[test]
    fn test_catalog_from_missing_file() {
        let res = AspectCatalog::from_csv(Utf8Path::new("does/not/exist.csv"));
        assert!(matches!(res, Err(AspectError::IoError(_))));
    }
}
