//! Longitude tables with circular linear interpolation.
//!
//! Each body owns a JD-sorted list of `(jd, longitude)` samples. Between two samples the
//! longitude is interpolated along the shorter circular path, so a table stepping from
//! 359° to 1° passes through 0° rather than sweeping back across the circle. Instants
//! outside a body's first/last sample are unavailable.
//!
//! CSV layout (header required, `#` comments allowed):
//!
//! ```text
//! jd,body,longitude
//! 2451545.0,Sun,280.46
//! 2451546.0,Sun,281.47
//! ```
use std::io::Read;

use ahash::AHashMap;
use camino::Utf8Path;
use serde::Deserialize;

use crate::angle_math::normalize;
use crate::aspect_errors::AspectError;
use crate::bodies::Body;
use crate::constants::{Degree, HALF_CIRCLE, JD};
use crate::time::{instant_to_jd, Instant};

use super::PositionProvider;

/// Tolerance on the table edges, absorbing JD round-trip noise (≈ 1 ms)
const COVERAGE_SLACK: JD = 1e-8;

#[derive(Debug, Deserialize)]
struct SampleRow {
    jd: f64,
    body: String,
    longitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TabulatedProvider {
    tables: AHashMap<Body, Vec<(JD, Degree)>>,
}

impl TabulatedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one sample. Tables are re-sorted lazily by [`TabulatedProvider::finish`].
    pub fn insert(&mut self, body: Body, jd: JD, longitude: Degree) -> Result<(), AspectError> {
        let invalid = |reason: &str| AspectError::InvalidPositionSample {
            body: body.to_string(),
            jd,
            reason: reason.to_string(),
        };
        if !jd.is_finite() {
            return Err(invalid("julian date is not finite"));
        }
        if !longitude.is_finite() {
            return Err(invalid("longitude is not finite"));
        }
        self.tables
            .entry(body)
            .or_default()
            .push((jd, normalize(longitude)));
        Ok(())
    }

    /// Sort every table by JD and drop repeated epochs (first sample kept).
    pub fn finish(mut self) -> Self {
        for samples in self.tables.values_mut() {
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            samples.dedup_by(|later, earlier| later.0 == earlier.0);
        }
        self
    }

    /// Build from in-memory samples.
    pub fn from_samples(
        samples: impl IntoIterator<Item = (Body, JD, Degree)>,
    ) -> Result<Self, AspectError> {
        let mut provider = TabulatedProvider::new();
        for (body, jd, longitude) in samples {
            provider.insert(body, jd, longitude)?;
        }
        Ok(provider.finish())
    }

    /// Build from CSV text with `jd,body,longitude` columns.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AspectError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut provider = TabulatedProvider::new();
        for row in csv_reader.deserialize::<SampleRow>() {
            let row = row?;
            let body: Body = row.body.parse()?;
            provider.insert(body, row.jd, row.longitude)?;
        }
        Ok(provider.finish())
    }

    /// Build from a CSV file, see [`TabulatedProvider::from_reader`].
    pub fn from_csv(path: &Utf8Path) -> Result<Self, AspectError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// JD span covered for a body, if any sample exists.
    pub fn coverage(&self, body: Body) -> Option<(JD, JD)> {
        let samples = self.tables.get(&body)?;
        Some((samples.first()?.0, samples.last()?.0))
    }

    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        self.tables.keys().copied()
    }

    fn interpolate(samples: &[(JD, Degree)], jd: JD) -> Option<Degree> {
        let (first, last) = (samples.first()?, samples.last()?);
        if jd < first.0 - COVERAGE_SLACK || jd > last.0 + COVERAGE_SLACK {
            return None;
        }
        let jd = jd.clamp(first.0, last.0);

        // index of the first sample strictly after jd
        let upper = samples.partition_point(|&(t, _)| t <= jd);
        if upper == 0 {
            return None;
        }
        let (t0, lon0) = samples[upper - 1];
        if t0 == jd || upper == samples.len() {
            return Some(lon0);
        }
        let (t1, lon1) = samples[upper];

        let mut delta = lon1 - lon0;
        if delta > HALF_CIRCLE {
            delta -= 360.0;
        } else if delta < -HALF_CIRCLE {
            delta += 360.0;
        }
        let fraction = (jd - t0) / (t1 - t0);
        Some(normalize(lon0 + fraction * delta))
    }
}

impl PositionProvider for TabulatedProvider {
    fn longitude(&self, body: Body, instant: Instant) -> Option<Degree> {
        let samples = self.tables.get(&body)?;
        Self::interpolate(samples, instant_to_jd(instant))
    }
}

#[cfg(test)]
mod tabulated_test {
    use super::*;
    use crate::time::instant_from_jd;
    use approx::assert_abs_diff_eq;

    fn lon(provider: &TabulatedProvider, body: Body, jd: JD) -> Option<Degree> {
        provider.longitude(body, instant_from_jd(jd))
    }

    #[test]
    fn test_linear_interpolation() {
        let provider = TabulatedProvider::from_samples([
            (Body::Mars, 2451545.0, 10.0),
            (Body::Mars, 2451547.0, 14.0),
        ])
        .unwrap();
        assert_abs_diff_eq!(lon(&provider, Body::Mars, 2451546.0).unwrap(), 12.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lon(&provider, Body::Mars, 2451545.0).unwrap(), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lon(&provider, Body::Mars, 2451547.0).unwrap(), 14.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolation_across_seam() {
        let provider = TabulatedProvider::from_samples([
            (Body::Moon, 2451545.0, 359.0),
            (Body::Moon, 2451545.5, 3.0),
        ])
        .unwrap();
        assert_abs_diff_eq!(
            lon(&provider, Body::Moon, 2451545.25).unwrap(),
            1.0,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            lon(&provider, Body::Moon, 2451545.0625).unwrap(),
            359.5,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_retrograde_interpolation() {
        let provider = TabulatedProvider::from_samples([
            (Body::Mercury, 2451545.0, 2.0),
            (Body::Mercury, 2451546.0, 358.0),
        ])
        .unwrap();
        assert_abs_diff_eq!(
            lon(&provider, Body::Mercury, 2451545.75).unwrap(),
            359.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_outside_coverage_is_unavailable() {
        let provider = TabulatedProvider::from_samples([
            (Body::Saturn, 2451545.0, 40.0),
            (Body::Saturn, 2451555.0, 41.0),
        ])
        .unwrap();
        assert_eq!(lon(&provider, Body::Saturn, 2451544.0), None);
        assert_eq!(lon(&provider, Body::Saturn, 2451556.0), None);
        assert_eq!(lon(&provider, Body::Jupiter, 2451550.0), None);
        assert_eq!(provider.coverage(Body::Saturn), Some((2451545.0, 2451555.0)));
    }

    #[test]
    fn test_unsorted_samples_are_sorted() {
        let provider = TabulatedProvider::from_samples([
            (Body::Venus, 2451547.0, 30.0),
            (Body::Venus, 2451545.0, 10.0),
            (Body::Venus, 2451546.0, 20.0),
        ])
        .unwrap();
        assert_abs_diff_eq!(lon(&provider, Body::Venus, 2451546.5).unwrap(), 25.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_reader() {
        let data = "\
jd,body,longitude
# Sun
2451545.0,Sun,280.0
2451546.0,sun,281.0
2451545.0,Moon,370.0
2451546.0,Moon,23.0
";
        let provider = TabulatedProvider::from_reader(data.as_bytes()).unwrap();
        assert_abs_diff_eq!(lon(&provider, Body::Sun, 2451545.5).unwrap(), 280.5, epsilon = 1e-6);
        assert_abs_diff_eq!(lon(&provider, Body::Moon, 2451545.0).unwrap(), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lon(&provider, Body::Moon, 2451545.5).unwrap(), 16.5, epsilon = 1e-6);
        assert_eq!(provider.bodies().count(), 2);
    }

    #[test]
    fn test_invalid_samples() {
        let unknown = "jd,body,longitude\n2451545.0,Ceres,10.0\n";
        assert_eq!(
            TabulatedProvider::from_reader(unknown.as_bytes()).unwrap_err(),
            AspectError::UnknownBody("Ceres".to_string())
        );

        let res = TabulatedProvider::from_samples([(Body::Sun, f64::NAN, 10.0)]);
        assert!(matches!(res, Err(AspectError::InvalidPositionSample { .. })));
    }
}
