use std::cell::RefCell;

use ahash::AHashMap;

use crate::bodies::Body;
use crate::constants::Degree;
use crate::time::{instant_key, Instant};

use super::PositionProvider;

/// Memoising wrapper around another provider.
///
/// Entries are keyed on the exact instant (nanosecond resolution), so a re-query
/// never returns data computed for a neighbouring instant. Unavailable answers are
/// cached too. Interior mutability is a [`RefCell`]: the cache is meant for the
/// single-threaded scan loop.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    cache: RefCell<AHashMap<(Body, i128), Option<Degree>>>,
    capacity: usize,
}

impl<P: PositionProvider> CachedProvider<P> {
    /// Wrap `inner` with an unbounded cache.
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, usize::MAX)
    }

    /// Wrap `inner`; the cache is cleared whenever it grows past `capacity` entries.
    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        CachedProvider {
            inner,
            cache: RefCell::new(AHashMap::new()),
            capacity,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<P: PositionProvider> PositionProvider for CachedProvider<P> {
    fn longitude(&self, body: Body, instant: Instant) -> Option<Degree> {
        let key = (body, instant_key(instant));
        if let Some(hit) = self.cache.borrow().get(&key) {
            return *hit;
        }

        let value = self.inner.longitude(body, instant);

        let mut cache = self.cache.borrow_mut();
        if cache.len() >= self.capacity {
            cache.clear();
        }
        cache.insert(key, value);
        value
    }
}

#[cfg(test)]
mod cache_test {
    use std::cell::Cell;

    use super::*;
    use crate::time::{add_days, instant_from_jd};

    struct Counting {
        calls: Cell<usize>,
    }

    impl PositionProvider for Counting {
        fn longitude(&self, body: Body, instant: Instant) -> Option<Degree> {
            self.calls.set(self.calls.get() + 1);
            match body {
                Body::Pluto => None,
                _ => Some(instant.to_jde_utc_days().fract() * 360.0),
            }
        }
    }

    #[test]
    fn test_cache_hits() {
        let provider = CachedProvider::new(Counting {
            calls: Cell::new(0),
        });
        let t0 = instant_from_jd(2451545.25);

        let a = provider.longitude(Body::Sun, t0);
        let b = provider.longitude(Body::Sun, t0);
        assert_eq!(a, b);
        assert_eq!(provider.inner().calls.get(), 1);

        provider.longitude(Body::Moon, t0);
        assert_eq!(provider.inner().calls.get(), 2);
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn test_cache_never_reuses_other_instants() {
        let provider = CachedProvider::new(Counting {
            calls: Cell::new(0),
        });
        let t0 = instant_from_jd(2451545.25);
        let t1 = add_days(t0, 1e-7);

        let a = provider.longitude(Body::Sun, t0);
        let b = provider.longitude(Body::Sun, t1);
        assert_eq!(provider.inner().calls.get(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_unavailable_and_capacity() {
        let provider = CachedProvider::with_capacity(
            Counting {
                calls: Cell::new(0),
            },
            2,
        );
        let t0 = instant_from_jd(2451545.25);

        assert_eq!(provider.longitude(Body::Pluto, t0), None);
        assert_eq!(provider.longitude(Body::Pluto, t0), None);
        assert_eq!(provider.inner().calls.get(), 1);

        provider.longitude(Body::Sun, t0);
        assert_eq!(provider.len(), 2);
        provider.longitude(Body::Moon, t0);
        assert_eq!(provider.len(), 1);

        provider.clear();
        assert!(provider.is_empty());
    }
}
