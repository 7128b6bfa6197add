//! Travel matrices and the memoizing provider wrapper.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::traits::TravelMatrixProvider;

/// Pairwise travel distance (km) and time (hours), indexed by place index.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelMatrices {
    pub distance_km: Vec<Vec<f64>>,
    pub time_hours: Vec<Vec<f64>>,
}

impl TravelMatrices {
    pub fn new(distance_km: Vec<Vec<f64>>, time_hours: Vec<Vec<f64>>) -> Self {
        Self {
            distance_km,
            time_hours,
        }
    }

    /// Square `n x n` matrices filled with zero.
    pub fn zeros(n: usize) -> Self {
        Self {
            distance_km: vec![vec![0.0; n]; n],
            time_hours: vec![vec![0.0; n]; n],
        }
    }

    pub fn len(&self) -> usize {
        self.distance_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance_km.is_empty()
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distance_km[from][to]
    }

    pub fn time(&self, from: usize, to: usize) -> f64 {
        self.time_hours[from][to]
    }

    /// The directed hop `from -> to` has a finite distance and time.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.distance(from, to).is_finite() && self.time(from, to).is_finite()
    }

    /// Checks both matrices are `expected x expected` and forces a zero diagonal.
    pub fn validated(mut self, expected: usize) -> Result<Self, MatrixError> {
        let square = |m: &Vec<Vec<f64>>| m.len() == expected && m.iter().all(|row| row.len() == expected);
        if !square(&self.distance_km) || !square(&self.time_hours) {
            return Err(MatrixError::Shape {
                expected,
                rows: self.distance_km.len(),
            });
        }

        for i in 0..expected {
            self.distance_km[i][i] = 0.0;
            self.time_hours[i][i] = 0.0;
        }

        Ok(self)
    }
}

#[derive(Debug)]
pub enum MatrixError {
    Http(reqwest::Error),
    /// The provider answered with matrices of the wrong size.
    Shape { expected: usize, rows: usize },
    MissingApiKey,
    EmptyResponse,
}

impl From<reqwest::Error> for MatrixError {
    fn from(err: reqwest::Error) -> Self {
        MatrixError::Http(err)
    }
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::Http(err) => write!(f, "matrix request failed: {}", err),
            MatrixError::Shape { expected, rows } => write!(
                f,
                "matrix provider returned {} rows, expected a {}x{} matrix",
                rows, expected, expected
            ),
            MatrixError::MissingApiKey => write!(f, "matrix provider API key is not configured"),
            MatrixError::EmptyResponse => write!(f, "matrix provider returned no data"),
        }
    }
}

impl std::error::Error for MatrixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatrixError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Entries kept by [`CachedMatrix::new`] before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Memoizes an inner provider by the exact set (and order) of coordinates.
///
/// Repeated solves over the same places reuse the first answer instead of
/// calling the external service again. Failed lookups are not cached. At
/// most `capacity` entries are held; the oldest insertion is evicted first.
#[derive(Debug)]
pub struct CachedMatrix<P> {
    inner: P,
    capacity: usize,
    cache: Mutex<MatrixCache>,
}

#[derive(Debug, Default)]
struct MatrixCache {
    entries: HashMap<String, TravelMatrices>,
    order: VecDeque<String>,
}

impl MatrixCache {
    fn insert(&mut self, key: String, matrices: TravelMatrices, capacity: usize) {
        if self.entries.insert(key.clone(), matrices).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

impl<P: TravelMatrixProvider> CachedMatrix<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero disables caching.
    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            cache: Mutex::new(MatrixCache::default()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cached_entries(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn clear(&self) {
        let mut cache = self.lock();
        cache.entries.clear();
        cache.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MatrixCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: TravelMatrixProvider> TravelMatrixProvider for CachedMatrix<P> {
    fn matrices_for(&self, locations: &[(f64, f64)]) -> Result<TravelMatrices, MatrixError> {
        let key = locations
            .iter()
            .map(|location| location_key(*location))
            .collect::<Vec<_>>()
            .join(";");

        if let Some(hit) = self.lock().entries.get(&key) {
            debug!(locations = locations.len(), "travel matrix cache hit");
            return Ok(hit.clone());
        }

        let matrices = self.inner.matrices_for(locations)?;
        self.lock().insert(key, matrices.clone(), self.capacity);

        Ok(matrices)
    }
}

pub(crate) fn location_key(location: (f64, f64)) -> String {
    format!("{:.6},{:.6}", location.0, location.1)
}
