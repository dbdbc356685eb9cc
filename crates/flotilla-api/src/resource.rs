//! Multidimensional resource vectors.
//!
//! A [`Resource`] maps dimension names (cpu, memory, plus arbitrary
//! scalars such as `pods` or GPU types) to non-negative quantities.
//! CPU is stored in millicores and memory in bytes, matching the
//! quantity syntax accepted by [`parse_quantity`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Dimension name for CPU (millicores).
pub const RES_CPU: &str = "cpu";
/// Dimension name for memory (bytes).
pub const RES_MEMORY: &str = "memory";
/// Dimension name for the per-node task count limit.
pub const RES_PODS: &str = "pods";

/// Quantities closer to zero than this are treated as zero.
///
/// Comparisons tolerate this much drift so that repeated add/sub cycles
/// on f64 quantities cannot flip a feasibility decision.
const MIN_QUANTITY: f64 = 0.01;

/// A resource vector over named dimensions.
///
/// Dimensions are kept in a `BTreeMap` so iteration order, and therefore
/// everything derived from it (fingerprints, deficit listings, log
/// output), is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    quantities: BTreeMap<String, f64>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, dropping non-positive quantities.
    pub fn with(mut self, dimension: &str, quantity: f64) -> Self {
        self.set(dimension, quantity);
        self
    }

    /// Convenience constructor from cpu/memory quantity strings
    /// (`"2"`, `"500m"`, `"4Gi"`).
    pub fn from_spec(cpu: &str, memory: &str) -> Result<Self, ApiError> {
        let mut res = Resource::new();
        res.set(RES_CPU, parse_quantity(cpu)? * 1000.0);
        res.set(RES_MEMORY, parse_quantity(memory)?);
        Ok(res)
    }

    pub fn get(&self, dimension: &str) -> f64 {
        self.quantities.get(dimension).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, dimension: &str, quantity: f64) {
        if quantity > MIN_QUANTITY {
            self.quantities.insert(dimension.to_string(), quantity);
        } else {
            self.quantities.remove(dimension);
        }
    }

    /// Iterate dimensions in deterministic (lexicographic) order.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, f64)> {
        self.quantities.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// True when every dimension is (effectively) zero.
    pub fn is_empty(&self) -> bool {
        self.quantities.values().all(|q| *q <= MIN_QUANTITY)
    }

    pub fn add(&mut self, other: &Resource) {
        for (dim, qty) in other.dimensions() {
            let sum = self.get(dim) + qty;
            self.set(dim, sum);
        }
    }

    /// Dimension-wise subtraction, saturating at zero.
    ///
    /// Underflow is not an error here; callers that care assert the
    /// `self >= other` invariant before subtracting.
    pub fn sub(&mut self, other: &Resource) {
        for (dim, qty) in other.dimensions() {
            let rest = (self.get(dim) - qty).max(0.0);
            self.set(dim, rest);
        }
    }

    pub fn mul(&self, factor: f64) -> Resource {
        let mut out = Resource::new();
        for (dim, qty) in self.dimensions() {
            out.set(dim, qty * factor);
        }
        out
    }

    /// Returns `self + other` without mutating either.
    pub fn plus(&self, other: &Resource) -> Resource {
        let mut out = self.clone();
        out.add(other);
        out
    }

    /// Returns `self - other` (saturating) without mutating either.
    pub fn minus(&self, other: &Resource) -> Resource {
        let mut out = self.clone();
        out.sub(other);
        out
    }

    /// Dimension-wise `self <= other`. Dimensions absent from `other`
    /// count as zero.
    pub fn less_equal(&self, other: &Resource) -> bool {
        self.quantities
            .iter()
            .all(|(dim, qty)| *qty <= other.get(dim) + MIN_QUANTITY)
    }

    /// Like [`less_equal`](Self::less_equal), but only over dimensions
    /// where `dims` is non-zero.
    ///
    /// This is the comparison behind dimensional admission: a request
    /// that asks for no memory is not blocked by memory overuse.
    pub fn less_equal_with_dimension(&self, other: &Resource, dims: &Resource) -> bool {
        dims.dimensions()
            .all(|(dim, _)| self.get(dim) <= other.get(dim) + MIN_QUANTITY)
    }

    /// Per-dimension deficit of fitting `self` into `capacity`.
    ///
    /// Empty map means it fits.
    pub fn fit_delta(&self, capacity: &Resource) -> BTreeMap<String, f64> {
        let mut deficit = BTreeMap::new();
        for (dim, qty) in self.dimensions() {
            let missing = qty - capacity.get(dim);
            if missing > MIN_QUANTITY {
                deficit.insert(dim.to_string(), missing);
            }
        }
        deficit
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (dim, qty) in self.dimensions() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{dim}={qty}")?;
            first = false;
        }
        if first {
            write!(f, "<empty>")?;
        }
        Ok(())
    }
}

/// Parse a quantity string into a plain number.
///
/// Accepts a bare decimal plus the usual suffixes: `m` (1/1000),
/// `K`/`M`/`G`/`T` (powers of 1000) and `Ki`/`Mi`/`Gi`/`Ti` (powers of
/// 1024). `"500m"` parses to `0.5`; callers storing CPU multiply by
/// 1000 to get millicores.
pub fn parse_quantity(input: &str) -> Result<f64, ApiError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ApiError::InvalidQuantity(input.to_string()));
    }

    let (number, multiplier) = if let Some(prefix) = s.strip_suffix("Ki") {
        (prefix, 1024.0)
    } else if let Some(prefix) = s.strip_suffix("Mi") {
        (prefix, 1024.0 * 1024.0)
    } else if let Some(prefix) = s.strip_suffix("Gi") {
        (prefix, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(prefix) = s.strip_suffix("Ti") {
        (prefix, 1024.0 * 1024.0 * 1024.0 * 1024.0)
    } else if let Some(prefix) = s.strip_suffix('m') {
        (prefix, 1e-3)
    } else if let Some(prefix) = s.strip_suffix('K') {
        (prefix, 1e3)
    } else if let Some(prefix) = s.strip_suffix('M') {
        (prefix, 1e6)
    } else if let Some(prefix) = s.strip_suffix('G') {
        (prefix, 1e9)
    } else if let Some(prefix) = s.strip_suffix('T') {
        (prefix, 1e12)
    } else {
        (s, 1.0)
    };

    let value: f64 = number
        .parse()
        .map_err(|_| ApiError::InvalidQuantity(input.to_string()))?;
    if value < 0.0 {
        return Err(ApiError::InvalidQuantity(input.to_string()));
    }
    Ok(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(cpu_millis: f64, mem: f64) -> Resource {
        Resource::new().with(RES_CPU, cpu_millis).with(RES_MEMORY, mem)
    }

    #[test]
    fn parses_plain_and_suffixed_quantities() {
        assert_eq!(parse_quantity("2").unwrap(), 2.0);
        assert_eq!(parse_quantity("500m").unwrap(), 0.5);
        assert_eq!(parse_quantity("1Ki").unwrap(), 1024.0);
        assert_eq!(parse_quantity("4Gi").unwrap(), 4.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(parse_quantity("3G").unwrap(), 3e9);
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("lots").is_err());
    }

    #[test]
    fn from_spec_stores_millicores_and_bytes() {
        let r = Resource::from_spec("2", "1Gi").unwrap();
        assert_eq!(r.get(RES_CPU), 2000.0);
        assert_eq!(r.get(RES_MEMORY), 1024.0 * 1024.0 * 1024.0);
    }

    #[test]
    fn sub_saturates_at_zero() {
        let mut a = res(1000.0, 100.0);
        a.sub(&res(2000.0, 30.0));
        assert_eq!(a.get(RES_CPU), 0.0);
        assert_eq!(a.get(RES_MEMORY), 70.0);
    }

    #[test]
    fn less_equal_treats_missing_dimensions_as_zero() {
        let small = Resource::new().with("gpu", 1.0);
        let big = res(4000.0, 1024.0);
        assert!(!small.less_equal(&big));
        assert!(Resource::new().less_equal(&big));
    }

    #[test]
    fn less_equal_with_dimension_ignores_unrequested_dims() {
        // Memory already over the bound, but the request only asks for cpu.
        let used = res(1000.0, 3000.0);
        let bound = res(2000.0, 2000.0);
        let cpu_only = Resource::new().with(RES_CPU, 1000.0);

        assert!(!used.less_equal(&bound));
        assert!(used.less_equal_with_dimension(&bound, &cpu_only));
        assert!(!used.less_equal_with_dimension(&bound, &res(1.0, 1.0)));
    }

    #[test]
    fn fit_delta_reports_each_short_dimension() {
        let req = res(3000.0, 500.0);
        let cap = res(1000.0, 1000.0);
        let deficit = req.fit_delta(&cap);
        assert_eq!(deficit.len(), 1);
        assert_eq!(deficit[RES_CPU], 2000.0);
    }

    #[test]
    fn empty_after_exact_subtraction() {
        let mut a = res(500.0, 200.0);
        a.sub(&res(500.0, 200.0));
        assert!(a.is_empty());
    }

    #[test]
    fn mul_scales_every_dimension() {
        let r = res(100.0, 10.0).mul(3.0);
        assert_eq!(r.get(RES_CPU), 300.0);
        assert_eq!(r.get(RES_MEMORY), 30.0);
    }
}
