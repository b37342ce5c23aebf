//! Spatial domains that expressions are defined over.
//!
//! A domain is an ordered list of named mesh regions, such as `["negative electrode",
//! "separator", "positive electrode"]`. The empty domain is used for quantities that do not vary
//! in space (scalars, parameters, time) and combines with every other domain.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The negative electrode region of the cell.
pub const NEGATIVE_ELECTRODE: &str = "negative electrode";

/// The separator region of the cell.
pub const SEPARATOR: &str = "separator";

/// The positive electrode region of the cell.
pub const POSITIVE_ELECTRODE: &str = "positive electrode";

/// A representative particle in the negative electrode.
pub const NEGATIVE_PARTICLE: &str = "negative particle";

/// A representative particle in the positive electrode.
pub const POSITIVE_PARTICLE: &str = "positive particle";

/// The current collector, perpendicular to the through-cell direction.
pub const CURRENT_COLLECTOR: &str = "current collector";

/// An ordered set of mesh regions an expression is defined over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Domain(Vec<String>);

impl Domain {
    /// Creates a domain from the given region names, in order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// The empty domain.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The whole cell: negative electrode, separator and positive electrode.
    pub fn whole_cell() -> Self {
        Self::new([NEGATIVE_ELECTRODE, SEPARATOR, POSITIVE_ELECTRODE])
    }

    /// Returns true if the domain is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The region names of this domain, in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Combines the domains of two operands of an element-wise operator.
    ///
    /// An empty domain combines with anything; otherwise both domains must be equal. Returns
    /// [`None`] if the domains are incompatible.
    pub fn combine(&self, other: &Self) -> Option<Self> {
        if self.is_empty() {
            Some(other.clone())
        } else if other.is_empty() || self == other {
            Some(self.clone())
        } else {
            None
        }
    }

    /// Returns true if the two domains share no region.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.0.iter().all(|name| !other.0.contains(name))
    }

    /// Appends the regions of `other` after the regions of this domain.
    pub fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no domain");
        }

        write!(f, "[")?;
        let mut iter = self.0.iter();
        if let Some(name) = iter.next() {
            write!(f, "{}", name)?;
            for name in iter {
                write!(f, ", {}", name)?;
            }
        }
        write!(f, "]")
    }
}

impl From<&str> for Domain {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl<const N: usize> From<[&str; N]> for Domain {
    fn from(names: [&str; N]) -> Self {
        Self::new(names)
    }
}

impl From<Vec<String>> for Domain {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_combines_with_anything() {
        let electrode = Domain::from(NEGATIVE_ELECTRODE);
        assert_eq!(Domain::empty().combine(&electrode), Some(electrode.clone()));
        assert_eq!(electrode.combine(&Domain::empty()), Some(electrode));
    }

    #[test]
    fn mismatched_domains() {
        let n = Domain::from(NEGATIVE_ELECTRODE);
        let p = Domain::from(POSITIVE_ELECTRODE);
        assert_eq!(n.combine(&p), None);
        assert!(n.is_disjoint(&p));
        assert!(!Domain::whole_cell().is_disjoint(&p));
    }

    #[test]
    fn display() {
        assert_eq!(Domain::whole_cell().to_string(), "[negative electrode, separator, positive electrode]");
        assert_eq!(Domain::empty().to_string(), "no domain");
    }
}
