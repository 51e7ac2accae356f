//! Generalized Merkle tree indices.
//!
//! A generalized index encodes depth and position at once: the root is `1`,
//! the children of `i` are `2i` and `2i + 1`. The depth is the position of the
//! highest set bit.

use serde::{Deserialize, Serialize};

use super::error::SszError;

/// Generalized index of a node in a binary Merkle tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GIndex(u64);

impl GIndex {
    /// The root node.
    pub const ROOT: GIndex = GIndex(1);

    /// Wrap a raw generalized index.
    pub const fn new(index: u64) -> Result<Self, SszError> {
        if index == 0 {
            return Err(SszError::ZeroGIndex);
        }
        Ok(Self(index))
    }

    /// Index of the leaf at `position` in a tree of `depth`.
    pub fn from_depth_and_position(depth: u32, position: u64) -> Result<Self, SszError> {
        if depth > 63 {
            return Err(SszError::GIndexOverflow);
        }
        let width = 1u64 << depth;
        if position >= width {
            return Err(SszError::IndexOutOfRange { index: width, shift: position, depth });
        }
        Ok(Self(width | position))
    }

    /// Raw index value.
    pub const fn index(&self) -> u64 {
        self.0
    }

    /// Distance from the root.
    pub const fn depth(&self) -> u32 {
        63 - self.0.leading_zeros()
    }

    /// Position among the nodes of the same depth.
    pub const fn position(&self) -> u64 {
        self.0 ^ (1u64 << self.depth())
    }

    /// Whether this is the root.
    pub const fn is_root(&self) -> bool {
        self.0 == 1
    }

    /// Parent node, `None` for the root.
    pub const fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0 >> 1))
        }
    }

    /// Left child.
    pub fn left(&self) -> Result<Self, SszError> {
        self.0.checked_mul(2).map(Self).ok_or(SszError::GIndexOverflow)
    }

    /// Right child.
    pub fn right(&self) -> Result<Self, SszError> {
        self.left().map(|left| Self(left.0 | 1))
    }

    /// Index of `rhs` taken relative to the subtree rooted at `self`.
    pub fn concat(&self, rhs: GIndex) -> Result<Self, SszError> {
        let rhs_depth = rhs.depth();
        if self.depth() + rhs_depth > 63 {
            return Err(SszError::GIndexOverflow);
        }
        Ok(Self((self.0 << rhs_depth) | rhs.position()))
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub const fn is_parent_of(&self, other: &GIndex) -> bool {
        let (own, theirs) = (self.depth(), other.depth());
        theirs > own && (other.0 >> (theirs - own)) == self.0
    }

    /// Move `n` positions to the right at the same depth.
    pub fn shift_right(&self, n: u64) -> Result<Self, SszError> {
        let depth = self.depth();
        let out_of_range = SszError::IndexOutOfRange { index: self.0, shift: n, depth };
        let position = self.position().checked_add(n).ok_or(out_of_range)?;
        if position >= (1u64 << depth) {
            return Err(out_of_range);
        }
        Ok(Self(self.0 + n))
    }

    /// Move `n` positions to the left at the same depth.
    pub fn shift_left(&self, n: u64) -> Result<Self, SszError> {
        if n > self.position() {
            return Err(SszError::IndexOutOfRange { index: self.0, shift: n, depth: self.depth() });
        }
        Ok(Self(self.0 - n))
    }
}

impl TryFrom<u64> for GIndex {
    type Error = SszError;

    fn try_from(index: u64) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}
