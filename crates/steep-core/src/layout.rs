//! Constraint-based layout resolution.
//!
//! A [`LayoutNode`] tree is declared once at application setup. Each split
//! node divides its rectangle along one axis among its children according to
//! their [`Constraint`]s; leaves bind the resulting rectangle to a widget
//! identifier.
//!
//! ```
//! use steep_core::geometry::Rect;
//! use steep_core::layout::{resolve, Constraint, LayoutNode};
//!
//! let root = LayoutNode::horizontal([
//!     LayoutNode::leaf("sidebar").constraint(Constraint::Length(20)),
//!     LayoutNode::leaf("main").constraint(Constraint::Flex(1)),
//! ]);
//! let areas = resolve(&root, Rect::new(0, 0, 100, 50));
//! assert_eq!(areas["sidebar"], Rect::new(0, 0, 20, 50));
//! assert_eq!(areas["main"], Rect::new(20, 0, 80, 50));
//! ```

use crate::geometry::Rect;
use std::collections::{HashMap, HashSet};

/// Split axis of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Children are laid out left to right; the split consumes width.
    Horizontal,
    /// Children are laid out top to bottom; the split consumes height.
    Vertical,
}

/// How much of its parent's split axis a child receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// A fixed number of cells, clamped to the space still available.
    Length(u16),
    /// A percentage (0–100) of the split's extent, rounded down.
    Percent(u16),
    /// A weighted share of whatever remains after fixed and percentage
    /// children. Weights below 1 are treated as 1.
    Flex(u16),
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint::Flex(1)
    }
}

/// Errors found while validating a layout against the mounted widgets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A leaf names an identifier with no mounted widget.
    #[error("layout references widget `{id}`, but no widget with that identifier is mounted")]
    UnmountedWidget {
        /// The offending identifier.
        id: String,
    },
    /// Two mounted widgets share one identifier.
    #[error("widget identifier `{id}` is mounted more than once")]
    DuplicateWidget {
        /// The offending identifier.
        id: String,
    },
}

/// A node in the layout tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    /// Binds an area to a widget identifier.
    Leaf {
        /// Identifier of the widget that renders here.
        id: String,
        /// Share of the parent's split axis.
        constraint: Constraint,
    },
    /// Splits its area among `children` along `direction`.
    Split {
        /// The split axis.
        direction: Direction,
        /// Share of the parent's split axis.
        constraint: Constraint,
        /// Children in layout order.
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    /// A leaf for widget `id` with a `Flex(1)` constraint.
    pub fn leaf(id: impl Into<String>) -> Self {
        LayoutNode::Leaf {
            id: id.into(),
            constraint: Constraint::default(),
        }
    }

    /// A left-to-right split.
    pub fn horizontal(children: impl IntoIterator<Item = LayoutNode>) -> Self {
        Self::split(Direction::Horizontal, children)
    }

    /// A top-to-bottom split.
    pub fn vertical(children: impl IntoIterator<Item = LayoutNode>) -> Self {
        Self::split(Direction::Vertical, children)
    }

    /// A split along `direction` with a `Flex(1)` constraint.
    pub fn split(direction: Direction, children: impl IntoIterator<Item = LayoutNode>) -> Self {
        LayoutNode::Split {
            direction,
            constraint: Constraint::default(),
            children: children.into_iter().collect(),
        }
    }

    /// Replace this node's constraint.
    pub fn constraint(mut self, value: Constraint) -> Self {
        match &mut self {
            LayoutNode::Leaf { constraint, .. } | LayoutNode::Split { constraint, .. } => {
                *constraint = value;
            }
        }
        self
    }

    /// This node's constraint.
    pub fn get_constraint(&self) -> Constraint {
        match self {
            LayoutNode::Leaf { constraint, .. } | LayoutNode::Split { constraint, .. } => {
                *constraint
            }
        }
    }

    /// Every leaf identifier, depth-first in layout order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            LayoutNode::Leaf { id, .. } => out.push(id),
            LayoutNode::Split { children, .. } => {
                for child in children {
                    child.collect_ids(out);
                }
            }
        }
    }

    /// Check that every leaf names one of `mounted`.
    ///
    /// Reports the first unmounted identifier in layout order.
    pub fn validate<'a>(&self, mounted: impl IntoIterator<Item = &'a str>) -> Result<(), LayoutError> {
        let mounted: HashSet<&str> = mounted.into_iter().collect();
        match self.identifiers().into_iter().find(|id| !mounted.contains(id)) {
            Some(id) => Err(LayoutError::UnmountedWidget { id: id.to_string() }),
            None => Ok(()),
        }
    }
}

/// Compute a rectangle for every reachable leaf of `root` inside `area`.
///
/// Leaves whose share of a split is zero are omitted from the result: the
/// widget has no visible space under the current constraints.
pub fn resolve(root: &LayoutNode, area: Rect) -> HashMap<String, Rect> {
    let mut out = HashMap::new();
    resolve_into(root, area, &mut out);
    out
}

fn resolve_into(node: &LayoutNode, area: Rect, out: &mut HashMap<String, Rect>) {
    match node {
        LayoutNode::Leaf { id, .. } => {
            out.insert(id.clone(), area);
        }
        LayoutNode::Split {
            direction,
            children,
            ..
        } => {
            let total = match direction {
                Direction::Horizontal => area.width,
                Direction::Vertical => area.height,
            };
            let constraints: Vec<Constraint> =
                children.iter().map(LayoutNode::get_constraint).collect();
            let extents = split_extents(total, &constraints);

            let mut cursor = 0u16;
            for (child, extent) in children.iter().zip(extents) {
                if extent > 0 {
                    let sub = match direction {
                        Direction::Horizontal => {
                            Rect::new(area.x.saturating_add(cursor), area.y, extent, area.height)
                        }
                        Direction::Vertical => {
                            Rect::new(area.x, area.y.saturating_add(cursor), area.width, extent)
                        }
                    };
                    resolve_into(child, sub, out);
                }
                cursor += extent;
            }
        }
    }
}

/// Divide `total` cells among `constraints`.
///
/// Fixed and percentage shares are taken first, in order, each clamped to
/// what is left. The remainder goes to flex children by weight, the last
/// flex child absorbing rounding leftovers. Without flex children the last
/// child absorbs any leftover, so the result always sums to `total` (or to
/// zero when there are no children).
pub fn split_extents(total: u16, constraints: &[Constraint]) -> Vec<u16> {
    let mut extents = vec![0u16; constraints.len()];
    if constraints.is_empty() {
        return extents;
    }

    let mut remaining = total;
    for (slot, constraint) in extents.iter_mut().zip(constraints) {
        let want = match *constraint {
            Constraint::Length(n) => n,
            Constraint::Percent(p) => (u32::from(total) * u32::from(p.min(100)) / 100) as u16,
            Constraint::Flex(_) => continue,
        };
        *slot = want.min(remaining);
        remaining -= *slot;
    }

    let flex: Vec<(usize, u32)> = constraints
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match c {
            Constraint::Flex(w) => Some((i, u32::from((*w).max(1)))),
            _ => None,
        })
        .collect();

    match flex.split_last() {
        Some((&(last, _), rest)) => {
            let weight_sum: u32 = flex.iter().map(|(_, w)| w).sum();
            let pool = u32::from(remaining);
            let mut given = 0u32;
            for &(i, w) in rest {
                let share = pool * w / weight_sum;
                extents[i] = share as u16;
                given += share;
            }
            extents[last] = (pool - given) as u16;
        }
        None => {
            if let Some(last) = extents.last_mut() {
                *last += remaining;
            }
        }
    }
    extents
}
