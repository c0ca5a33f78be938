//! # Barnes–Hut Quadtree (2D)
//!
//! This module implements a **2D Barnes–Hut quadtree** for approximating
//! gravitational force in an `N`-body system. It replaces the naive `O(N²)`
//! all-pairs sum with an approximate `O(N log N)` traversal while keeping
//! close interactions exact.
//!
//! ## Core Concepts
//!
//! A group of distant bodies is treated as a single pseudo-body located at
//! the group's center of mass. For sufficiently far clusters one interaction
//! replaces many.
//!
//! - The bounding square is recursively subdivided into 4 quadrants
//!   (NW, NE, SW, SE).
//! - Each region becomes a node of the quadtree, stored in a flat arena
//!   (`Vec<QuadNode>`) and addressed by index.
//! - A node is either a leaf holding its bodies directly, or an internal
//!   node with exactly four children and no body of its own. A leaf holds
//!   one body unless bodies could not be separated by splitting (coincident
//!   positions, or [`MAX_DEPTH`] reached).
//! - Each node stores:
//!   - total mass of its subtree
//!   - center of mass (COM)
//!   - bounding square (center + half-extent)
//!
//! ## Lifecycle
//!
//! The tree is rebuilt from scratch for every force evaluation:
//! 1. insert every body top-down (`QuadTree::insert`),
//! 2. aggregate mass and COM bottom-up (`QuadTree::finalize`),
//! 3. answer read-only force queries (`QuadTree::force_at`).
//!
//! Nothing survives between steps, so a body that moved can never be found
//! in a stale quadrant.

use crate::simulation::forces::gravitational_pull;
use crate::simulation::states::{Body, NVec2};

/// Smallest width/height of the root square. A single body, or bodies on a
/// line, would otherwise produce a zero-size region.
pub const MIN_EXTENT: f64 = 1.0e-3;

/// Relative growth of the root square so the outermost bodies sit strictly
/// inside it rather than on its rounded edge.
pub const BOUNDS_PADDING: f64 = 0.01;

/// Past this depth further bodies join the leaf's occupant list instead of
/// subdividing again. Bounds recursion for bodies closer together than the
/// root size divided by 2^64.
pub const MAX_DEPTH: usize = 64;

/// Child slot order used by `QuadNode::children`.
pub const NW: usize = 0;
pub const NE: usize = 1;
pub const SW: usize = 2;
pub const SE: usize = 3;

/// Axis-aligned box given by center and half-extent.
///
/// Trees only ever build squares (`half.x == half.y`), but the size proxy
/// used by the opening criterion is defined for the general case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: NVec2,
    pub half: NVec2,
}

impl Aabb {
    pub fn new(center: NVec2, half: NVec2) -> Self {
        Self { center, half }
    }

    pub fn square(center: NVec2, half: f64) -> Self {
        Self::new(center, NVec2::new(half, half))
    }

    /// Compute a bounding square that encloses all bodies.
    ///
    /// This function:
    /// - Scans all body positions for the min and max along each axis.
    /// - Floors both the width and the height at [`MIN_EXTENT`].
    /// - Expands the rectangle into a **square** around its center using the
    ///   larger of the two sides, then pads it by [`BOUNDS_PADDING`].
    ///
    /// An empty slice yields a minimum-size square at the origin.
    pub fn enclosing(bodies: &[Body]) -> Self {
        if bodies.is_empty() {
            return Self::square(NVec2::zeros(), 0.5 * MIN_EXTENT);
        }

        let mut min = NVec2::repeat(f64::INFINITY);
        let mut max = NVec2::repeat(f64::NEG_INFINITY);
        for b in bodies {
            min = min.inf(&b.x);
            max = max.sup(&b.x);
        }

        let width = (max.x - min.x).max(MIN_EXTENT);
        let height = (max.y - min.y).max(MIN_EXTENT);
        let half = 0.5 * width.max(height) * (1.0 + BOUNDS_PADDING);

        Self::square((min + max) * 0.5, half)
    }

    /// Inclusive containment test: points on the boundary are inside.
    pub fn contains(&self, p: &NVec2) -> bool {
        (p.x - self.center.x).abs() <= self.half.x && (p.y - self.center.y).abs() <= self.half.y
    }

    /// Size proxy `s` of the opening criterion: sum of the half-extents.
    pub fn size(&self) -> f64 {
        self.half.x + self.half.y
    }

    /// Compute the quadrant a point falls into relative to this box.
    ///
    /// Points on the vertical split line go west and points on the
    /// horizontal split line go north, so a point on the center lands in NW.
    pub fn quadrant_of(&self, p: &NVec2) -> usize {
        let east = p.x > self.center.x;
        let north = p.y >= self.center.y;
        match (north, east) {
            (true, false) => NW,
            (true, true) => NE,
            (false, false) => SW,
            (false, true) => SE,
        }
    }

    /// Compute the box of one quadrant: half the half-extent, with the
    /// center offset into that quadrant.
    pub fn quadrant(&self, quadrant: usize) -> Aabb {
        let hs = self.half * 0.5;
        let c = self.center;
        let center = match quadrant {
            NW => NVec2::new(c.x - hs.x, c.y + hs.y),
            NE => NVec2::new(c.x + hs.x, c.y + hs.y),
            SW => NVec2::new(c.x - hs.x, c.y - hs.y),
            _ => NVec2::new(c.x + hs.x, c.y - hs.y),
        };
        Aabb::new(center, hs)
    }
}

/// A body held by a leaf: its index in the caller's slice plus the position
/// and mass it was inserted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub index: usize,
    pub position: NVec2,
    pub mass: f64,
}

/// A single quadtree node.
///
/// Each node represents a square region of space that may be:
/// - empty (leaf, no occupants)
/// - holding bodies (leaf, usually exactly one occupant)
/// - internal (`children = Some([nw, ne, sw, se])`, no occupants)
#[derive(Debug, Clone)]
pub struct QuadNode {
    pub bounds: Aabb,
    pub mass: f64,
    pub com: NVec2,
    pub occupants: Vec<Occupant>,
    pub children: Option<[usize; 4]>, // indices into QuadTree::nodes
}

impl QuadNode {
    fn empty(bounds: Aabb) -> Self {
        Self {
            bounds,
            mass: 0.0,
            com: NVec2::zeros(),
            occupants: Vec::new(),
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A Barnes–Hut quadtree stored as an arena of nodes.
///
/// The root is always at index 0.
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
}

impl QuadTree {
    /// Create a tree holding a single empty root covering `bounds`.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            nodes: vec![QuadNode::empty(bounds)],
        }
    }

    /// Build a finalized quadtree over `bodies`.
    ///
    /// This:
    /// 1. Computes the enclosing square with [`Aabb::enclosing`].
    /// 2. Inserts each body by index, subdividing leaves as needed.
    /// 3. Runs [`QuadTree::finalize`] so the tree is ready for queries.
    pub fn build(bodies: &[Body]) -> Self {
        let mut tree = Self::new(Aabb::enclosing(bodies));
        for (i, b) in bodies.iter().enumerate() {
            if !tree.insert(i, b) {
                log::warn!("body {i} at ({}, {}) lies outside the quadtree root", b.x.x, b.x.y);
            }
        }
        tree.finalize();
        tree
    }

    pub fn root(&self) -> &QuadNode {
        &self.nodes[0]
    }

    pub fn node(&self, idx: usize) -> &QuadNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[QuadNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().is_leaf() && self.root().occupants.is_empty()
    }

    /// Total mass of the tree (valid after `finalize`)
    pub fn total_mass(&self) -> f64 {
        self.root().mass
    }

    /// Center of mass of the tree (valid after `finalize`)
    pub fn center_of_mass(&self) -> NVec2 {
        self.root().com
    }

    /// Insert body `index` into the tree.
    ///
    /// Returns `false` and leaves the tree untouched when the body lies
    /// outside the root square; the caller is responsible for sizing the
    /// root so that never happens.
    pub fn insert(&mut self, index: usize, body: &Body) -> bool {
        if !self.nodes[0].bounds.contains(&body.x) {
            return false;
        }
        let occupant = Occupant {
            index,
            position: body.x,
            mass: body.m,
        };
        self.insert_at(0, occupant, 0);
        true
    }

    /// Insert a body below `node_idx`.
    ///
    /// - Empty leaf: it takes the body and records the body's mass and
    ///   position as its own aggregate.
    /// - Occupied leaf: it splits into four quadrants, pushes its previous
    ///   bodies down into the matching children and then carries on as an
    ///   internal node. A body landing exactly on the occupants (or any body
    ///   at [`MAX_DEPTH`]) joins the leaf's occupant list instead, since no
    ///   amount of splitting would separate them.
    /// - Internal node: the body goes to the quadrant containing it.
    ///
    /// Containment below the root is decided by [`Aabb::quadrant_of`], which
    /// always picks a child, so rounding in the child boxes cannot drop a body.
    fn insert_at(&mut self, node_idx: usize, occupant: Occupant, depth: usize) {
        let node = &mut self.nodes[node_idx];

        if let Some(children) = node.children {
            let q = node.bounds.quadrant_of(&occupant.position);
            self.insert_at(children[q], occupant, depth + 1);
            return;
        }

        let fold = match node.occupants.first() {
            None => true,
            Some(existing) => existing.position == occupant.position || depth >= MAX_DEPTH,
        };

        if fold {
            let total = node.mass + occupant.mass;
            node.com = if node.occupants.is_empty() || total <= 0.0 {
                occupant.position
            } else {
                (node.com * node.mass + occupant.position * occupant.mass) / total
            };
            node.mass = total;
            node.occupants.push(occupant);
            return;
        }

        let existing = std::mem::take(&mut node.occupants);
        node.mass = 0.0;
        node.com = NVec2::zeros();
        self.subdivide(node_idx);

        // Now internal: every body routes to its quadrant
        for previous in existing {
            self.insert_at(node_idx, previous, depth);
        }
        self.insert_at(node_idx, occupant, depth);
    }

    /// Split a leaf into four empty children covering its quadrants.
    fn subdivide(&mut self, node_idx: usize) {
        let bounds = self.nodes[node_idx].bounds;
        let first = self.nodes.len();
        for q in [NW, NE, SW, SE] {
            self.nodes.push(QuadNode::empty(bounds.quadrant(q)));
        }
        self.nodes[node_idx].children = Some([first, first + 1, first + 2, first + 3]);
    }

    /// Compute total mass and center of mass for every internal node.
    ///
    /// Post-order: children are finalized first, then each internal node
    /// takes the sum of its children's masses and the mass-weighted average
    /// of their centers of mass. Children with no mass are skipped, and an
    /// internal node whose children are all massless keeps zero mass and a
    /// zero COM. Leaves already carry their aggregate from insertion.
    pub fn finalize(&mut self) {
        self.finalize_node(0);
    }

    fn finalize_node(&mut self, node_idx: usize) {
        let Some(children) = self.nodes[node_idx].children else {
            return;
        };

        let mut mass = 0.0;
        let mut weighted = NVec2::zeros();
        for &child_idx in &children {
            // recurse first
            self.finalize_node(child_idx);
            let child = &self.nodes[child_idx];
            if child.mass > 0.0 {
                mass += child.mass;
                weighted += child.com * child.mass;
            }
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.com = if mass > 0.0 { weighted / mass } else { NVec2::zeros() };
    }

    /// Force per unit mass that the whole tree exerts at `point`.
    ///
    /// Multiply by a body's mass to get the force on that body.
    ///
    /// # Parameters
    /// - `point`    : Query location.
    /// - `theta`    : Opening threshold. `0` never approximates and reproduces
    ///   the exact pairwise sum; larger values trade accuracy for speed.
    /// - `g`        : Gravitational constant.
    /// - `softening`: Distance floor for both the force law and the `s/d` ratio.
    pub fn force_at(&self, point: NVec2, theta: f64, g: f64, softening: f64) -> NVec2 {
        self.force_from(0, point, theta, g, softening)
    }

    /// Recursively accumulate the contribution of one subtree.
    ///
    /// - **Empty subtree** (`mass <= 0`): zero.
    /// - **Leaf**: exact pull of each of its bodies, skipping any that sits
    ///   exactly on `point` (a body exerts no force on itself).
    /// - **Internal node**: with `s` the node size and `d` the distance from
    ///   its COM to `point` floored at `softening`,
    ///   - if `s / d < theta` the subtree acts as one mass at its COM,
    ///   - otherwise the four children are visited and summed.
    fn force_from(&self, node_idx: usize, point: NVec2, theta: f64, g: f64, softening: f64) -> NVec2 {
        let node = &self.nodes[node_idx];

        if node.mass <= 0.0 {
            return NVec2::zeros();
        }

        let Some(children) = node.children else {
            return node.occupants.iter().fold(NVec2::zeros(), |f, occ| {
                f + gravitational_pull(point, occ.position, occ.mass, g, softening)
            });
        };

        let s = node.bounds.size();
        let d = (node.com - point).norm().max(softening);
        let s_over_d = s / d;

        if s_over_d < theta {
            // Far enough away: approximate this node as a single mass at COM
            gravitational_pull(point, node.com, node.mass, g, softening)
        } else {
            children.iter().fold(NVec2::zeros(), |f, &child_idx| {
                f + self.force_from(child_idx, point, theta, g, softening)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(m: f64, x: f64, y: f64) -> Body {
        Body::new(m, NVec2::new(x, y))
    }

    #[test]
    fn enclosing_square_covers_all_bodies() {
        let bodies = vec![body(1.0, -3.0, 1.0), body(1.0, 5.0, -2.0), body(1.0, 0.5, 4.0)];
        let bounds = Aabb::enclosing(&bodies);

        assert_eq!(bounds.half.x, bounds.half.y);
        assert!(bodies.iter().all(|b| bounds.contains(&b.x)));
        // width 8 dominates height 6
        assert!(bounds.half.x >= 4.0);
    }

    #[test]
    fn enclosing_square_has_minimum_extent() {
        let bounds = Aabb::enclosing(&[body(1.0, 2.0, 2.0)]);
        assert!(bounds.half.x >= 0.5 * MIN_EXTENT);
        assert_eq!(bounds.center, NVec2::new(2.0, 2.0));
    }

    #[test]
    fn quadrant_boxes_tile_parent() {
        let parent = Aabb::square(NVec2::new(1.0, 1.0), 2.0);
        let nw = parent.quadrant(NW);
        let se = parent.quadrant(SE);

        assert_eq!(nw.center, NVec2::new(0.0, 2.0));
        assert_eq!(se.center, NVec2::new(2.0, 0.0));
        assert_eq!(nw.half, NVec2::new(1.0, 1.0));
        assert_eq!(parent.quadrant_of(&NVec2::new(0.5, 1.5)), NW);
        assert_eq!(parent.quadrant_of(&NVec2::new(1.5, 0.5)), SE);
        // split lines resolve west and north
        assert_eq!(parent.quadrant_of(&NVec2::new(1.0, 1.0)), NW);
    }

    #[test]
    fn insert_outside_root_fails() {
        let mut tree = QuadTree::new(Aabb::square(NVec2::zeros(), 1.0));
        assert!(!tree.insert(0, &body(1.0, 2.0, 0.0)));
        assert!(tree.is_empty());
        assert!(tree.insert(0, &body(1.0, 1.0, -1.0)));
    }

    #[test]
    fn second_body_splits_leaf() {
        let mut tree = QuadTree::new(Aabb::square(NVec2::zeros(), 1.0));
        tree.insert(0, &body(1.0, -0.5, 0.5));
        assert!(tree.root().is_leaf());

        tree.insert(1, &body(3.0, 0.5, -0.5));
        let children = tree.root().children.expect("root should have split");
        assert!(tree.root().occupants.is_empty());
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node(children[NW]).occupants[0].index, 0);
        assert_eq!(tree.node(children[SE]).occupants[0].index, 1);
        assert!(tree.node(children[NE]).occupants.is_empty());
    }

    #[test]
    fn finalize_aggregates_mass_and_center() {
        let bodies = vec![body(1.0, -1.0, 0.0), body(3.0, 1.0, 0.0), body(4.0, 0.0, 2.0)];
        let tree = QuadTree::build(&bodies);

        assert_eq!(tree.total_mass(), 8.0);
        let com = tree.center_of_mass();
        assert!((com.x - 0.25).abs() < 1e-12);
        assert!((com.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_bodies_share_a_leaf() {
        let bodies = vec![body(1.0, 0.3, 0.3), body(2.0, 0.3, 0.3)];
        let tree = QuadTree::build(&bodies);

        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().occupants.len(), 2);
        assert_eq!(tree.total_mass(), 3.0);
        assert_eq!(tree.force_at(NVec2::new(0.3, 0.3), 0.5, 1.0, 0.01), NVec2::zeros());
    }

    #[test]
    fn unsplittable_pair_keeps_both_occupants() {
        // 1e-21 apart: the split runs out of depth before separating them
        let bodies = vec![body(1.0, 0.0, 0.0), body(1.0, 1.0e-21, 0.0), body(1.0, 1.0, 1.0)];
        let tree = QuadTree::build(&bodies);

        let leaf = tree
            .nodes()
            .iter()
            .find(|n| n.is_leaf() && n.occupants.len() == 2)
            .expect("pair shares a leaf");
        let mut indices: Vec<usize> = leaf.occupants.iter().map(|o| o.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(leaf.mass, 2.0);

        // each body of the pair feels its partner at the softening floor
        let f0 = tree.force_at(bodies[0].x, 0.0, 1.0, 1.0e-3);
        let f1 = tree.force_at(bodies[1].x, 0.0, 1.0, 1.0e-3);
        assert!(f0.x > 9.9e5, "{:?}", f0);
        assert!(f1.x < -9.9e5, "{:?}", f1);
    }

    #[test]
    fn empty_tree_exerts_no_force() {
        let tree = QuadTree::build(&[]);
        assert_eq!(tree.force_at(NVec2::new(1.0, 1.0), 0.5, 1.0, 0.01), NVec2::zeros());
    }
}
