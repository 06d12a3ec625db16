// This file is part of fortune-sweep.
//
// fortune-sweep is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public
// License as published by the Free Software Foundation,
// either version 3 of the License, or (at your option)
// any later version.
//
// fortune-sweep is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty
// of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General
// Public License along with fortune-sweep. If not, see
// <https://www.gnu.org/licenses/>.

mod beachline;
mod priority_queue;
mod tests;

use crate::dcel::{Dcel, HalfEdgeId};
use crate::geometry::{circumcenter, parabola_intersections, ParabolaIntersections, Point2D, Scalar};
use crate::utils::{approx_eq, approx_neq};
use crate::Diagram;
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use beachline::{Beachline, NodeId};
use num_traits::Zero;
use priority_queue::{CircleId, Event, PriorityQueue};

/// The internal engine driving one sweep over one point set.
#[derive(Debug)]
pub(crate) struct Algorithm<Num: Scalar> {
    /// The input sites. Indices into this slice are the node keys
    /// throughout.
    sites: Box<[Point2D<Num>]>,
    /// The beachline tree and its arc list.
    beachline: Beachline,
    /// Priority queue of pending site and circle events.
    event_queue: PriorityQueue<Num>,
    /// The diagram under construction.
    dcel: Dcel<Num>,
    /// One representative boundary half-edge per site, derived after the
    /// queue drains.
    faces: Vec<Option<HalfEdgeId>>,
    /// Current position of the sweep line.
    sweep: Num,
}

impl<Num: Scalar> Algorithm<Num> {
    /// Create a new algorithm over the given sites.
    pub(crate) fn new(points: impl IntoIterator<Item = Point2D<Num>>) -> Self {
        let sites: Box<[Point2D<Num>]> = points.into_iter().collect::<Vec<_>>().into();

        // begin with a site event for every input point
        let event_queue: PriorityQueue<Num> = sites
            .iter()
            .enumerate()
            .map(|(index, &point)| Event::Site { index, point })
            .collect();

        tracing::trace!("collected {} site events", event_queue.len());

        let faces = vec![None; sites.len()];

        Self {
            sites,
            beachline: Beachline::new(),
            event_queue,
            dcel: Dcel::new(),
            faces,
            sweep: Num::zero(),
        }
    }

    #[cfg(test)]
    pub(crate) fn beachline(&self) -> &Beachline {
        &self.beachline
    }

    #[cfg(test)]
    pub(crate) fn dcel(&self) -> &Dcel<Num> {
        &self.dcel
    }

    /// Process the next event in the sweep.
    pub(crate) fn next_event(&mut self) -> Option<Event<Num>> {
        let event = self.event_queue.pop()?;

        tracing::trace!("encountered event: {:?}", &event);

        // advance the sweep line
        self.sweep = event.point().y;

        match event {
            Event::Site { index, point } => {
                self.handle_site_event(index, point);
            }
            Event::Circle {
                id, arc, center, ..
            } => {
                self.handle_circle_event(id, arc, center);
            }
        }

        if cfg!(debug_assertions) {
            self.beachline.validate();
        }

        Some(event)
    }

    /// Drain the queue, derive the faces and hand over the diagram.
    pub(crate) fn build(mut self) -> Diagram<Num> {
        while self.next_event().is_some() {}

        self.derive_faces();

        tracing::debug!(
            "diagram complete: {} vertices, {} half-edges",
            self.dcel.vertices().len(),
            self.dcel.halfedges().len(),
        );

        Diagram {
            sites: self.sites,
            dcel: self.dcel,
            faces: self.faces.into_boxed_slice(),
        }
    }

    /// Handle a site event.
    fn handle_site_event(&mut self, index: usize, point: Point2D<Num>) {
        if self.beachline.is_empty() {
            self.beachline.init_root(index);
            return;
        }

        // locate the arc covering the new site
        let arc = self
            .beachline
            .find(point.x, &self.sites, self.sweep)
            .expect("non-empty beachline without arcs");

        // the covering arc is about to change shape, so its scheduled
        // collapse no longer applies
        if let Some(circle) = self.beachline.take_circle_event(arc) {
            self.event_queue.cancel(circle);
        }

        let arc_site = self.beachline.site(arc);
        let subtree = match parabola_intersections(self.sites[arc_site], point, self.sweep) {
            ParabolaIntersections::Duplicate => {
                tracing::trace!("skipping duplicate of site {}", arc_site);
                return;
            }
            ParabolaIntersections::One(_) => {
                self.beachline
                    .make_simple_subtree(index, arc_site, &self.sites, &mut self.dcel)
            }
            ParabolaIntersections::Two(..) => {
                self.beachline.make_subtree(index, arc_site, &mut self.dcel)
            }
        };

        // thread the new outer leaves to the old arc's neighbors
        if let Some(prev) = self.beachline.prev(arc) {
            self.beachline.connect(prev, subtree.left_leaf);
        }
        if let Some(next) = self.beachline.next(arc) {
            self.beachline.connect(subtree.right_leaf, next);
        }

        // replace the old arc with the subtree and rebalance
        self.beachline
            .replace(arc, subtree.root, &self.sites, self.sweep);

        // both outer leaves now sit in fresh triples
        self.check_circle_event(subtree.left_leaf);
        self.check_circle_event(subtree.right_leaf);
    }

    /// Handle a circle event.
    fn handle_circle_event(&mut self, id: CircleId, arc: NodeId, center: Point2D<Num>) {
        if self.event_queue.is_cancelled(id) {
            tracing::trace!("skipping cancelled circle event");
            return;
        }

        let (left_bp, right_bp) = match self.beachline.breakpoints(arc) {
            (Some(left_bp), Some(right_bp)) => (left_bp, right_bp),
            _ => {
                tracing::trace!("skipping stale circle event: breakpoint missing");
                return;
            }
        };

        // the two breakpoints must have converged by now; anything else
        // means the beachline changed since this event was scheduled
        let v1 = self.beachline.key(left_bp, &self.sites, self.sweep);
        let v2 = self.beachline.key(right_bp, &self.sites, self.sweep);
        if approx_neq(v1, v2) {
            tracing::trace!("skipping stale circle event: breakpoints at {:?} and {:?}", v1, v2);
            return;
        }

        // the collapse point becomes a vertex of the diagram
        let vertex = self.dcel.add_vertex(center);
        let h_first = self
            .beachline
            .edge(left_bp)
            .expect("breakpoint without a traced edge");
        let h_second = self
            .beachline
            .edge(right_bp)
            .expect("breakpoint without a traced edge");

        let prev_leaf = self
            .beachline
            .prev(arc)
            .expect("collapsing arc without a left neighbor");
        let next_leaf = self
            .beachline
            .next(arc)
            .expect("collapsing arc without a right neighbor");

        // the neighbors' scheduled collapses involved the dying arc
        if let Some(circle) = self.beachline.take_circle_event(prev_leaf) {
            self.event_queue.cancel(circle);
        }
        if let Some(circle) = self.beachline.take_circle_event(next_leaf) {
            self.event_queue.cancel(circle);
        }

        // the breakpoint that survives the collapse is the one that is not
        // the arc's parent; `remove` rewrites it to the merged pair
        let merged_bp = if self.beachline.parent(arc) == Some(left_bp) {
            right_bp
        } else {
            left_bp
        };

        self.beachline.remove(arc);

        // the surviving breakpoint now separates the former neighbors and
        // traces a fresh edge between them
        let (h, h_twin) = self
            .dcel
            .make_twins(self.beachline.site(prev_leaf), self.beachline.site(next_leaf));
        self.beachline.set_edge(merged_bp, h);

        let h_first_twin = self.dcel.get(h_first).twin;
        let h_second_twin = self.dcel.get(h_second).twin;
        self.dcel.connect(h_second, h_first_twin);
        self.dcel.connect(h_first, h);
        self.dcel.connect(h_twin, h_second_twin);

        // half-edges are pointing into the vertex  ----> o <----
        self.dcel.set_vertex(h_first, vertex);
        self.dcel.set_vertex(h_second, vertex);
        self.dcel.set_vertex(h_twin, vertex);

        // the former neighbors are now adjacent; retest their triples
        self.check_circle_event(prev_leaf);
        self.check_circle_event(next_leaf);
    }

    /// Schedule a collapse for `leaf` if its current (prev, self, next)
    /// triple shrinks to a point at or after the sweep position.
    fn check_circle_event(&mut self, leaf: NodeId) {
        let (prev, next) = match (self.beachline.prev(leaf), self.beachline.next(leaf)) {
            (Some(prev), Some(next)) => (prev, next),
            _ => return,
        };

        let p1 = self.sites[self.beachline.site(prev)];
        let p2 = self.sites[self.beachline.site(leaf)];
        let p3 = self.sites[self.beachline.site(next)];

        // a middle arc whose site sits below both neighbors is still
        // growing and cannot be squeezed out
        if p2.y > p1.y && p2.y > p3.y {
            return;
        }

        let center = match circumcenter(p1, p2, p3) {
            Some(center) => center,
            None => return,
        };

        // the event fires when the sweep reaches the bottom of the
        // circumcircle, boundary inclusive
        let bottom = Point2D::new(center.x, center.y + (center - p2).norm());
        if !(approx_eq(bottom.y, self.sweep) || self.sweep < bottom.y) {
            return;
        }

        // an arc carries at most one live scheduled collapse
        if let Some(old) = self.beachline.take_circle_event(leaf) {
            self.event_queue.cancel(old);
        }
        let id = self.event_queue.push_circle(leaf, bottom, center);
        self.beachline.set_circle_event(leaf, id);

        tracing::trace!("scheduled circle event with bottom {:?}", bottom);
    }

    /// Pick one representative boundary half-edge per site.
    ///
    /// Scans in creation order; an edge with no `prev` link wins the slot,
    /// otherwise the first edge seen for the site keeps it.
    fn derive_faces(&mut self) {
        for index in 0..self.dcel.halfedges().len() {
            let id = HalfEdgeId::from_index(index);
            let he = self.dcel.get(id);
            if he.prev.is_none() || self.faces[he.left].is_none() {
                self.faces[he.left] = Some(id);
            }
        }
    }
}
