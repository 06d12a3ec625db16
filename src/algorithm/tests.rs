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

//! Unit tests for the sweep engine and the beachline.

#![cfg(test)]

use super::*;
use crate::utils::approx_eq_point;
use crate::build_voronoi;
use alloc::vec;
use num_traits::Float;

/// An isoceles triangle; its circumcenter is (4.5, 0.5).
const TRIANGLE: [Point2D<f64>; 3] = [
    Point2D::new(2.0, 1.0),
    Point2D::new(4.0, 3.0),
    Point2D::new(7.0, 1.0),
];

fn scatter() -> Vec<Point2D<f64>> {
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(3.2, 0.4),
        Point2D::new(6.1, 0.2),
        Point2D::new(1.5, 2.9),
        Point2D::new(4.8, 3.1),
        Point2D::new(0.7, 5.6),
        Point2D::new(5.9, 5.8),
        Point2D::new(3.0, 4.1),
    ]
}

/// Structural checks every finished diagram has to pass.
fn check_diagram(diagram: &crate::Diagram<f64>) {
    for (index, he) in diagram.halfedges().iter().enumerate() {
        let id = HalfEdgeId::from_index(index);
        let twin = diagram.dcel().get(he.twin);

        assert_eq!(twin.twin, id, "twin involution broken");
        assert_eq!(
            (twin.left, twin.right),
            (he.right, he.left),
            "twin does not reverse the site pair"
        );

        if let (Some(a), Some(b)) = (he.vertex, twin.vertex) {
            assert_ne!(a, b, "half-edge pair collapsed onto one vertex");
        }
    }

    for (site, face) in diagram.faces().iter().enumerate() {
        if let Some(face) = face {
            assert_eq!(
                diagram.dcel().get(*face).left,
                site,
                "face representative borders the wrong site"
            );
        }
    }

    // every vertex is equidistant from at least three sites, with no site
    // strictly closer
    for vertex in diagram.vertices() {
        let mut closest = f64::INFINITY;
        for &site in diagram.sites() {
            closest = Float::min(closest, (vertex.point - site).norm());
        }

        let equidistant = diagram
            .sites()
            .iter()
            .filter(|&&site| ((vertex.point - site).norm() - closest).abs() < 1e-6)
            .count();
        assert!(
            equidistant >= 3,
            "vertex is not the meeting point of three cells"
        );
    }
}

#[test]
fn two_level_sites_yield_one_bisector() {
    let diagram = build_voronoi(vec![Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0)]);

    assert_eq!(diagram.halfedges().len(), 2);
    assert_eq!(diagram.vertices().len(), 0);

    // a twin pair of unbounded rays
    for (index, he) in diagram.halfedges().iter().enumerate() {
        assert!(he.vertex.is_none());
        assert!(!diagram.dcel().is_finite(HalfEdgeId::from_index(index)));
        assert!(diagram
            .dcel()
            .vertex_next_ccw(HalfEdgeId::from_index(index))
            .is_none());
    }

    assert!(diagram.face(0).is_some());
    assert!(diagram.face(1).is_some());
    check_diagram(&diagram);
}

#[test]
fn tangent_split_orders_the_breakpoint_by_x() {
    let mut alg = Algorithm::new(vec![Point2D::new(4.0, 0.0), Point2D::new(0.0, 0.0)]);
    while alg.next_event().is_some() {}

    let beachline = alg.beachline();
    // the second site (index 1) lies to the left of the first
    assert_eq!(beachline.leaf_sites(), vec![1, 0]);

    let root = beachline.root().expect("beachline emptied");
    assert_eq!(beachline.indices(root), (1, 0));
}

#[test]
fn triangle_yields_its_circumcenter() {
    let diagram = build_voronoi(TRIANGLE.to_vec());

    assert_eq!(diagram.vertices().len(), 1);
    assert_eq!(diagram.halfedges().len(), 6);

    let vertex = &diagram.vertices()[0];
    assert!(approx_eq_point(vertex.point, Point2D::new(4.5, 0.5)));

    // three rays end in the vertex, their twins stay unbounded
    let finished = diagram
        .halfedges()
        .iter()
        .filter(|he| he.vertex.is_some())
        .count();
    assert_eq!(finished, 3);

    // the incident edge points into the vertex
    let incident = vertex.edge.expect("vertex without an incident edge");
    let head = diagram.dcel().get(incident).vertex.expect("incident edge misses its head");
    assert!(approx_eq_point(diagram.dcel().vertex(head).point, vertex.point));

    for site in 0..3 {
        assert!(diagram.face(site).is_some());
    }
    check_diagram(&diagram);
}

#[test]
fn circulating_the_vertex_visits_all_three_edges() {
    let diagram = build_voronoi(TRIANGLE.to_vec());
    let vertex = &diagram.vertices()[0];
    let first = vertex.edge.expect("vertex without an incident edge");

    let mut seen = vec![first];
    let mut current = first;
    loop {
        let next = diagram
            .dcel()
            .vertex_next_ccw(current)
            .expect("open fan around an interior vertex");
        // the clockwise circulator undoes the counterclockwise one
        assert_eq!(diagram.dcel().vertex_next_cw(next), Some(current));
        if next == first {
            break;
        }
        seen.push(next);
        current = next;
    }

    assert_eq!(seen.len(), 3);
    for id in seen {
        assert!(diagram.dcel().get(id).vertex.is_some());
        assert!(!diagram.dcel().is_finite(id));
    }
}

#[test]
fn collinear_sites_never_commit_a_circle_event() {
    let diagonal = build_voronoi(vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(1.0, 1.0),
        Point2D::new(2.0, 2.0),
    ]);
    assert_eq!(diagonal.vertices().len(), 0);
    assert_eq!(diagonal.halfedges().len(), 4);
    check_diagram(&diagonal);

    let horizontal = build_voronoi(vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(2.0, 0.0),
        Point2D::new(5.0, 0.0),
    ]);
    assert_eq!(horizontal.vertices().len(), 0);
    assert_eq!(horizontal.halfedges().len(), 4);
    check_diagram(&horizontal);
}

#[test]
fn duplicate_sites_are_skipped() {
    let mut points = TRIANGLE.to_vec();
    points.push(TRIANGLE[0]);

    let diagram = build_voronoi(points);

    assert_eq!(diagram.vertices().len(), 1);
    assert_eq!(diagram.halfedges().len(), 6);

    // the two copies pop back to back; whichever surfaces second is
    // skipped and owns no face
    assert!(diagram.face(0).is_some() != diagram.face(3).is_some());
    assert!(diagram.face(1).is_some());
    assert!(diagram.face(2).is_some());

    check_diagram(&diagram);
}

#[test]
fn split_schedules_a_collapse() {
    let mut alg = Algorithm::new(TRIANGLE.to_vec());
    for _ in 0..3 {
        alg.next_event().expect("three site events pending");
    }

    let beachline = alg.beachline();
    assert_eq!(beachline.leaf_sites(), vec![0, 1, 0, 2]);

    let leaves = beachline.leaves();
    // the re-emitted right half of the split arc is doomed
    assert!(beachline.circle_event(leaves[2]).is_some());
    assert!(beachline.circle_event(leaves[0]).is_none());
    assert!(beachline.circle_event(leaves[1]).is_none());

    beachline.validate();
}

#[test]
fn collapse_merges_the_other_breakpoint() {
    let mut alg = Algorithm::new(TRIANGLE.to_vec());
    while alg.next_event().is_some() {}

    let beachline = alg.beachline();
    assert_eq!(beachline.leaf_sites(), vec![0, 1, 2]);

    let leaves = beachline.leaves();
    let (left_bp, right_bp) = beachline.breakpoints(leaves[1]);
    let left_bp = left_bp.expect("middle arc without a left breakpoint");
    let right_bp = right_bp.expect("middle arc without a right breakpoint");

    assert_eq!(beachline.indices(left_bp), (0, 1));
    // rewritten from (0, 2) when the middle arc of site 0 went away
    assert_eq!(beachline.indices(right_bp), (1, 2));

    beachline.validate();
}

#[test]
fn committed_circle_events_match_the_vertex_count() {
    let mut alg = Algorithm::new(scatter());
    let mut committed = 0;
    let mut circle_events = 0;

    loop {
        let before = alg.dcel().vertices().len();
        let event = match alg.next_event() {
            Some(event) => event,
            None => break,
        };
        let after = alg.dcel().vertices().len();

        match event {
            Event::Site { .. } => assert_eq!(before, after, "site event created a vertex"),
            Event::Circle { .. } => {
                circle_events += 1;
                assert!(after - before <= 1, "circle event created several vertices");
                committed += after - before;
            }
        }
    }

    assert!(committed > 0, "a scattered set must commit circle events");
    assert!(circle_events >= committed, "commits cannot outnumber events");
    assert_eq!(alg.dcel().vertices().len(), committed);

    check_diagram(&alg.build());
}

#[test]
fn beachline_stays_balanced_and_ordered() {
    let points = vec![
        Point2D::new(0.3, 0.1),
        Point2D::new(2.7, 0.8),
        Point2D::new(5.2, 0.3),
        Point2D::new(7.9, 1.1),
        Point2D::new(1.4, 2.6),
        Point2D::new(4.1, 3.4),
        Point2D::new(6.6, 2.2),
        Point2D::new(0.9, 4.8),
        Point2D::new(3.5, 5.7),
        Point2D::new(6.2, 5.1),
        Point2D::new(8.4, 4.3),
        Point2D::new(4.9, 7.6),
    ];

    let mut alg = Algorithm::new(points);
    while alg.next_event().is_some() {
        // the exhaustive check: heights, balance factors, parent links,
        // pair uniqueness, and the leaf list against the in-order leaves
        alg.beachline().validate();

        let sites = alg.beachline().leaf_sites();
        for pair in sites.windows(2) {
            assert_ne!(pair[0], pair[1], "adjacent arcs of the same site");
        }
    }

    check_diagram(&alg.build());
}

#[test]
fn rebuilding_is_idempotent() {
    let first = build_voronoi(scatter());
    let second = build_voronoi(scatter());

    assert_eq!(first.vertices().len(), second.vertices().len());
    assert_eq!(first.halfedges().len(), second.halfedges().len());

    for (a, b) in first.vertices().iter().zip(second.vertices().iter()) {
        assert!(approx_eq_point(a.point, b.point));
    }
    for (a, b) in first.halfedges().iter().zip(second.halfedges().iter()) {
        assert_eq!((a.left, a.right), (b.left, b.right));
    }
    for (a, b) in first.faces().iter().zip(second.faces().iter()) {
        assert_eq!(a, b);
    }
}
