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

use crate::algorithm::beachline::NodeId;
use crate::compare::AbsoluteEq;
use crate::geometry::{Point2D, Scalar};
use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::{Ordering::Equal, Reverse};
use core::iter::FromIterator;

/// Identifies a scheduled circle event.
///
/// Indexes the queue's cancellation flags; the flag outlives the event, so
/// a stale id can always be interrogated safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CircleId(usize);

/// An event to be processed by the sweep.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Event<Num> {
    /// The sweep line reaches an input site and a new arc is inserted.
    Site { index: usize, point: Point2D<Num> },
    /// The circumcircle of `arc` and its two neighbors touches the sweep
    /// line; `arc` collapses into a vertex at `center` unless the event
    /// has gone stale in the meantime.
    Circle {
        id: CircleId,
        arc: NodeId,
        bottom: Point2D<Num>,
        center: Point2D<Num>,
    },
}

impl<Num: Scalar> Event<Num> {
    /// The point this event is keyed by: the site itself, or the lowest
    /// point of the circumcircle.
    pub(crate) fn point(&self) -> Point2D<Num> {
        match self {
            Event::Site { point, .. } => *point,
            Event::Circle { bottom, .. } => *bottom,
        }
    }
}

/// A wrapper struct around an `Event` that orders it by the key point's
/// Y coordinate and then the X coordinate.
#[derive(Debug)]
#[repr(transparent)]
struct EventOrder<Num>(Event<Num>);

impl<Num: Scalar> PartialEq for EventOrder<Num> {
    fn eq(&self, other: &Self) -> bool {
        self.0.point() == other.0.point()
    }
}

impl<Num: Scalar> PartialOrd for EventOrder<Num> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        // cmp by point
        self.0
            .point()
            .y
            .partial_cmp(&other.0.point().y)
            .and_then(|cmp| {
                // if equal, cmp by x
                if matches!(cmp, Equal) {
                    self.0.point().x.partial_cmp(&other.0.point().x)
                } else {
                    Some(cmp)
                }
            })
    }
}

/// The priority queue for events used in the algorithm.
///
/// This is implemented as a min-heap that orders elements first by the
/// point's Y coordinate and then the X coordinate. Circle events cannot be
/// pulled back out of the heap, so "deleting" one sets its cancellation
/// flag and the event is dropped when it surfaces.
#[derive(Debug, Default)]
pub(crate) struct PriorityQueue<Num: Scalar> {
    // wrapper justifications:
    // - Reverse turns it into a min-heap
    // - AbsoluteEq overrides PartialEq Rust trickiness
    // - EventOrder orders by Y and then X
    heap: BinaryHeap<Reverse<AbsoluteEq<EventOrder<Num>>>>,
    cancelled: Vec<bool>,
}

impl<Num: Scalar> PriorityQueue<Num> {
    /// Push an event into this priority queue.
    pub(crate) fn push(&mut self, event: Event<Num>) {
        self.heap.push(Reverse(AbsoluteEq(EventOrder(event))));
    }

    /// Schedule a circle event, returning the id to cancel it by.
    pub(crate) fn push_circle(
        &mut self,
        arc: NodeId,
        bottom: Point2D<Num>,
        center: Point2D<Num>,
    ) -> CircleId {
        let id = CircleId(self.cancelled.len());
        self.cancelled.push(false);
        self.push(Event::Circle {
            id,
            arc,
            bottom,
            center,
        });
        id
    }

    /// Cancel a scheduled circle event. Idempotent; the heap itself is
    /// never touched.
    pub(crate) fn cancel(&mut self, id: CircleId) {
        self.cancelled[id.0] = true;
    }

    pub(crate) fn is_cancelled(&self, id: CircleId) -> bool {
        self.cancelled[id.0]
    }

    /// Pop the next event from this priority queue.
    pub(crate) fn pop(&mut self) -> Option<Event<Num>> {
        self.heap
            .pop()
            .map(|Reverse(AbsoluteEq(EventOrder(event)))| event)
    }

    /// Get the number of events in this queue.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

impl<Num: Scalar> FromIterator<Event<Num>> for PriorityQueue<Num> {
    fn from_iter<T: IntoIterator<Item = Event<Num>>>(iter: T) -> Self {
        // build the heap
        Self {
            heap: iter
                .into_iter()
                .map(|event| Reverse(AbsoluteEq(EventOrder(event))))
                .collect(),
            cancelled: Vec::new(),
        }
    }
}

impl<Num: Scalar> Extend<Event<Num>> for PriorityQueue<Num> {
    fn extend<T: IntoIterator<Item = Event<Num>>>(&mut self, iter: T) {
        self.heap.extend(
            iter.into_iter()
                .map(|event| Reverse(AbsoluteEq(EventOrder(event)))),
        );
    }
}
