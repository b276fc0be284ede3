//! The draw scheduler: decides what to repaint each frame and paints it.
//!
//! A frame starts from the tree's dirty set and damaged rectangles, grows
//! the candidate list with everything stacked above a candidate, drops
//! candidates hidden behind a higher opaque box, and paints the rest in
//! `(z-index, id)` order.

use crate::component::ComponentId;
use crate::geometry::Bounds;
use crate::surface::{Surface, SurfaceError};
use crate::tree::Tree;

/// What one pass painted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Components whose draw spec ran, in paint order.
    pub painted: Vec<ComponentId>,
    /// Candidates skipped because something opaque above covers them.
    pub culled: Vec<ComponentId>,
    /// Draw specs that failed; the frame went on without them.
    pub faults: usize,
}

/// The paint list for the next frame, before anything is drawn.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub paint: Vec<ComponentId>,
    pub culled: Vec<ComponentId>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: ComponentId,
    z: i32,
    bounds: Bounds,
    opaque: bool,
}

/// Work out the paint order for the current dirty set and damage.
///
/// Only components reachable from the root are considered; detached ones
/// waiting in the dirty set are ignored.
pub fn plan_frame(tree: &Tree) -> FramePlan {
    let mut live: Vec<Entry> = tree
        .traverse(tree.root())
        .into_iter()
        .filter_map(|id| {
            let c = tree.component(id)?;
            Some(Entry {
                id,
                z: c.z_index(),
                bounds: tree.absolute_bounds(id)?,
                opaque: c.spec().is_opaque(),
            })
        })
        .collect();
    live.sort_by_key(|e| (e.z, e.id));

    let damage = tree.damage();
    let mut candidates: Vec<Entry> = Vec::new();
    for entry in &live {
        let seeded = tree.dirty().contains(&entry.id)
            || damage.iter().any(|d| d.intersects(&entry.bounds));
        let covers_candidate = candidates.iter().any(|c| c.bounds.intersects(&entry.bounds));
        if seeded || covers_candidate {
            candidates.push(*entry);
        }
    }

    let mut plan = FramePlan::default();
    for candidate in candidates {
        let hidden = live.iter().any(|o| {
            o.opaque && o.z > candidate.z && o.bounds.contains(&candidate.bounds)
        });
        if hidden {
            plan.culled.push(candidate.id);
        } else {
            plan.paint.push(candidate.id);
        }
    }
    plan
}

/// Paint one frame: plan, draw the survivors, clear the dirty set and
/// damage, flush.
///
/// A failing draw spec is logged and counted; the remaining components are
/// still painted. Only a failing flush aborts the frame.
pub fn draw_frame<S: Surface + ?Sized>(
    tree: &mut Tree,
    surface: &mut S,
) -> Result<FrameReport, SurfaceError> {
    let plan = plan_frame(tree);
    let mut report = FrameReport {
        culled: plan.culled,
        ..FrameReport::default()
    };

    for id in plan.paint {
        let (Some(component), Some(bounds)) = (tree.component(id), tree.absolute_bounds(id)) else {
            continue;
        };
        match component.spec().draw(surface, bounds, component.style()) {
            Ok(()) => report.painted.push(id),
            Err(err) => {
                tracing::warn!(%id, kind = component.spec().kind(), error = %err, "draw failed");
                report.faults += 1;
            }
        }
    }

    tree.clear_frame_state();
    surface.flush()?;
    tracing::debug!(
        painted = report.painted.len(),
        culled = report.culled.len(),
        faults = report.faults,
        "frame drawn"
    );
    Ok(report)
}
