//! The layout engine: resolves every component's geometry from its parent's
//! layout mode, its weights and its size constraints.
//!
//! A component never places itself. Its parent's [`LayoutMode`] decides
//! where it goes, except for floating components, which are aligned against
//! the whole screen. Layout is total: degenerate input (no space, no
//! siblings) resolves to zero-sized geometry instead of an error.

use crate::component::{ComponentId, FloatPlacement, LayoutMode};
use crate::geometry::Geometry;
use crate::tree::Tree;
use std::collections::HashSet;

/// Guards `floor` against percentages that land a hair under a whole cell.
const ROUNDING_EPSILON: f64 = 1e-9;

/// One sibling's input to the grid solver, along the grid axis.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GridItem {
    /// Declared share in percent; `None` (or a non-positive value) shares
    /// whatever the declared siblings leave over.
    pub weight: Option<f64>,
    pub min: Option<u16>,
    pub max: Option<u16>,
}

impl GridItem {
    pub fn weighted(percent: f64) -> Self {
        Self {
            weight: Some(percent),
            ..Self::default()
        }
    }

    pub fn min(mut self, min: u16) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: u16) -> Self {
        self.max = Some(max);
        self
    }

    fn declared(&self) -> Option<f64> {
        self.weight.filter(|w| *w > 0.0 && w.is_finite())
    }

    /// Both bounds set: the sibling absorbs rounding corrections first.
    fn is_flexible(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

/// Split `target` cells among `items` in sibling order.
///
/// Declared weights are kept, undeclared siblings split the remainder
/// evenly, and everything is normalized to 100%. A sibling whose share falls
/// outside its min/max is pinned at the bound and the rest is redistributed
/// proportionally over the unpinned siblings, so pinning one sibling never
/// pushes another past its own bound; when both bounds conflict the minimum
/// wins. The floored sizes are then corrected one cell at a time (flexible
/// siblings first, then the last sibling) until they sum to exactly `target`.
pub fn resolve_grid(target: u16, items: &[GridItem]) -> Vec<u16> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    if target == 0 {
        return vec![0; n];
    }

    let percents = clamp_percents(target, items, initial_percents(items));

    let total = f64::from(target);
    let mut sizes: Vec<i64> = percents
        .iter()
        .map(|p| (total * p / 100.0 + ROUNDING_EPSILON).floor().max(0.0) as i64)
        .collect();

    let mut diff = i64::from(target) - sizes.iter().sum::<i64>();
    let flexible: Vec<usize> = (0..n).filter(|i| items[*i].is_flexible()).collect();
    let last = n - 1;
    let mut step = 0;
    while diff != 0 {
        let delta = diff.signum();
        let idx = flexible.get(step).copied().unwrap_or(last);
        if delta < 0 && sizes[idx] == 0 {
            // nothing left to take from this sibling; take from the largest
            let largest = (0..n)
                .max_by_key(|i| sizes[*i])
                .filter(|i| sizes[*i] > 0);
            let Some(largest) = largest else {
                break;
            };
            sizes[largest] -= 1;
        } else {
            sizes[idx] += delta;
        }
        diff -= delta;
        step += 1;
    }

    sizes
        .into_iter()
        .map(|s| u16::try_from(s.max(0)).unwrap_or(u16::MAX))
        .collect()
}

fn initial_percents(items: &[GridItem]) -> Vec<f64> {
    let n = items.len();
    let declared: Vec<Option<f64>> = items.iter().map(GridItem::declared).collect();
    let set_count = declared.iter().flatten().count();
    let set_sum: f64 = declared.iter().flatten().sum();

    let fill = if set_sum < 100.0 && set_count < n {
        (100.0 - set_sum) / (n - set_count) as f64
    } else {
        100.0 / n as f64
    };
    normalize(declared.into_iter().map(|d| d.unwrap_or(fill)).collect())
}

fn normalize(mut percents: Vec<f64>) -> Vec<f64> {
    let sum: f64 = percents.iter().sum();
    if sum > 0.0 {
        for p in &mut percents {
            *p *= 100.0 / sum;
        }
    } else {
        let even = 100.0 / percents.len() as f64;
        percents.iter_mut().for_each(|p| *p = even);
    }
    percents
}

fn clamp_percents(target: u16, items: &[GridItem], mut percents: Vec<f64>) -> Vec<f64> {
    let total = f64::from(target);
    let to_percent = |cells: u16| f64::from(cells) * 100.0 / total;
    let mut pinned = vec![false; items.len()];

    loop {
        let mut changed = false;
        for (i, item) in items.iter().enumerate() {
            if pinned[i] {
                continue;
            }
            let min = item.min.map(to_percent);
            let max = match (item.min, item.max) {
                (Some(lo), Some(hi)) => Some(to_percent(hi.max(lo))),
                (None, Some(hi)) => Some(to_percent(hi)),
                _ => None,
            };
            if let Some(min) = min.filter(|m| percents[i] < *m) {
                percents[i] = min;
            } else if let Some(max) = max.filter(|m| percents[i] > *m) {
                percents[i] = max;
            } else {
                continue;
            }
            pinned[i] = true;
            changed = true;
        }
        if !changed {
            return percents;
        }

        let pinned_sum: f64 = (0..items.len()).filter(|i| pinned[*i]).map(|i| percents[i]).sum();
        let remaining = (100.0 - pinned_sum).max(0.0);
        let free: Vec<usize> = (0..items.len()).filter(|i| !pinned[*i]).collect();
        if free.is_empty() {
            return percents;
        }
        let free_sum: f64 = free.iter().map(|i| percents[*i]).sum();
        for i in free {
            percents[i] = if free_sum > 0.0 {
                percents[i] * remaining / free_sum
            } else {
                remaining / (items.len() - pinned.iter().filter(|p| **p).count()) as f64
            };
        }
    }
}

/// Resolve geometry for the subtree under `scope` (the whole tree when
/// `None`) on a `screen`-sized surface.
///
/// Breadth-first, so every parent is placed before its children. A grid
/// sibling group is resolved as a whole the first time any member is
/// reached.
pub fn update_geometry(tree: &mut Tree, screen: (u16, u16), scope: Option<ComponentId>) {
    let start = scope.unwrap_or_else(|| tree.root());
    let mut processed: HashSet<ComponentId> = HashSet::new();

    for id in tree.traverse(start) {
        if processed.contains(&id) {
            continue;
        }
        let Some(component) = tree.component(id) else {
            continue;
        };
        let floating = component.floating();
        let parent = component.parent();

        if let Some(placement) = floating {
            place_floating(tree, id, parent, placement, screen);
            processed.insert(id);
            continue;
        }
        if id == tree.root() {
            tree.apply_geometry(id, Geometry::new(0, 0, screen.0, screen.1));
            processed.insert(id);
            continue;
        }
        // a detached scope root keeps whatever geometry it has
        let Some(parent) = parent else {
            continue;
        };
        let Some(parent_component) = tree.component(parent) else {
            continue;
        };
        let mode = parent_component.layout();
        let (content_w, content_h) = parent_component.content_size();
        let pad = i32::from(parent_component.padding());

        match mode {
            LayoutMode::Fill => {
                tree.apply_geometry(id, Geometry::new(pad, pad, content_w, content_h));
                processed.insert(id);
            }
            LayoutMode::HorizontalGrid | LayoutMode::VerticalGrid => {
                for sibling in layout_grid(tree, parent) {
                    processed.insert(sibling);
                }
            }
            LayoutMode::Float => {
                let g = component.geometry();
                let right = pad + i32::from(content_w);
                let bottom = pad + i32::from(content_h);
                let x = g.x.max(pad);
                let y = g.y.max(pad);
                let width = (right - x).clamp(0, i32::from(g.width));
                let height = (bottom - y).clamp(0, i32::from(g.height));
                tree.apply_geometry(id, Geometry::new(x, y, width as u16, height as u16));
                processed.insert(id);
            }
        }
    }
}

fn place_floating(
    tree: &mut Tree,
    id: ComponentId,
    parent: Option<ComponentId>,
    placement: FloatPlacement,
    screen: (u16, u16),
) {
    let (x, y) = placement.align_on(screen);
    let width = placement.width.min(screen.0.saturating_sub(x));
    let height = placement.height.min(screen.1.saturating_sub(y));
    let (origin_x, origin_y) = parent
        .and_then(|p| tree.absolute_position(p))
        .unwrap_or((0, 0));
    tracing::trace!(%id, x, y, width, height, "placed floating component");
    tree.apply_geometry(
        id,
        Geometry::new(i32::from(x) - origin_x, i32::from(y) - origin_y, width, height),
    );
}

/// Resolve the non-floating children of a grid `parent`. Returns their ids.
fn layout_grid(tree: &mut Tree, parent: ComponentId) -> Vec<ComponentId> {
    let Some(p) = tree.component(parent) else {
        return Vec::new();
    };
    let horizontal = p.layout() == LayoutMode::HorizontalGrid;
    let (content_w, content_h) = p.content_size();
    let pad = i32::from(p.padding());

    let mut ids = Vec::new();
    let mut items = Vec::new();
    for child in p.children() {
        let Some(c) = tree.component(*child) else {
            continue;
        };
        if c.is_floating() {
            continue;
        }
        let (weight, constraints) = (c.weight(), c.constraints());
        items.push(if horizontal {
            GridItem {
                weight: weight.width_percent,
                min: constraints.min_width,
                max: constraints.max_width,
            }
        } else {
            GridItem {
                weight: weight.height_percent,
                min: constraints.min_height,
                max: constraints.max_height,
            }
        });
        ids.push(*child);
    }

    let target = if horizontal { content_w } else { content_h };
    let sizes = resolve_grid(target, &items);
    tracing::trace!(%parent, target, ?sizes, "resolved grid");

    let mut offset = pad;
    for (id, size) in ids.iter().zip(sizes) {
        let geometry = if horizontal {
            Geometry::new(offset, pad, size, content_h)
        } else {
            Geometry::new(pad, offset, content_w, size)
        };
        tree.apply_geometry(*id, geometry);
        offset += i32::from(size);
    }
    ids
}
