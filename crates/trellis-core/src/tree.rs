//! The component store.
//!
//! Components live in an id-indexed map owned by the [`Tree`]; children are
//! ordered id lists and the parent link is an optional id, so every
//! traversal goes through the store. The tree also carries the frame
//! bookkeeping that mutations feed: the dirty set, damaged rectangles, and
//! the subtrees waiting for re-layout.
//!
//! Every `&mut self` method here is a mutation of shared session state. A
//! [`Session`](crate::session::Session) only hands the tree out from behind
//! its lock, so holding a `&mut Tree` means holding the lock.

use crate::component::{
    Component, ComponentId, FloatPlacement, LayoutMode, SizeConstraints, Weight,
};
use crate::draw::{BorderStyle, BoxSpec, DrawSpec, TextAlignment, TextSpec};
use crate::geometry::{Bounds, Geometry};
use ratatui::style::Style;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Structural errors: recoverable, reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("component {0} not found")]
    NotFound(ComponentId),
    #[error("component {0} already has a parent")]
    AlreadyAttached(ComponentId),
    #[error("component {0} has no parent")]
    NotAttached(ComponentId),
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCycle {
        parent: ComponentId,
        child: ComponentId,
    },
    #[error("the root component cannot be detached or deleted")]
    RootImmutable,
    #[error("component {id} is not a {expected} component")]
    WrongSpec {
        id: ComponentId,
        expected: &'static str,
    },
}

/// What the next frame has to re-layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingLayout {
    None,
    /// Everything, from the root.
    Full,
    /// The subtrees under these components.
    Scopes(Vec<ComponentId>),
}

/// The retained component tree of one session.
#[derive(Debug)]
pub struct Tree {
    components: HashMap<ComponentId, Component>,
    root: ComponentId,
    next_id: u64,
    default_style: Style,
    dirty: BTreeSet<ComponentId>,
    damage: Vec<Bounds>,
    layout_scopes: BTreeSet<ComponentId>,
    full_layout: bool,
}

impl Tree {
    /// Create a tree holding only a borderless root box.
    ///
    /// The root's geometry is left to the first layout pass.
    pub fn new(root_layout: LayoutMode, root_padding: u16, default_style: Style) -> Self {
        let mut tree = Self {
            components: HashMap::new(),
            root: ComponentId(0),
            next_id: 0,
            default_style,
            dirty: BTreeSet::new(),
            damage: Vec::new(),
            layout_scopes: BTreeSet::new(),
            full_layout: true,
        };
        let root = tree.new_box(BorderStyle::None);
        if let Some(c) = tree.components.get_mut(&root) {
            c.layout = root_layout;
            c.padding = root_padding;
        }
        tree.root = root;
        tree
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn default_style(&self) -> Style {
        self.default_style
    }

    /// Number of components in the store, attached or not.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Like [`component`](Tree::component), but a missing id is an error.
    pub fn get(&self, id: ComponentId) -> Result<&Component, TreeError> {
        self.components.get(&id).ok_or(TreeError::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Result<&mut Component, TreeError> {
        self.components.get_mut(&id).ok_or(TreeError::NotFound(id))
    }

    // ----- factory -----

    fn next_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a detached component with the default style and `Fill` layout.
    pub fn new_component(&mut self, spec: impl Into<DrawSpec>) -> ComponentId {
        let id = self.next_id();
        self.components
            .insert(id, Component::new(id, spec.into(), self.default_style));
        id
    }

    pub fn new_box(&mut self, border: BorderStyle) -> ComponentId {
        self.new_component(BoxSpec::new(border))
    }

    pub fn new_text(&mut self, content: impl Into<String>) -> ComponentId {
        self.new_component(TextSpec::new(content))
    }

    pub fn new_floating_box(
        &mut self,
        placement: FloatPlacement,
        border: BorderStyle,
    ) -> ComponentId {
        let id = self.new_box(border);
        if let Some(c) = self.components.get_mut(&id) {
            c.floating = Some(placement);
        }
        id
    }

    // ----- structure -----

    /// Append `child` to `parent`'s children.
    ///
    /// The child's subtree is restacked above the parent (each level one
    /// z-index higher) and scheduled for layout and repaint.
    pub fn attach(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), TreeError> {
        self.get(parent)?;
        let child_node = self.get(child)?;
        if child == self.root || child_node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::WouldCycle { parent, child });
        }

        let parent_z = self.get(parent)?.z_index;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        self.restack(child, parent_z + 1);
        for id in self.traverse(child) {
            self.dirty.insert(id);
        }
        self.schedule_layout(parent);
        Ok(())
    }

    /// Remove `id` from its parent.
    ///
    /// The detached subtree is dismantled: every descendant loses its parent
    /// link and its children. The components stay in the store (and in the
    /// dirty set) and can be attached again individually; only
    /// [`delete`](Tree::delete) reclaims them. Returns the former parent.
    pub fn detach(&mut self, id: ComponentId) -> Result<ComponentId, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        let parent = self.get(id)?.parent.ok_or(TreeError::NotAttached(id))?;
        if let Some(bounds) = self.live_bounds(id) {
            self.damage.push(bounds);
        }
        self.get_mut(parent)?.children.retain(|c| *c != id);
        for node in self.traverse(id) {
            if let Some(c) = self.components.get_mut(&node) {
                c.parent = None;
                c.children.clear();
            }
        }
        self.schedule_layout(parent);
        Ok(parent)
    }

    /// Detach `id` (if attached) and drop its whole subtree from the store.
    ///
    /// Ids are never handed out again. Returns the removed ids in
    /// breadth-first order.
    pub fn delete(&mut self, id: ComponentId) -> Result<Vec<ComponentId>, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmutable);
        }
        let subtree = self.traverse(id);
        if subtree.is_empty() {
            return Err(TreeError::NotFound(id));
        }
        if self.get(id)?.parent.is_some() {
            self.detach(id)?;
        }
        for node in &subtree {
            self.components.remove(node);
            self.dirty.remove(node);
            self.layout_scopes.remove(node);
        }
        Ok(subtree)
    }

    /// Breadth-first ids of the subtree rooted at `id` (empty if unknown).
    pub fn traverse(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            out.push(next);
            if let Some(c) = self.components.get(&next) {
                queue.extend(c.children.iter().copied());
            }
        }
        out
    }

    /// Parent chain of `id`, nearest first, including `id` itself.
    fn ancestors(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        std::iter::successors(Some(id), move |cur| {
            self.components.get(cur).and_then(|c| c.parent)
        })
    }

    /// Whether `id` is reachable from the root.
    pub fn is_live(&self, id: ComponentId) -> bool {
        self.contains(id) && self.ancestors(id).last() == Some(self.root)
    }

    /// Absolute screen position: the sum of offsets up to the topmost
    /// ancestor, whose own offset is absolute.
    pub fn absolute_position(&self, id: ComponentId) -> Option<(i32, i32)> {
        if !self.contains(id) {
            return None;
        }
        let mut x = 0;
        let mut y = 0;
        for node in self.ancestors(id) {
            let g = self.components.get(&node)?.geometry;
            x += g.x;
            y += g.y;
        }
        Some((x, y))
    }

    pub fn absolute_bounds(&self, id: ComponentId) -> Option<Bounds> {
        let (x, y) = self.absolute_position(id)?;
        Some(self.components.get(&id)?.geometry.at(x, y))
    }

    fn live_bounds(&self, id: ComponentId) -> Option<Bounds> {
        if !self.is_live(id) {
            return None;
        }
        self.absolute_bounds(id).filter(|b| !b.is_empty())
    }

    /// Set z-indexes below (and including) `id`, one level per generation.
    fn restack(&mut self, id: ComponentId, z: i32) {
        let mut queue = VecDeque::from([(id, z)]);
        while let Some((node, z)) = queue.pop_front() {
            if let Some(c) = self.components.get_mut(&node) {
                c.z_index = z;
                queue.extend(c.children.iter().map(|child| (*child, z + 1)));
            }
        }
    }

    // ----- setters -----

    /// Set geometry directly. Returns whether anything changed.
    ///
    /// The next layout pass may overwrite geometry that the parent's layout
    /// mode decides.
    pub fn set_geometry(&mut self, id: ComponentId, geometry: Geometry) -> Result<bool, TreeError> {
        self.get(id)?;
        Ok(self.apply_geometry(id, geometry))
    }

    pub(crate) fn apply_geometry(&mut self, id: ComponentId, geometry: Geometry) -> bool {
        let Some(current) = self.components.get(&id).map(|c| c.geometry) else {
            return false;
        };
        if current == geometry {
            return false;
        }
        if let Some(old) = self.live_bounds(id) {
            self.damage.push(old);
        }
        if let Some(c) = self.components.get_mut(&id) {
            c.geometry = geometry;
        }
        self.dirty.insert(id);
        true
    }

    pub fn set_style(&mut self, id: ComponentId, style: Style) -> Result<(), TreeError> {
        let c = self.get_mut(id)?;
        if c.style != style {
            c.style = style;
            self.dirty.insert(id);
        }
        Ok(())
    }

    pub fn set_constraints(
        &mut self,
        id: ComponentId,
        constraints: SizeConstraints,
    ) -> Result<(), TreeError> {
        self.get_mut(id)?.constraints = constraints.normalized();
        self.schedule_parent_layout(id);
        Ok(())
    }

    /// Edit constraints in place, e.g. to nudge a minimum by one cell.
    pub fn update_constraints(
        &mut self,
        id: ComponentId,
        edit: impl FnOnce(&mut SizeConstraints),
    ) -> Result<SizeConstraints, TreeError> {
        let mut constraints = self.get(id)?.constraints;
        edit(&mut constraints);
        self.set_constraints(id, constraints)?;
        Ok(self.get(id)?.constraints)
    }

    pub fn set_weight(&mut self, id: ComponentId, weight: Weight) -> Result<(), TreeError> {
        self.get_mut(id)?.weight = weight;
        self.schedule_parent_layout(id);
        Ok(())
    }

    pub fn set_layout(&mut self, id: ComponentId, layout: LayoutMode) -> Result<(), TreeError> {
        self.get_mut(id)?.layout = layout;
        self.schedule_layout(id);
        Ok(())
    }

    pub fn set_padding(&mut self, id: ComponentId, padding: u16) -> Result<(), TreeError> {
        self.get_mut(id)?.padding = padding;
        self.schedule_layout(id);
        Ok(())
    }

    /// Make `id` floating (or put it back into its parent's flow).
    pub fn set_floating(
        &mut self,
        id: ComponentId,
        placement: Option<FloatPlacement>,
    ) -> Result<(), TreeError> {
        self.get_mut(id)?.floating = placement;
        self.schedule_parent_layout(id);
        Ok(())
    }

    /// Move `id` in the paint order; descendants shift by the same amount
    /// so they stay stacked above it.
    pub fn set_z_index(&mut self, id: ComponentId, z_index: i32) -> Result<(), TreeError> {
        let delta = z_index - self.get(id)?.z_index;
        if delta == 0 {
            return Ok(());
        }
        for node in self.traverse(id) {
            if let Some(c) = self.components.get_mut(&node) {
                c.z_index += delta;
            }
            self.dirty.insert(node);
        }
        Ok(())
    }

    fn text_mut(&mut self, id: ComponentId) -> Result<&mut TextSpec, TreeError> {
        match &mut self.get_mut(id)?.spec {
            DrawSpec::Text(spec) => Ok(spec),
            DrawSpec::Box(_) => Err(TreeError::WrongSpec { id, expected: "text" }),
        }
    }

    pub fn set_text(
        &mut self,
        id: ComponentId,
        content: impl Into<String>,
    ) -> Result<(), TreeError> {
        let content = content.into();
        let spec = self.text_mut(id)?;
        if spec.content != content {
            spec.content = content;
            self.dirty.insert(id);
        }
        Ok(())
    }

    pub fn set_alignment(
        &mut self,
        id: ComponentId,
        alignment: TextAlignment,
    ) -> Result<(), TreeError> {
        self.text_mut(id)?.alignment = alignment;
        self.dirty.insert(id);
        Ok(())
    }

    pub fn set_word_wrap(&mut self, id: ComponentId, word_wrap: bool) -> Result<(), TreeError> {
        self.text_mut(id)?.word_wrap = word_wrap;
        self.dirty.insert(id);
        Ok(())
    }

    pub fn set_border(&mut self, id: ComponentId, border: BorderStyle) -> Result<(), TreeError> {
        match &mut self.get_mut(id)?.spec {
            DrawSpec::Box(spec) => spec.border = border,
            DrawSpec::Text(_) => return Err(TreeError::WrongSpec { id, expected: "box" }),
        }
        self.dirty.insert(id);
        Ok(())
    }

    // ----- frame bookkeeping -----

    /// Queue `id` for repaint. Idempotent.
    pub fn mark_dirty(&mut self, id: ComponentId) {
        if self.contains(id) {
            self.dirty.insert(id);
        }
    }

    /// Queue every live component for repaint.
    pub fn mark_all_dirty(&mut self) {
        let all = self.traverse(self.root);
        self.dirty.extend(all);
    }

    pub fn dirty(&self) -> &BTreeSet<ComponentId> {
        &self.dirty
    }

    pub fn damage(&self) -> &[Bounds] {
        &self.damage
    }

    pub(crate) fn clear_frame_state(&mut self) {
        self.dirty.clear();
        self.damage.clear();
    }

    /// Re-layout the subtree under `id` in the next frame.
    pub fn schedule_layout(&mut self, id: ComponentId) {
        if self.contains(id) {
            self.layout_scopes.insert(id);
        }
    }

    fn schedule_parent_layout(&mut self, id: ComponentId) {
        match self.components.get(&id).and_then(|c| c.parent) {
            Some(parent) => self.schedule_layout(parent),
            None => self.schedule_layout(id),
        }
    }

    /// Re-layout everything in the next frame.
    pub fn request_full_layout(&mut self) {
        self.full_layout = true;
    }

    /// Take (and reset) what the next frame has to re-layout.
    ///
    /// Scopes that are no longer reachable from the root are dropped.
    pub fn take_pending_layout(&mut self) -> PendingLayout {
        let scopes = std::mem::take(&mut self.layout_scopes);
        if std::mem::take(&mut self.full_layout) {
            return PendingLayout::Full;
        }
        let live: Vec<ComponentId> = scopes.into_iter().filter(|id| self.is_live(*id)).collect();
        if live.is_empty() {
            PendingLayout::None
        } else {
            PendingLayout::Scopes(live)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Tree {
        Tree::new(LayoutMode::Fill, 0, Style::default())
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let mut t = tree();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_text("hi");
        let c = t.new_box(BorderStyle::Plain);
        assert!(t.root() < a && a < b && b < c);
        t.delete(b).unwrap();
        let d = t.new_box(BorderStyle::None);
        assert!(d > c);
    }

    #[test]
    fn attach_sets_parent_and_z() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_box(BorderStyle::None);
        t.attach(a, b).unwrap();
        t.attach(root, a).unwrap();
        assert_eq!(t.get(a).unwrap().parent(), Some(root));
        assert_eq!(t.get(root).unwrap().z_index(), Component::UNSET_Z);
        assert_eq!(t.get(a).unwrap().z_index(), 0);
        assert_eq!(t.get(b).unwrap().z_index(), 1);
        assert_eq!(t.get(root).unwrap().children(), &[a]);
        assert!(t.is_live(b));
    }

    #[test]
    fn attach_rejects_bad_structure() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_box(BorderStyle::None);
        t.attach(root, a).unwrap();
        t.attach(a, b).unwrap();
        assert_eq!(t.attach(root, a), Err(TreeError::AlreadyAttached(a)));
        assert_eq!(t.attach(a, root), Err(TreeError::AlreadyAttached(root)));
        let c = t.new_box(BorderStyle::None);
        t.attach(b, c).unwrap();
        t.detach(a).unwrap();
        // detaching `a` dismantled the subtree, so `c` is loose again
        assert_eq!(t.attach(c, c), Err(TreeError::WouldCycle { parent: c, child: c }));
        let missing = ComponentId(999);
        assert_eq!(t.attach(root, missing), Err(TreeError::NotFound(missing)));
    }

    #[test]
    fn attach_detects_cycles_through_ancestors() {
        let mut t = tree();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_box(BorderStyle::None);
        let c = t.new_box(BorderStyle::None);
        t.attach(a, b).unwrap();
        t.attach(b, c).unwrap();
        assert_eq!(t.attach(c, a), Err(TreeError::WouldCycle { parent: c, child: a }));
    }

    #[test]
    fn detach_orphans_subtree_but_keeps_entries() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_text("x");
        t.attach(root, a).unwrap();
        t.attach(a, b).unwrap();
        assert_eq!(t.detach(a), Ok(root));
        assert!(t.contains(a) && t.contains(b));
        assert!(t.get(b).unwrap().parent().is_none());
        assert!(t.get(a).unwrap().children().is_empty());
        assert!(!t.is_live(a));
        assert!(t.dirty().contains(&b));
        assert_eq!(t.detach(a), Err(TreeError::NotAttached(a)));
        assert_eq!(t.detach(root), Err(TreeError::RootImmutable));
    }

    #[test]
    fn delete_reclaims_subtree() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_text("x");
        t.attach(root, a).unwrap();
        t.attach(a, b).unwrap();
        assert_eq!(t.delete(a).unwrap(), vec![a, b]);
        assert!(!t.contains(a) && !t.contains(b));
        assert!(!t.dirty().contains(&a));
        assert!(t.get(root).unwrap().children().is_empty());
        assert_eq!(t.delete(a), Err(TreeError::NotFound(a)));
    }

    #[test]
    fn absolute_position_sums_offsets() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_box(BorderStyle::None);
        t.attach(root, a).unwrap();
        t.attach(a, b).unwrap();
        t.set_geometry(root, Geometry::new(1, 2, 80, 24)).unwrap();
        t.set_geometry(a, Geometry::new(10, 5, 20, 10)).unwrap();
        t.set_geometry(b, Geometry::new(3, 4, 5, 5)).unwrap();
        assert_eq!(t.absolute_position(root), Some((1, 2)));
        assert_eq!(t.absolute_position(a), Some((11, 7)));
        assert_eq!(t.absolute_position(b), Some((14, 11)));
        assert_eq!(t.absolute_bounds(b), Some(Bounds::new(14, 11, 5, 5)));
    }

    #[test]
    fn geometry_change_marks_dirty_and_damages_old_area() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        t.attach(root, a).unwrap();
        t.set_geometry(a, Geometry::new(0, 0, 4, 4)).unwrap();
        t.clear_frame_state();
        assert!(!t.set_geometry(a, Geometry::new(0, 0, 4, 4)).unwrap());
        assert!(t.dirty().is_empty());
        assert!(t.set_geometry(a, Geometry::new(2, 0, 4, 4)).unwrap());
        assert!(t.dirty().contains(&a));
        assert_eq!(t.damage(), &[Bounds::new(0, 0, 4, 4)]);
    }

    #[test]
    fn style_and_text_setters_mark_dirty() {
        let mut t = tree();
        let text = t.new_text("a");
        let b = t.new_box(BorderStyle::None);
        t.clear_frame_state();
        t.set_text(text, "a").unwrap();
        assert!(t.dirty().is_empty());
        t.set_text(text, "b").unwrap();
        t.set_style(b, Style::default().bg(ratatui::style::Color::Red)).unwrap();
        assert!(t.dirty().contains(&text) && t.dirty().contains(&b));
        assert_eq!(
            t.set_text(b, "nope"),
            Err(TreeError::WrongSpec { id: b, expected: "text" })
        );
        assert_eq!(
            t.set_border(text, BorderStyle::Plain),
            Err(TreeError::WrongSpec { id: text, expected: "box" })
        );
    }

    #[test]
    fn z_index_shift_keeps_children_above() {
        let mut t = tree();
        let root = t.root();
        let a = t.new_box(BorderStyle::None);
        let b = t.new_box(BorderStyle::None);
        t.attach(a, b).unwrap();
        t.attach(root, a).unwrap();
        t.set_z_index(a, 10).unwrap();
        assert_eq!(t.get(a).unwrap().z_index(), 10);
        assert_eq!(t.get(b).unwrap().z_index(), 11);
    }

    #[test]
    fn pending_layout_tracks_scopes() {
        let mut t = tree();
        let root = t.root();
        assert_eq!(t.take_pending_layout(), PendingLayout::Full);
        assert_eq!(t.take_pending_layout(), PendingLayout::None);
        let a = t.new_box(BorderStyle::None);
        t.attach(root, a).unwrap();
        assert_eq!(t.take_pending_layout(), PendingLayout::Scopes(vec![root]));
        let loose = t.new_box(BorderStyle::None);
        t.set_padding(loose, 2).unwrap();
        assert_eq!(t.take_pending_layout(), PendingLayout::None);
        t.update_constraints(a, |c| c.min_width = Some(5)).unwrap();
        assert_eq!(t.take_pending_layout(), PendingLayout::Scopes(vec![root]));
    }

    #[test]
    fn zero_constraint_means_unconstrained() {
        let mut t = tree();
        let a = t.new_box(BorderStyle::None);
        let c = t
            .update_constraints(a, |c| {
                c.min_width = Some(0);
                c.max_width = Some(30);
            })
            .unwrap();
        assert_eq!(c.min_width, None);
        assert_eq!(c.max_width, Some(30));
    }
}
