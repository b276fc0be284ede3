use crate::draw::DrawSpec;
use crate::geometry::Geometry;
use ratatui::style::Style;
use std::fmt;

/// Identity of a component within one [`Tree`](crate::tree::Tree).
///
/// Ids are handed out by the tree's factory in strictly increasing order and
/// are never reused, not even after [`Tree::delete`](crate::tree::Tree::delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

impl ComponentId {
    /// The raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a component arranges its **children**.
///
/// A component never decides its own geometry; its parent's mode does.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// Every non-floating child receives the full content box.
    #[default]
    Fill,
    /// Children share the content width, left to right.
    HorizontalGrid,
    /// Children share the content height, top to bottom.
    VerticalGrid,
    /// Children keep the geometry they were given, clipped to the content box.
    Float,
}

impl LayoutMode {
    pub fn is_grid(self) -> bool {
        matches!(self, LayoutMode::HorizontalGrid | LayoutMode::VerticalGrid)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Screen-relative placement of a floating component.
///
/// A floating component is taken out of its parent's flow and aligned
/// against the whole screen with the requested size, clamped so it never
/// leaves the screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatPlacement {
    pub width: u16,
    pub height: u16,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

impl FloatPlacement {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn align(mut self, horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    /// Absolute origin on a `screen`-sized surface. Oversized placements
    /// start at the screen edge.
    pub fn align_on(&self, screen: (u16, u16)) -> (u16, u16) {
        let spare_w = screen.0.saturating_sub(self.width);
        let spare_h = screen.1.saturating_sub(self.height);
        let x = match self.horizontal {
            HorizontalAlignment::Left => 0,
            HorizontalAlignment::Center => spare_w / 2,
            HorizontalAlignment::Right => spare_w,
        };
        let y = match self.vertical {
            VerticalAlignment::Top => 0,
            VerticalAlignment::Center => spare_h / 2,
            VerticalAlignment::Bottom => spare_h,
        };
        (x, y)
    }
}

/// Minimum and maximum extents; `None` means unconstrained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeConstraints {
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
    pub min_height: Option<u16>,
    pub max_height: Option<u16>,
}

impl SizeConstraints {
    /// Zero is treated the same as unconstrained.
    pub(crate) fn normalized(self) -> Self {
        let positive = |v: Option<u16>| v.filter(|v| *v > 0);
        Self {
            min_width: positive(self.min_width),
            max_width: positive(self.max_width),
            min_height: positive(self.min_height),
            max_height: positive(self.max_height),
        }
    }
}

/// Percentage share of the parent's grid axis.
///
/// Only consulted when the parent uses a grid layout mode. A missing (or
/// non-positive) weight means "split what remains evenly".
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Weight {
    pub width_percent: Option<f64>,
    pub height_percent: Option<f64>,
}

impl Weight {
    pub fn width(percent: f64) -> Self {
        Self {
            width_percent: Some(percent),
            height_percent: None,
        }
    }

    pub fn height(percent: f64) -> Self {
        Self {
            width_percent: None,
            height_percent: Some(percent),
        }
    }
}

/// A node of the retained UI tree.
///
/// Components are created through the tree's factory methods and only read
/// from outside the crate; every mutation goes through a
/// [`Tree`](crate::tree::Tree) setter so the dirty set and pending layout
/// stay in sync.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) geometry: Geometry,
    pub(crate) constraints: SizeConstraints,
    pub(crate) weight: Weight,
    pub(crate) layout: LayoutMode,
    pub(crate) floating: Option<FloatPlacement>,
    pub(crate) z_index: i32,
    pub(crate) style: Style,
    pub(crate) padding: u16,
    pub(crate) spec: DrawSpec,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) parent: Option<ComponentId>,
}

impl Component {
    /// `z_index` of a component that has never been attached.
    pub const UNSET_Z: i32 = -1;

    pub(crate) fn new(id: ComponentId, spec: DrawSpec, style: Style) -> Self {
        Self {
            id,
            geometry: Geometry::default(),
            constraints: SizeConstraints::default(),
            weight: Weight::default(),
            layout: LayoutMode::Fill,
            floating: None,
            z_index: Self::UNSET_Z,
            style,
            padding: 0,
            spec,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u16 {
        self.geometry.width
    }

    pub fn height(&self) -> u16 {
        self.geometry.height
    }

    pub fn constraints(&self) -> SizeConstraints {
        self.constraints
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn floating(&self) -> Option<FloatPlacement> {
        self.floating
    }

    pub fn is_floating(&self) -> bool {
        self.floating.is_some()
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn padding(&self) -> u16 {
        self.padding
    }

    pub fn spec(&self) -> &DrawSpec {
        &self.spec
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    /// Content extent (size minus padding on both sides), never negative.
    pub fn content_size(&self) -> (u16, u16) {
        let inset = self.padding.saturating_mul(2);
        (
            self.geometry.width.saturating_sub(inset),
            self.geometry.height.saturating_sub(inset),
        )
    }
}
