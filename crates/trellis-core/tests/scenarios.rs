//! End-to-end checks of the layout solver, text layout and draw scheduler
//! through the public API.

use ratatui::style::Style;
use trellis_core::draw::render_line;
use trellis_core::layout::update_geometry;
use trellis_core::scheduler::{draw_frame, plan_frame};
use trellis_core::testing::TestSurface;
use trellis_core::{
    BorderStyle, Bounds, ComponentId, FloatPlacement, Geometry, HorizontalAlignment, LayoutMode,
    SizeConstraints, TextAlignment, TextSpec, Tree, VerticalAlignment,
};

/// Three unweighted boxes under the root.
fn three_columns(tree: &mut Tree) -> Vec<ComponentId> {
    let root = tree.root();
    (0..3)
        .map(|_| {
            let id = tree.new_box(BorderStyle::None);
            tree.attach(root, id).unwrap();
            id
        })
        .collect()
}

#[test]
fn three_unweighted_columns_split_evenly() {
    let mut tree = Tree::new(LayoutMode::HorizontalGrid, 0, Style::default());
    let cols = three_columns(&mut tree);
    update_geometry(&mut tree, (90, 10), None);
    let widths: Vec<u16> = cols.iter().map(|c| tree.get(*c).unwrap().width()).collect();
    assert_eq!(widths, vec![30, 30, 30]);
    let xs: Vec<i32> = cols.iter().map(|c| tree.get(*c).unwrap().geometry().x).collect();
    assert_eq!(xs, vec![0, 30, 60]);
}

#[test]
fn min_width_is_honored_and_slack_is_shared() {
    let mut tree = Tree::new(LayoutMode::HorizontalGrid, 0, Style::default());
    let cols = three_columns(&mut tree);
    tree.set_constraints(
        cols[0],
        SizeConstraints {
            min_width: Some(50),
            ..SizeConstraints::default()
        },
    )
    .unwrap();
    update_geometry(&mut tree, (90, 10), None);
    let widths: Vec<u16> = cols.iter().map(|c| tree.get(*c).unwrap().width()).collect();
    assert_eq!(widths, vec![50, 20, 20]);
}

#[test]
fn padding_shrinks_the_grid_target() {
    let mut tree = Tree::new(LayoutMode::HorizontalGrid, 5, Style::default());
    let cols = three_columns(&mut tree);
    update_geometry(&mut tree, (100, 20), None);
    let first = tree.get(cols[0]).unwrap().geometry();
    assert_eq!(first, Geometry::new(5, 5, 30, 10));
}

#[test]
fn wrap_then_justify() {
    let spec = TextSpec::new("alpha beta gamma");
    assert_eq!(spec.layout_lines(11), vec!["alpha beta", "gamma"]);
    let justified = spec.clone().alignment(TextAlignment::Justify);
    assert_eq!(justified.layout_lines(11), vec!["alpha  beta", "gamma"]);
    assert_eq!(render_line(&["alpha", "beta"], TextAlignment::Justify, 11), "alpha  beta");
}

#[test]
fn floating_bottom_right_on_80_by_24() {
    let mut tree = Tree::new(LayoutMode::Fill, 0, Style::default());
    let root = tree.root();
    let placement =
        FloatPlacement::new(10, 5).align(HorizontalAlignment::Right, VerticalAlignment::Bottom);
    let float = tree.new_floating_box(placement, BorderStyle::Plain);
    tree.attach(root, float).unwrap();
    update_geometry(&mut tree, (80, 24), None);
    assert_eq!(tree.absolute_bounds(float), Some(Bounds::new(70, 19, 10, 5)));
}

#[test]
fn absolute_position_is_sum_of_offsets() {
    let mut tree = Tree::new(LayoutMode::HorizontalGrid, 1, Style::default());
    let cols = three_columns(&mut tree);
    let inner = tree.new_box(BorderStyle::None);
    tree.attach(cols[1], inner).unwrap();
    tree.set_padding(cols[1], 2).unwrap();
    update_geometry(&mut tree, (32, 12), None);
    let parent = tree.absolute_position(cols[1]).unwrap();
    let own = tree.get(inner).unwrap().geometry();
    assert_eq!(
        tree.absolute_position(inner),
        Some((parent.0 + own.x, parent.1 + own.y))
    );
    assert_eq!(tree.absolute_position(inner), Some((11 + 2, 1 + 2)));
}

#[test]
fn box_under_higher_opaque_box_is_not_painted() {
    let mut tree = Tree::new(LayoutMode::Fill, 0, Style::default());
    let root = tree.root();
    let panel = tree.new_box(BorderStyle::Plain);
    tree.attach(root, panel).unwrap();
    let cover = tree.new_floating_box(FloatPlacement::new(20, 10), BorderStyle::Double);
    tree.attach(root, cover).unwrap();
    tree.set_z_index(cover, 10).unwrap();
    // `panel` fills the 12x6 screen; the cover is clamped to the same area
    update_geometry(&mut tree, (12, 6), None);

    let plan = plan_frame(&tree);
    assert!(plan.culled.contains(&panel));

    let mut surface = TestSurface::new(12, 6);
    let report = draw_frame(&mut tree, &mut surface).unwrap();
    assert!(!report.painted.contains(&panel));
    assert!(report.painted.contains(&cover));
    assert_eq!(surface.row(0), "╔══════════╗");
}

#[test]
fn deleting_an_overlay_restores_what_was_beneath() {
    let mut tree = Tree::new(LayoutMode::Fill, 0, Style::default());
    let root = tree.root();
    let panel = tree.new_box(BorderStyle::Plain);
    tree.attach(root, panel).unwrap();
    update_geometry(&mut tree, (10, 4), None);
    let mut surface = TestSurface::new(10, 4);
    draw_frame(&mut tree, &mut surface).unwrap();
    let before = surface.render_string();

    let placement =
        FloatPlacement::new(4, 2).align(HorizontalAlignment::Center, VerticalAlignment::Center);
    let overlay = tree.new_floating_box(placement, BorderStyle::Rounded);
    tree.attach(root, overlay).unwrap();
    update_geometry(&mut tree, (10, 4), Some(root));
    draw_frame(&mut tree, &mut surface).unwrap();
    assert_eq!(surface.row(1), "│  ╭──╮  │");

    tree.delete(overlay).unwrap();
    update_geometry(&mut tree, (10, 4), Some(root));
    draw_frame(&mut tree, &mut surface).unwrap();
    assert_eq!(surface.render_string(), before);
}

#[test]
fn ids_strictly_increase() {
    let mut tree = Tree::new(LayoutMode::Fill, 0, Style::default());
    let mut last = tree.root();
    for i in 0..20 {
        let id = if i % 2 == 0 {
            tree.new_box(BorderStyle::None)
        } else {
            tree.new_text("t")
        };
        assert!(id > last);
        last = id;
    }
}
