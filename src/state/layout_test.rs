use super::*;

fn rect(id: &str, x: u32, y: u32, w: u32, h: u32) -> LayoutRect {
    LayoutRect::new(PanelId::from(id), x, y, w, h)
}

// =============================================================
// Breakpoint
// =============================================================

#[test]
fn breakpoint_for_width_picks_widest_fitting_tier() {
    assert_eq!(Breakpoint::for_width(1920), Breakpoint::Lg);
    assert_eq!(Breakpoint::for_width(1200), Breakpoint::Lg);
    assert_eq!(Breakpoint::for_width(1199), Breakpoint::Md);
    assert_eq!(Breakpoint::for_width(800), Breakpoint::Sm);
    assert_eq!(Breakpoint::for_width(500), Breakpoint::Xs);
    assert_eq!(Breakpoint::for_width(0), Breakpoint::Xxs);
}

#[test]
fn breakpoint_parse_accepts_only_known_names() {
    for bp in Breakpoint::ALL {
        assert_eq!(Breakpoint::parse(bp.name()), Ok(bp));
    }
    assert_eq!(Breakpoint::parse("xl"), Err(LayoutError::UnknownBreakpoint("xl".into())));
}

#[test]
fn breakpoint_columns_shrink_with_width() {
    let cols: Vec<u32> = Breakpoint::ALL.iter().map(|bp| bp.columns()).collect();
    assert_eq!(cols, vec![12, 10, 6, 4, 2]);
}

// =============================================================
// LayoutRect
// =============================================================

#[test]
fn rect_serializes_panel_id_as_i() {
    let json = serde_json::to_value(rect("p1", 0, 1, 2, 3)).unwrap();
    assert_eq!(json, serde_json::json!({"i": "p1", "x": 0, "y": 1, "w": 2, "h": 3}));
}

#[test]
fn rect_zero_size_is_invalid() {
    assert!(rect("a", 0, 0, 1, 1).validate().is_ok());
    assert_eq!(rect("a", 0, 0, 0, 1).validate(), Err(LayoutError::EmptyRect(PanelId::from("a"))));
    assert!(rect("a", 0, 0, 1, 0).validate().is_err());
}

#[test]
fn rect_overlap_is_strict() {
    let a = rect("a", 0, 0, 2, 2);
    assert!(a.overlaps(&rect("b", 1, 1, 2, 2)));
    assert!(!a.overlaps(&rect("c", 2, 0, 2, 2)));
    assert!(!a.overlaps(&rect("d", 0, 2, 2, 2)));
}

#[test]
fn find_overlaps_reports_pairs() {
    let rects = vec![rect("a", 0, 0, 2, 2), rect("b", 4, 0, 2, 2), rect("c", 1, 1, 4, 1)];
    assert_eq!(find_overlaps(&rects), vec![(0, 2), (1, 2)]);
}

// =============================================================
// Default placement
// =============================================================

#[test]
fn default_rect_on_empty_tier_starts_at_origin() {
    let r = default_rect(PanelId::from("n"), &[], Breakpoint::Lg, PanelCode::Board);
    assert_eq!(r, rect("n", 0, 0, 6, 6));
}

#[test]
fn default_rect_goes_below_existing() {
    let existing = vec![rect("a", 0, 0, 3, 2), rect("b", 3, 0, 3, 5)];
    let r = default_rect(PanelId::from("n"), &existing, Breakpoint::Lg, PanelCode::Clock);
    assert_eq!((r.x, r.y), (0, 5));
}

#[test]
fn default_rect_width_clamped_to_columns() {
    let r = default_rect(PanelId::from("n"), &[], Breakpoint::Xxs, PanelCode::Board);
    assert_eq!(r.w, 2);
}

// =============================================================
// Layouts
// =============================================================

#[test]
fn layouts_push_and_tier() {
    let mut layouts = Layouts::new();
    assert!(layouts.is_empty());
    layouts.push(Breakpoint::Lg, rect("a", 0, 0, 1, 1));
    assert_eq!(layouts.tier(Breakpoint::Lg).len(), 1);
    assert!(layouts.tier(Breakpoint::Sm).is_empty());
}

#[test]
fn layouts_remove_panel_hits_every_tier() {
    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, rect("a", 0, 0, 1, 1));
    layouts.push(Breakpoint::Sm, rect("a", 0, 0, 1, 1));
    layouts.push(Breakpoint::Sm, rect("b", 1, 0, 1, 1));
    layouts.remove_panel(&PanelId::from("a"));
    let ids: Vec<&str> = layouts.rects().map(|r| r.panel_id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[test]
fn layouts_retain_panels_counts_dropped() {
    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, rect("a", 0, 0, 1, 1));
    layouts.push(Breakpoint::Lg, rect("x", 1, 0, 1, 1));
    layouts.push(Breakpoint::Md, rect("x", 1, 0, 1, 1));
    let dropped = layouts.retain_panels(|id| id.as_str() == "a");
    assert_eq!(dropped, 2);
    assert_eq!(layouts.rects().count(), 1);
}

#[test]
fn layouts_renamed_rewrites_and_drops_unmapped() {
    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, rect("a", 1, 2, 3, 4));
    layouts.push(Breakpoint::Lg, rect("gone", 0, 0, 1, 1));
    let renames = HashMap::from([(PanelId::from("a"), PanelId::from("a2"))]);

    let copy = layouts.renamed(&renames);
    assert_eq!(copy.tier(Breakpoint::Lg), &[rect("a2", 1, 2, 3, 4)]);
    assert_eq!(layouts.tier(Breakpoint::Lg).len(), 2);
}

#[test]
fn layouts_validate_finds_empty_rect() {
    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Md, rect("ok", 0, 0, 1, 1));
    layouts.push(Breakpoint::Md, rect("bad", 0, 0, 0, 1));
    assert_eq!(layouts.validate(), Err(LayoutError::EmptyRect(PanelId::from("bad"))));
}

#[test]
fn layouts_serialize_as_tier_object() {
    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, rect("a", 0, 0, 1, 1));
    let json = serde_json::to_value(&layouts).unwrap();
    assert_eq!(json, serde_json::json!({"lg": [{"i": "a", "x": 0, "y": 0, "w": 1, "h": 1}]}));
    let back: Layouts = serde_json::from_value(json).unwrap();
    assert_eq!(back, layouts);
}
