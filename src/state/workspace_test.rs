use super::*;
use crate::state::panels::{ClockPatch, MemoPatch, PanelState};

fn workspace_with_screens(n: usize) -> (Workspace, Vec<ScreenId>) {
    let mut ws = Workspace::new();
    let ids = (0..n).map(|_| ws.add_screen()).collect();
    (ws, ids)
}

fn list_ids(ws: &Workspace) -> Vec<ScreenId> {
    ws.list().iter().cloned().collect()
}

// =============================================================
// Screen list
// =============================================================

#[test]
fn add_screen_appends_empty_screen() {
    let (ws, ids) = workspace_with_screens(2);
    assert_eq!(list_ids(&ws), ids);
    let screen = ws.screens().get(&ids[1]).unwrap();
    assert!(screen.panel_ids.is_empty());
    assert!(screen.layouts.is_empty());
    ws.check_invariants().unwrap();
}

#[test]
fn add_screen_ids_are_unique() {
    let (_, ids) = workspace_with_screens(50);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 50);
}

#[test]
fn remove_screen_cascades_to_panels() {
    let (mut ws, ids) = workspace_with_screens(2);
    let doomed = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let kept = ws.add_panel(&ids[1], PanelCode::Clock, None).unwrap();

    assert_eq!(ws.remove_screen(0).unwrap(), ids[0]);

    assert_eq!(list_ids(&ws), vec![ids[1].clone()]);
    assert!(!ws.screens().contains(&ids[0]));
    assert!(!ws.panels().contains(&doomed));
    assert!(ws.panels().contains(&kept));
    ws.check_invariants().unwrap();
}

#[test]
fn remove_screen_out_of_range_leaves_state() {
    let (mut ws, ids) = workspace_with_screens(1);
    let err = ws.remove_screen(3).unwrap_err();
    assert!(matches!(err, WorkspaceError::InvalidIndex { index: 3, len: 1 }));
    assert_eq!(list_ids(&ws), ids);
}

#[test]
fn move_screen_reorders() {
    let (mut ws, ids) = workspace_with_screens(3);
    ws.move_screen(0, 2).unwrap();
    assert_eq!(list_ids(&ws), vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
    ws.move_screen(2, 0).unwrap();
    assert_eq!(list_ids(&ws), ids);
}

#[test]
fn move_screen_same_index_is_noop() {
    let (mut ws, ids) = workspace_with_screens(3);
    ws.move_screen(1, 1).unwrap();
    assert_eq!(list_ids(&ws), ids);
}

#[test]
fn move_screen_checks_both_indices() {
    let (mut ws, ids) = workspace_with_screens(2);
    assert!(matches!(ws.move_screen(5, 0), Err(WorkspaceError::InvalidIndex { index: 5, .. })));
    assert!(matches!(ws.move_screen(0, 2), Err(WorkspaceError::InvalidIndex { index: 2, .. })));
    assert_eq!(list_ids(&ws), ids);
}

#[test]
fn mixed_screen_operations_keep_list_and_registry_in_step() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut ws = Workspace::new();
    let (mut adds, mut removes) = (0usize, 0usize);

    for _ in 0..500 {
        let len = ws.list().len();
        match rng.random_range(0..3) {
            0 => {
                ws.add_screen();
                adds += 1;
            }
            1 if len > 0 => {
                ws.remove_screen(rng.random_range(0..len)).unwrap();
                removes += 1;
            }
            2 if len > 0 => {
                ws.move_screen(rng.random_range(0..len), rng.random_range(0..len)).unwrap();
            }
            _ => {
                assert!(ws.remove_screen(len).is_err());
            }
        }
        assert_eq!(ws.list().len(), adds - removes);
        assert_eq!(ws.screens().len(), adds - removes);
        ws.check_invariants().unwrap();
    }
}

// =============================================================
// Copy
// =============================================================

#[test]
fn copy_screen_duplicates_with_fresh_ids() {
    let (mut ws, ids) = workspace_with_screens(1);
    let memo = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    ws.update_panel_state(&memo, PanelStatePatch::Memo(MemoPatch { text: Some("buy".into()) }))
        .unwrap();
    ws.add_panel(&ids[0], PanelCode::Clock, None).unwrap();

    let copy_id = ws.copy_screen(0).unwrap();

    assert_eq!(list_ids(&ws), vec![ids[0].clone(), copy_id.clone()]);
    let source = ws.screens().get(&ids[0]).unwrap();
    let copy = ws.screens().get(&copy_id).unwrap();
    assert_eq!(copy.panel_ids.len(), 2);
    for (old, new) in source.panel_ids.iter().zip(&copy.panel_ids) {
        assert_ne!(old, new);
        let (old_panel, new_panel) = (ws.panels().get(old).unwrap(), ws.panels().get(new).unwrap());
        assert_eq!(old_panel.panel_state, new_panel.panel_state);
    }

    let source_rects = source.layouts.tier(Breakpoint::Lg);
    let copy_rects = copy.layouts.tier(Breakpoint::Lg);
    assert_eq!(copy_rects.len(), source_rects.len());
    for (a, b) in source_rects.iter().zip(copy_rects) {
        assert_eq!((a.x, a.y, a.w, a.h), (b.x, b.y, b.w, b.h));
        assert!(copy.owns(&b.panel_id));
    }
    ws.check_invariants().unwrap();
}

#[test]
fn copy_is_independent_of_source() {
    let (mut ws, ids) = workspace_with_screens(1);
    let memo = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let copy_id = ws.copy_screen(0).unwrap();
    let copied = ws.screens().get(&copy_id).unwrap().panel_ids[0].clone();

    ws.update_panel_state(&memo, PanelStatePatch::Memo(MemoPatch { text: Some("edited".into()) }))
        .unwrap();

    let PanelState::Memo(state) = &ws.panels().get(&copied).unwrap().panel_state else {
        panic!("expected memo state");
    };
    assert_eq!(state.text, "");
}

#[test]
fn copy_screen_lands_after_source() {
    let (mut ws, ids) = workspace_with_screens(3);
    let copy_id = ws.copy_screen(1).unwrap();
    assert_eq!(list_ids(&ws), vec![ids[0].clone(), ids[1].clone(), copy_id.clone(), ids[2].clone()]);

    let last = ws.copy_screen(3).unwrap();
    assert_eq!(list_ids(&ws).last(), Some(&last));
    ws.check_invariants().unwrap();
}

#[test]
fn copy_screen_out_of_range() {
    let (mut ws, _) = workspace_with_screens(1);
    assert!(matches!(ws.copy_screen(1), Err(WorkspaceError::InvalidIndex { index: 1, len: 1 })));
    assert_eq!(ws.list().len(), 1);
}

// =============================================================
// Panels
// =============================================================

#[test]
fn add_panel_places_default_rect_on_current_tier() {
    let (mut ws, ids) = workspace_with_screens(1);
    ws.set_breakpoint(Breakpoint::Sm);
    let first = ws.add_panel(&ids[0], PanelCode::Board, None).unwrap();
    let second = ws.add_panel(&ids[0], PanelCode::Clock, None).unwrap();

    let screen = ws.screens().get(&ids[0]).unwrap();
    assert_eq!(screen.panel_ids, vec![first.clone(), second.clone()]);
    let rects = screen.layouts.tier(Breakpoint::Sm);
    assert_eq!(rects[0], LayoutRect::new(first, 0, 0, 6, 6));
    assert_eq!(rects[1], LayoutRect::new(second, 0, 6, 3, 2));
    assert!(screen.layouts.tier(Breakpoint::Lg).is_empty());
}

#[test]
fn add_panel_rekeys_caller_rect() {
    let (mut ws, ids) = workspace_with_screens(1);
    let item = LayoutRect::new(PanelId::from("placeholder"), 4, 1, 2, 2);
    let id = ws.add_panel(&ids[0], PanelCode::News, Some(item)).unwrap();

    let rect = &ws.screens().get(&ids[0]).unwrap().layouts.tier(Breakpoint::Lg)[0];
    assert_eq!(rect, &LayoutRect::new(id.clone(), 4, 1, 2, 2));
    assert_eq!(ws.panels().get(&id).unwrap().panel_code, PanelCode::News);
}

#[test]
fn add_panel_rejects_empty_rect() {
    let (mut ws, ids) = workspace_with_screens(1);
    let item = LayoutRect::new(PanelId::from("x"), 0, 0, 0, 2);
    let err = ws.add_panel(&ids[0], PanelCode::Memo, Some(item)).unwrap_err();
    assert!(matches!(err, WorkspaceError::Layout(LayoutError::EmptyRect(_))));
    assert!(ws.panels().is_empty());
    assert!(ws.screens().get(&ids[0]).unwrap().panel_ids.is_empty());
}

#[test]
fn add_panel_unknown_screen() {
    let mut ws = Workspace::new();
    let err = ws.add_panel(&ScreenId::from("nope"), PanelCode::Memo, None).unwrap_err();
    assert!(matches!(err, WorkspaceError::ScreenNotFound(_)));
}

#[test]
fn remove_panel_clears_rects_everywhere() {
    let (mut ws, ids) = workspace_with_screens(1);
    let id = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let mut layouts = ws.screens().get(&ids[0]).unwrap().layouts.clone();
    layouts.push(Breakpoint::Xs, LayoutRect::new(id.clone(), 0, 0, 2, 2));
    ws.update_layouts(&ids[0], layouts).unwrap();

    ws.remove_panel(&ids[0], &id).unwrap();

    let screen = ws.screens().get(&ids[0]).unwrap();
    assert!(screen.panel_ids.is_empty());
    assert_eq!(screen.layouts.rects().count(), 0);
    assert!(!ws.panels().contains(&id));
    ws.check_invariants().unwrap();
}

#[test]
fn remove_panel_is_idempotent() {
    let (mut ws, ids) = workspace_with_screens(1);
    let id = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    ws.remove_panel(&ids[0], &id).unwrap();
    ws.remove_panel(&ids[0], &id).unwrap();
    ws.check_invariants().unwrap();
}

#[test]
fn remove_panel_of_other_screen_is_noop() {
    let (mut ws, ids) = workspace_with_screens(2);
    let id = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    ws.remove_panel(&ids[1], &id).unwrap();
    assert!(ws.panels().contains(&id));
}

#[test]
fn update_panel_state_merges() {
    let (mut ws, ids) = workspace_with_screens(1);
    let id = ws.add_panel(&ids[0], PanelCode::Clock, None).unwrap();
    ws.update_panel_state(&id, PanelStatePatch::Clock(ClockPatch { time_zone: Some("utc".into()), ..ClockPatch::default() }))
        .unwrap();
    let PanelState::Clock(clock) = &ws.panels().get(&id).unwrap().panel_state else {
        panic!("expected clock state");
    };
    assert_eq!(clock.time_zone, "utc");
    assert!(clock.show_seconds);
}

#[test]
fn update_panel_state_leaves_other_panels_alone() {
    let (mut ws, ids) = workspace_with_screens(2);
    let target = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let neighbour = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let elsewhere = ws.add_panel(&ids[1], PanelCode::Memo, None).unwrap();
    ws.update_panel_state(&neighbour, PanelStatePatch::Memo(MemoPatch { text: Some("keep".into()) }))
        .unwrap();
    let before_neighbour = ws.panels().get(&neighbour).unwrap().clone();
    let before_elsewhere = ws.panels().get(&elsewhere).unwrap().clone();

    ws.update_panel_state(&target, PanelStatePatch::Memo(MemoPatch { text: Some("changed".into()) }))
        .unwrap();

    assert_eq!(ws.panels().get(&neighbour).unwrap(), &before_neighbour);
    assert_eq!(ws.panels().get(&elsewhere).unwrap(), &before_elsewhere);
    let PanelState::Memo(memo) = &ws.panels().get(&target).unwrap().panel_state else {
        panic!("expected memo state");
    };
    assert_eq!(memo.text, "changed");
}

#[test]
fn update_panel_state_mismatch_is_error() {
    let (mut ws, ids) = workspace_with_screens(1);
    let id = ws.add_panel(&ids[0], PanelCode::Clock, None).unwrap();
    let err = ws.update_panel_state(&id, PanelStatePatch::Memo(MemoPatch::default())).unwrap_err();
    assert!(matches!(err, WorkspaceError::Panel(PanelError::StateMismatch { .. })));
}

// =============================================================
// Layouts
// =============================================================

#[test]
fn update_layouts_drops_foreign_rects_keeps_overlaps() {
    let (mut ws, ids) = workspace_with_screens(1);
    let a = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let b = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();

    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, LayoutRect::new(a.clone(), 0, 0, 3, 3));
    layouts.push(Breakpoint::Lg, LayoutRect::new(b.clone(), 1, 1, 3, 3));
    layouts.push(Breakpoint::Lg, LayoutRect::new(PanelId::from("foreign"), 6, 0, 1, 1));
    ws.update_layouts(&ids[0], layouts).unwrap();

    let rects = ws.screens().get(&ids[0]).unwrap().layouts.tier(Breakpoint::Lg).to_vec();
    assert_eq!(rects, vec![LayoutRect::new(a, 0, 0, 3, 3), LayoutRect::new(b, 1, 1, 3, 3)]);
    ws.check_invariants().unwrap();
}

#[test]
fn update_layouts_rejects_empty_rect_without_change() {
    let (mut ws, ids) = workspace_with_screens(1);
    let a = ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    let before = ws.screens().get(&ids[0]).unwrap().layouts.clone();

    let mut layouts = Layouts::new();
    layouts.push(Breakpoint::Lg, LayoutRect::new(a, 0, 0, 0, 0));
    assert!(ws.update_layouts(&ids[0], layouts).is_err());
    assert_eq!(ws.screens().get(&ids[0]).unwrap().layouts, before);
}

// =============================================================
// Repair
// =============================================================

#[test]
fn repair_on_consistent_workspace_is_clean() {
    let (mut ws, ids) = workspace_with_screens(2);
    ws.add_panel(&ids[0], PanelCode::Memo, None).unwrap();
    assert!(ws.repair().is_clean());
}

#[test]
fn repair_drops_dangling_references() {
    let listed = ScreenId::from("s1");
    let missing = ScreenId::from("ghost");
    let orphan = ScreenId::from("s0");

    let mut screen = Screen::new(listed.clone());
    screen.panel_ids = vec![PanelId::from("p1"), PanelId::from("gone")];
    screen.layouts.push(Breakpoint::Lg, LayoutRect::new(PanelId::from("p1"), 0, 0, 1, 1));
    screen.layouts.push(Breakpoint::Lg, LayoutRect::new(PanelId::from("stray"), 1, 0, 1, 1));

    let mut screens = ScreenRegistry::new();
    screens.insert(screen);
    screens.insert(Screen::new(orphan.clone()));

    let mut panels = PanelRegistry::new();
    panels.insert(Panel::new(PanelId::from("p1"), PanelCode::Memo));
    panels.insert(Panel::new(PanelId::from("loose"), PanelCode::Clock));

    let list: ScreenList = [listed.clone(), missing, listed.clone()].into_iter().collect();
    let mut ws = Workspace::from_parts(list, screens, panels);
    assert!(ws.check_invariants().is_err());

    let report = ws.repair();
    assert_eq!(
        report,
        RepairReport {
            duplicate_screen_ids: 1,
            missing_screens: 1,
            orphan_screens: 1,
            missing_panels: 1,
            orphan_panels: 1,
            stray_rects: 1,
            mislabeled_panels: 0,
        }
    );
    assert_eq!(list_ids(&ws), vec![listed, orphan]);
    ws.check_invariants().unwrap();
}

#[test]
fn repair_relabels_panel_code_from_state() {
    let screen_id = ScreenId::from("s");
    let mut screen = Screen::new(screen_id.clone());
    screen.panel_ids.push(PanelId::from("p"));
    let mut screens = ScreenRegistry::new();
    screens.insert(screen);

    let mut panel = Panel::new(PanelId::from("p"), PanelCode::Memo);
    panel.panel_code = PanelCode::Clock;
    let mut panels = PanelRegistry::new();
    panels.insert(panel);

    let mut ws = Workspace::from_parts([screen_id].into_iter().collect(), screens, panels);
    assert_eq!(ws.repair().mislabeled_panels, 1);
    assert_eq!(ws.panels().get(&PanelId::from("p")).unwrap().panel_code, PanelCode::Memo);
    ws.check_invariants().unwrap();
}

#[test]
fn screen_at_reports_index() {
    let (ws, ids) = workspace_with_screens(1);
    assert_eq!(ws.screen_at(0).unwrap().id, ids[0]);
    assert!(matches!(ws.screen_at(1), Err(WorkspaceError::InvalidIndex { index: 1, len: 1 })));
}
