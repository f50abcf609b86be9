//! Tunnel network tests.
//!
//! Tests cover: lazy registration, switch permission, capacity,
//! entrances sharing one pool, re-indexing an entrance, and the cave
//! system's subsystem lifecycle.

use skirmish_core::{
    cave_contain::CaveEntrance,
    cave_subsystem::CaveSystem,
    subsystem::SimSubsystem,
    tunnel::{TunnelTracker, DEFAULT_TUNNEL_CAPACITY},
};

fn built_entrance(caves: &mut CaveSystem, id: u32, index: usize) -> CaveEntrance {
    let mut entrance = CaveEntrance::new(id, index);
    entrance.on_build_complete(caves);
    entrance
}

#[test]
fn switch_allowed_between_empty_networks_until_one_fills() {
    let mut caves = CaveSystem::default();
    caves.register_new_cave(1);
    caves.register_new_cave(2);

    assert!(caves.can_switch_index_to_index(1, 2));

    assert!(caves.tracker_for_index_mut(1).unwrap().add_to_contain_list(501));
    assert!(!caves.can_switch_index_to_index(1, 2));
    assert!(!caves.can_switch_index_to_index(2, 1));
}

#[test]
fn switch_permission_matches_occupancy_for_every_pair() {
    let mut caves = CaveSystem::default();
    for index in 0..4 {
        caves.register_new_cave(index);
    }
    caves.tracker_for_index_mut(2).unwrap().add_to_contain_list(9);

    // Index 6 has no tracker at all.
    for i in [0, 1, 2, 3, 6] {
        for j in [0, 1, 2, 3, 6] {
            let expected = i != 2 && j != 2;
            assert_eq!(caves.can_switch_index_to_index(i, j), expected, "{i} -> {j}");
        }
    }
}

#[test]
fn registration_is_lazy_and_idempotent() {
    let mut caves = CaveSystem::default();
    assert!(caves.tracker_for_index(5).is_none());

    caves.register_new_cave(5);
    caves.tracker_for_index_mut(5).unwrap().add_to_contain_list(1);
    caves.register_new_cave(5);

    assert_eq!(caves.tracker_for_index(5).unwrap().contain_count(), 1, "not recreated");
    assert!(caves.tracker_for_index(3).is_none(), "gaps stay empty");
    assert_eq!(caves.trackers().map(|(i, _)| i).collect::<Vec<_>>(), vec![5]);
}

#[test]
fn huge_indices_stay_sparse() {
    let mut caves = CaveSystem::default();
    caves.register_new_cave(usize::MAX);
    caves.register_new_cave(1 << 40);
    caves.register_new_cave(3);

    assert!(caves.tracker_for_index_mut(usize::MAX).unwrap().add_to_contain_list(12));
    assert!(!caves.can_switch_index_to_index(usize::MAX, 3));
    assert!(caves.can_switch_index_to_index(1 << 40, 3));
    assert_eq!(
        caves.trackers().map(|(i, _)| i).collect::<Vec<_>>(),
        vec![3, 1 << 40, usize::MAX],
        "index order"
    );
}

#[test]
fn unregister_keeps_the_tracker() {
    let mut caves = CaveSystem::default();
    caves.register_new_cave(0);
    caves.tracker_for_index_mut(0).unwrap().add_to_contain_list(77);

    caves.unregister_cave(0);

    let tracker = caves.tracker_for_index(0).expect("tracker retained");
    assert_eq!(tracker.contained_items(), &[77]);
}

#[test]
fn capacity_is_a_boolean_outcome() {
    let mut tracker = TunnelTracker::new(3);
    for item in 1..=3 {
        assert!(tracker.add_to_contain_list(item));
    }

    assert!(tracker.is_full());
    assert!(!tracker.add_to_contain_list(4));
    assert!(!tracker.is_valid_container_for(4, true));
    assert!(tracker.is_valid_container_for(4, false));

    assert!(tracker.remove_from_contain_list(2));
    assert!(!tracker.remove_from_contain_list(2));
    assert!(tracker.add_to_contain_list(4));
    assert_eq!(tracker.contained_items(), &[1, 3, 4], "entry order kept");
}

#[test]
fn duplicates_are_refused() {
    let mut tracker = TunnelTracker::default();
    assert_eq!(tracker.contain_max(), DEFAULT_TUNNEL_CAPACITY);
    assert!(tracker.add_to_contain_list(8));
    assert!(!tracker.add_to_contain_list(8));
    assert_eq!(tracker.contain_count(), 1);
}

#[test]
fn entrances_on_one_index_share_a_pool() {
    let mut caves = CaveSystem::new(2);
    let east = built_entrance(&mut caves, 100, 0);
    let west = built_entrance(&mut caves, 101, 0);

    assert!(east.add_to_contain(&mut caves, 1));
    assert!(west.add_to_contain(&mut caves, 2));
    assert!(!east.add_to_contain(&mut caves, 3), "pool is full from either side");

    assert_eq!(west.contained_items(&caves), &[1, 2]);
    assert!(west.remove_from_contain(&mut caves, 1), "leave by another entrance");
    assert_eq!(east.contain_count(&caves), 1);
    assert_eq!(east.contain_max(&caves), 2);

    let tracker = caves.tracker_for_index(0).unwrap();
    assert_eq!(tracker.entrance_count(), 2);
}

#[test]
fn unbuilt_entrance_has_no_pool() {
    let mut caves = CaveSystem::default();
    let entrance = CaveEntrance::new(100, 4);

    assert!(entrance.should_do_on_build_complete());
    assert!(!entrance.add_to_contain(&mut caves, 1));
    assert!(!entrance.is_valid_container_for(&caves, 1, false));
    assert_eq!(entrance.contain_count(&caves), 0);
    assert_eq!(entrance.contain_max(&caves), 0);
}

#[test]
fn build_complete_runs_once() {
    let mut caves = CaveSystem::default();
    let mut entrance = built_entrance(&mut caves, 100, 1);
    caves.tracker_for_index_mut(1).unwrap().add_to_contain_list(5);

    entrance.on_build_complete(&mut caves);

    assert!(!entrance.should_do_on_build_complete());
    assert_eq!(entrance.contain_count(&caves), 1);
    assert_eq!(caves.tracker_for_index(1).unwrap().entrance_count(), 1);
}

#[test]
fn dying_entrance_leaves_the_network_but_not_its_contents() {
    let mut caves = CaveSystem::default();
    let mut a = built_entrance(&mut caves, 100, 0);
    let b = built_entrance(&mut caves, 101, 0);
    a.add_to_contain(&mut caves, 9);

    a.on_die(&mut caves, false);

    let tracker = caves.tracker_for_index(0).unwrap();
    assert!(!tracker.entrances().contains(&100));
    assert!(tracker.entrances().contains(&101));
    assert_eq!(b.contained_items(&caves), &[9]);
}

#[test]
fn dying_under_construction_is_ignored() {
    let mut caves = CaveSystem::default();
    let mut a = built_entrance(&mut caves, 100, 0);

    a.on_die(&mut caves, true);

    assert!(caves.tracker_for_index(0).unwrap().entrances().contains(&100));
}

#[test]
fn reindexing_moves_only_the_one_entrance() {
    let mut caves = CaveSystem::default();
    let mut a = built_entrance(&mut caves, 100, 0);
    let b = built_entrance(&mut caves, 101, 0);

    assert!(a.try_to_set_cave_index(&mut caves, 3));

    assert_eq!(a.cave_index(), 3);
    assert_eq!(b.cave_index(), 0, "siblings untouched");
    let old = caves.tracker_for_index(0).unwrap();
    assert_eq!(old.entrances().iter().copied().collect::<Vec<_>>(), vec![101]);
    let new = caves.tracker_for_index(3).unwrap();
    assert_eq!(new.entrances().iter().copied().collect::<Vec<_>>(), vec![100]);
}

#[test]
fn reindexing_refused_while_occupied() {
    let mut caves = CaveSystem::default();
    let mut a = built_entrance(&mut caves, 100, 0);
    let _b = built_entrance(&mut caves, 101, 1);
    a.add_to_contain(&mut caves, 7);

    assert!(!a.try_to_set_cave_index(&mut caves, 1));
    assert_eq!(a.cave_index(), 0);
    assert_eq!(a.contained_items(&caves), &[7]);
}

#[test]
fn init_on_a_populated_system_clears_it() {
    let mut caves = CaveSystem::default();
    caves.register_new_cave(2);

    caves.init().unwrap();

    assert!(caves.tracker_for_index(2).is_none());
    assert_eq!(caves.trackers().count(), 0);
}

#[test]
fn capacity_applies_to_new_networks() {
    let mut caves = CaveSystem::new(4);
    caves.register_new_cave(0);
    caves.set_tunnel_capacity(1);
    caves.register_new_cave(1);

    assert_eq!(caves.tracker_for_index(0).unwrap().contain_max(), 4);
    assert_eq!(caves.tracker_for_index(1).unwrap().contain_max(), 1);
}
