//! Shipped board tests
//!
//! Every board under `boards/` must load, merge its includes and resolve
//! against the kernel rule table.

mod fixtures;

use fixtures::{board_path, boards_dir, BoardDir, SHIPPED_BOARDS};
use kcfg::{BoardLoader, Origin, ResolutionReport, SourceOrigin};

// =============================================================================
// All shipped boards
// =============================================================================

#[test]
fn test_shipped_boards_resolve() {
    for name in SHIPPED_BOARDS {
        let board = BoardLoader::new()
            .load(&board_path(name))
            .unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert_eq!(board.name, *name);

        let resolved = board
            .resolve()
            .unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert_eq!(resolved.len(), kcfg::kernel::rules().unwrap().len());
    }
}

#[test]
fn test_shipped_boards_record_include() {
    let board = BoardLoader::new().load(&board_path("nrf9160")).unwrap();

    assert_eq!(board.sources.len(), 2);
    assert_eq!(board.sources[0].origin, SourceOrigin::Include);
    assert!(board.sources[0].label().ends_with("common.toml"));
    assert_eq!(board.sources[1].origin, SourceOrigin::Board);
    for source in &board.sources {
        let digest = source.digest.as_ref().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn test_boards_dir_scan() {
    let boards: Vec<_> = walkdir::WalkDir::new(boards_dir())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |x| x == "toml"))
        .collect();
    assert!(boards.len() >= SHIPPED_BOARDS.len());

    for entry in boards {
        let result = BoardLoader::new()
            .load(entry.path())
            .and_then(|b| b.resolve().map(|_| ()));
        assert!(result.is_ok(), "{}: {:?}", entry.path().display(), result);
    }
}

// =============================================================================
// nrf9160
// =============================================================================

#[test]
fn test_heap_scheme_from_board() {
    let dir = BoardDir::new();
    let board = dir.write("board.toml", "[memory]\nheap_scheme = \"heap_2\"\n");

    let resolved = BoardLoader::new().load(&board).unwrap().resolve().unwrap();
    assert_eq!(resolved.get_choice("heap_scheme"), Some("heap_2"));
    assert_eq!(resolved.origin("heap_scheme"), Some(Origin::User));
    assert_eq!(kcfg::emit::heap_source(&resolved).as_deref(), Some("heap_2.c"));
}

#[test]
fn test_nrf9160_values() {
    let board = BoardLoader::new().load(&board_path("nrf9160")).unwrap();
    let resolved = board.resolve().unwrap();

    assert_eq!(resolved.get_choice("trustzone_mode"), Some("secure-only"));
    assert_eq!(resolved.get_bool("trustzone_enabled"), Some(false));
    assert_eq!(resolved.get_u64("cpu_clock_hz"), Some(64_000_000));
    assert_eq!(resolved.get_u64("max_task_name_len"), Some(12));
    assert_eq!(resolved.get_u64("total_heap_size"), Some(50 * 1024));

    // 7 << (8 - 3), 2 << (8 - 3)
    assert_eq!(resolved.get_u64("kernel_interrupt_priority"), Some(224));
    assert_eq!(resolved.get_u64("max_syscall_interrupt_priority"), Some(64));
    assert_eq!(resolved.origin("kernel_interrupt_priority"), Some(Origin::Derived));

    assert_eq!(resolved.get_u64("timer_task_stack_depth"), Some(128));
    assert_eq!(resolved.origin("timer_task_stack_depth"), Some(Origin::Derived));
    assert_eq!(resolved.origin("tick_rate_hz"), Some(Origin::User));
    assert_eq!(resolved.origin("use_co_routines"), Some(Origin::Default));
}

#[test]
fn test_nrf9160_key_provenance() {
    let board = BoardLoader::new().load(&board_path("nrf9160")).unwrap();

    let tick = board.source_of("tick_rate_hz").unwrap();
    assert!(tick.label().ends_with("common.toml"));

    let clock = board.source_of("cpu_clock_hz").unwrap();
    assert!(clock.label().ends_with("nrf9160.toml"));

    assert!(board.source_of("use_co_routines").is_none());
}

// =============================================================================
// cortex-m33-secure
// =============================================================================

#[test]
fn test_cortex_m33_four_priority_bits() {
    let board = BoardLoader::new().load(&board_path("cortex-m33-secure")).unwrap();
    let resolved = board.resolve().unwrap();

    assert_eq!(resolved.get_u64("prio_bits"), Some(4));
    assert_eq!(resolved.get_u64("kernel_interrupt_priority"), Some(15 << 4));
    assert_eq!(resolved.get_u64("max_syscall_interrupt_priority"), Some(5 << 4));
    assert_eq!(resolved.get_bool("enable_mpu"), Some(true));
}

// =============================================================================
// win-sim
// =============================================================================

#[test]
fn test_win_sim_hooks_and_allocation() {
    let board = BoardLoader::new().load(&board_path("win-sim")).unwrap();
    assert!(board.raw.hooks().contains("daemon_task_startup"));

    let resolved = board.resolve().unwrap();
    assert_eq!(resolved.get_bool("use_daemon_task_startup_hook"), Some(true));
    assert_eq!(resolved.get_bool("use_queue_sets"), Some(true));
    assert_eq!(resolved.get_bool("support_static_allocation"), Some(true));
    assert_eq!(resolved.get_choice("trustzone_mode"), Some("non-secure-only"));
}

#[test]
fn test_win_sim_report() {
    let board = BoardLoader::new().load(&board_path("win-sim")).unwrap();
    let resolved = board.resolve().unwrap();
    let report = ResolutionReport::new(&board, resolved);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["board"], "win-sim");
    assert_eq!(json["hooks"][0], "daemon_task_startup");
    assert_eq!(json["sources"].as_array().unwrap().len(), 2);
    assert_eq!(json["config"]["use_queue_sets"]["value"], true);
}
