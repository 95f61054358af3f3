//! Header and define output for the shipped boards

mod fixtures;

use fixtures::{board_path, SHIPPED_BOARDS};
use kcfg::emit::{self, HEADER_GUARD};
use kcfg::{kernel, BoardLoader, ResolvedConfig};

fn resolve_board(name: &str) -> ResolvedConfig {
    BoardLoader::new()
        .load(&board_path(name))
        .unwrap()
        .resolve()
        .unwrap()
}

/// Value of `#define NAME VALUE` in a rendered header
fn define_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("#define"), Some(n), Some(value)) if n == name => Some(value),
            _ => None,
        }
    })
}

#[test]
fn test_every_board_renders_guarded_header() {
    for name in SHIPPED_BOARDS {
        let header = emit::render(&resolve_board(name), kernel::rules().unwrap());
        assert!(header.contains(&format!("#ifndef {}", HEADER_GUARD)), "{}", name);
        assert_eq!(header.matches("#endif").count(), 1, "{}", name);
        assert!(define_value(&header, "configUSE_PREEMPTION").is_some(), "{}", name);
    }
}

#[test]
fn test_nrf9160_header() {
    let header = emit::render(&resolve_board("nrf9160"), kernel::rules().unwrap());

    assert_eq!(define_value(&header, "configRUN_FREERTOS_SECURE_ONLY"), Some("1"));
    assert_eq!(define_value(&header, "configENABLE_TRUSTZONE"), Some("0"));
    assert_eq!(define_value(&header, "configCPU_CLOCK_HZ"), Some("64000000"));
    assert_eq!(define_value(&header, "configPRIO_BITS"), Some("3"));
    assert_eq!(define_value(&header, "configLIBRARY_LOWEST_INTERRUPT_PRIORITY"), Some("0x07"));
    assert_eq!(define_value(&header, "configKERNEL_INTERRUPT_PRIORITY"), Some("0xE0"));
    assert_eq!(define_value(&header, "configMAX_SYSCALL_INTERRUPT_PRIORITY"), Some("0x40"));
    assert_eq!(define_value(&header, "configTIMER_TASK_STACK_DEPTH"), Some("128"));
    assert_eq!(define_value(&header, "configCHECK_FOR_STACK_OVERFLOW"), Some("2"));
    assert_eq!(define_value(&header, "configCOMMAND_INT_MAX_OUTPUT_SIZE"), Some("2048"));
}

#[test]
fn test_win_sim_header_omits_clock() {
    let header = emit::render(&resolve_board("win-sim"), kernel::rules().unwrap());

    assert_eq!(define_value(&header, "configCPU_CLOCK_HZ"), None);
    assert_eq!(define_value(&header, "configRUN_FREERTOS_SECURE_ONLY"), Some("0"));
    assert_eq!(define_value(&header, "configUSE_DAEMON_TASK_STARTUP_HOOK"), Some("1"));
    assert_eq!(define_value(&header, "configSUPPORT_STATIC_ALLOCATION"), Some("1"));
}

#[test]
fn test_header_is_deterministic() {
    let rules = kernel::rules().unwrap();
    let first = emit::render(&resolve_board("cortex-m33-secure"), rules);
    let second = emit::render(&resolve_board("cortex-m33-secure"), rules);
    assert_eq!(first, second);
}

#[test]
fn test_defines_match_header() {
    let resolved = resolve_board("cortex-m33-secure");
    let rules = kernel::rules().unwrap();
    let header = emit::render(&resolved, rules);
    let defines = emit::defines(&resolved, rules);

    let emitted = header.matches("\n#define config").count() + header.matches("\n#define INCLUDE_").count();
    assert_eq!(emitted, defines.len());
    for define in &defines {
        assert_eq!(define_value(&header, define.name), Some(define.value.as_str()));
    }

    let flags: Vec<String> = defines.iter().map(|d| d.to_flag()).collect();
    assert!(flags.contains(&"-DconfigKERNEL_INTERRUPT_PRIORITY=0xF0".to_string()));
    assert!(flags.contains(&"-DconfigENABLE_MPU=1".to_string()));
}
