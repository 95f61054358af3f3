//! Cross-field rules for the kernel table.

use kcfg_resolver::{Invariant, Lookup, Violation};

use super::trustzone::TrustZoneMode;

/// Hook flags and the function each one obliges the target to provide.
pub const HOOK_FLAGS: &[(&str, &str)] = &[
    ("use_idle_hook", "idle"),
    ("use_tick_hook", "tick"),
    ("use_malloc_failed_hook", "malloc_failed"),
    ("use_daemon_task_startup_hook", "daemon_task_startup"),
];

/// Hook required when tickless idle is on (`portSUPPRESS_TICKS_AND_SLEEP`).
pub const TICKLESS_HOOK: &str = "suppress_ticks_and_sleep";

/// Hooks required to generate run time statistics.
pub const RUN_TIME_STATS_HOOKS: &[&str] = &[
    "configure_timer_for_run_time_stats",
    "get_run_time_counter_value",
];

fn violated(message: impl Into<String>) -> Result<(), Violation> {
    Err(Violation::Violated(message.into()))
}

fn trustzone_mode(l: &Lookup<'_>) -> Result<TrustZoneMode, Violation> {
    l.choice("trustzone_mode")?
        .parse()
        .map_err(Violation::Violated)
}

fn secure_only_without_trustzone(l: &Lookup<'_>) -> Result<(), Violation> {
    if trustzone_mode(l)?.runs_secure_only() && l.bool("trustzone_enabled")? {
        return violated("a secure-only build must not enable TrustZone support");
    }
    Ok(())
}

fn trustzone_toggle_matches_mode(l: &Lookup<'_>) -> Result<(), Violation> {
    let mode = trustzone_mode(l)?;
    let enabled = l.bool("trustzone_enabled")?;
    match (mode.requires_trustzone(), enabled) {
        (true, false) => violated(format!("{} mode requires trustzone_enabled = true", mode)),
        // secure-only is covered by secure_only_without_trustzone
        (false, true) if !mode.runs_secure_only() => violated(format!(
            "{} mode has no secure-side calls; set trustzone_enabled = false",
            mode
        )),
        _ => Ok(()),
    }
}

fn tickless_idle_requires_hook(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.bool("use_tickless_idle")? && !l.has_hook(TICKLESS_HOOK) {
        return violated(format!(
            "tickless idle needs the '{}' hook to be supplied",
            TICKLESS_HOOK
        ));
    }
    Ok(())
}

fn hook_flags_have_hooks(l: &Lookup<'_>) -> Result<(), Violation> {
    for (flag, hook) in HOOK_FLAGS {
        if l.bool(flag)? && !l.has_hook(hook) {
            return violated(format!("{} is set but no '{}' hook is supplied", flag, hook));
        }
    }
    Ok(())
}

fn run_time_stats_have_hooks(l: &Lookup<'_>) -> Result<(), Violation> {
    if !l.bool("generate_run_time_stats")? {
        return Ok(());
    }
    match RUN_TIME_STATS_HOOKS.iter().find(|h| !l.has_hook(h)) {
        Some(missing) => violated(format!(
            "run time stats need the '{}' hook to be supplied",
            missing
        )),
        None => Ok(()),
    }
}

fn some_allocation_scheme(l: &Lookup<'_>) -> Result<(), Violation> {
    if !l.bool("support_dynamic_allocation")? && !l.bool("support_static_allocation")? {
        return violated("at least one of static or dynamic allocation must be supported");
    }
    Ok(())
}

fn malloc_failed_hook_requires_heap(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.bool("use_malloc_failed_hook")? && !l.bool("support_dynamic_allocation")? {
        return violated("the malloc-failed hook is only called with dynamic allocation");
    }
    Ok(())
}

fn heap_1_never_frees(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.choice("heap_scheme")? == "heap_1"
        && l.bool("support_dynamic_allocation")?
        && l.bool("include_v_task_delete")?
    {
        return violated("heap_1 never frees memory, so dynamically created tasks cannot be deleted");
    }
    Ok(())
}

fn recursive_mutexes_require_mutexes(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.bool("use_recursive_mutexes")? && !l.bool("use_mutexes")? {
        return violated("recursive mutexes are built on mutexes; enable use_mutexes");
    }
    Ok(())
}

fn timer_task_priority_in_range(l: &Lookup<'_>) -> Result<(), Violation> {
    if !l.bool("use_timers")? {
        return Ok(());
    }
    let priority = l.u64("timer_task_priority")?;
    let max = l.u64("max_priorities")?;
    if priority >= max {
        return violated(format!(
            "timer task priority {} must be below max_priorities ({})",
            priority, max
        ));
    }
    Ok(())
}

fn stats_formatting_requires_trace(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.bool("use_stats_formatting_functions")? && !l.bool("use_trace_facility")? {
        return violated("stats formatting functions need use_trace_facility");
    }
    Ok(())
}

fn syscall_priority_nonzero(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.u64("max_syscall_interrupt_priority")? == 0 {
        return violated("the max syscall interrupt priority must not be zero");
    }
    Ok(())
}

fn syscall_priority_order(l: &Lookup<'_>) -> Result<(), Violation> {
    // lower numeric value means higher urgency
    let max_syscall = l.u64("library_max_syscall_interrupt_priority")?;
    let lowest = l.u64("library_lowest_interrupt_priority")?;
    if max_syscall > lowest {
        return violated(format!(
            "max syscall priority {} is less urgent than the lowest priority {}",
            max_syscall, lowest
        ));
    }
    Ok(())
}

fn tick_rate_below_cpu_clock(l: &Lookup<'_>) -> Result<(), Violation> {
    let clock = l.u64("cpu_clock_hz")?;
    let tick = l.u64("tick_rate_hz")?;
    if clock > 0 && tick >= clock {
        return violated(format!("tick rate {} Hz is not below the {} Hz core clock", tick, clock));
    }
    Ok(())
}

fn initial_tick_fits_tick_type(l: &Lookup<'_>) -> Result<(), Violation> {
    if l.bool("use_16_bit_ticks")? && l.u64("initial_tick_count")? > u64::from(u16::MAX) {
        return violated("initial tick count does not fit a 16-bit tick type");
    }
    Ok(())
}

/// The fixed set of kernel invariants, in checking order.
pub fn all() -> Vec<Invariant> {
    vec![
        Invariant::new(
            "secure_only_without_trustzone",
            &["trustzone_mode", "trustzone_enabled"],
            secure_only_without_trustzone,
        ),
        Invariant::new(
            "trustzone_toggle_matches_mode",
            &["trustzone_mode", "trustzone_enabled"],
            trustzone_toggle_matches_mode,
        ),
        Invariant::new(
            "tickless_idle_requires_hook",
            &["use_tickless_idle"],
            tickless_idle_requires_hook,
        ),
        Invariant::new(
            "hook_flags_have_hooks",
            &[
                "use_idle_hook",
                "use_tick_hook",
                "use_malloc_failed_hook",
                "use_daemon_task_startup_hook",
            ],
            hook_flags_have_hooks,
        ),
        Invariant::new(
            "run_time_stats_have_hooks",
            &["generate_run_time_stats"],
            run_time_stats_have_hooks,
        ),
        Invariant::new(
            "some_allocation_scheme",
            &["support_dynamic_allocation", "support_static_allocation"],
            some_allocation_scheme,
        ),
        Invariant::new(
            "malloc_failed_hook_requires_heap",
            &["use_malloc_failed_hook", "support_dynamic_allocation"],
            malloc_failed_hook_requires_heap,
        ),
        Invariant::new(
            "heap_1_never_frees",
            &["heap_scheme", "support_dynamic_allocation", "include_v_task_delete"],
            heap_1_never_frees,
        ),
        Invariant::new(
            "recursive_mutexes_require_mutexes",
            &["use_recursive_mutexes", "use_mutexes"],
            recursive_mutexes_require_mutexes,
        ),
        Invariant::new(
            "timer_task_priority_in_range",
            &["use_timers", "timer_task_priority", "max_priorities"],
            timer_task_priority_in_range,
        ),
        Invariant::new(
            "stats_formatting_requires_trace",
            &["use_stats_formatting_functions", "use_trace_facility"],
            stats_formatting_requires_trace,
        ),
        Invariant::new(
            "syscall_priority_nonzero",
            &["max_syscall_interrupt_priority"],
            syscall_priority_nonzero,
        ),
        Invariant::new(
            "syscall_priority_order",
            &[
                "library_max_syscall_interrupt_priority",
                "library_lowest_interrupt_priority",
            ],
            syscall_priority_order,
        ),
        Invariant::new(
            "tick_rate_below_cpu_clock",
            &["tick_rate_hz", "cpu_clock_hz"],
            tick_rate_below_cpu_clock,
        ),
        Invariant::new(
            "initial_tick_fits_tick_type",
            &["use_16_bit_ticks", "initial_tick_count"],
            initial_tick_fits_tick_type,
        ),
    ]
}
