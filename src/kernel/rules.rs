//! FreeRTOS kernel option table.
//!
//! Defaults follow the kernel's conservative choices: smallest footprint,
//! optional subsystems off unless the inner configuration header turns them
//! on (mutexes, task notifications, `vTaskDelay`, current task handle).

use kcfg_resolver::{
    Category, Constraint, Derivation, DeriveError, Lookup, OptionValue, Rule, ValueKind,
};

use super::trustzone::MODE_NAMES;

/// Allocators shipped in the kernel's `portable/MemMang`, one source file each.
pub const HEAP_SCHEMES: &[&str] = &["heap_1", "heap_2", "heap_3", "heap_4", "heap_5"];

/// Width of the Cortex-M priority register field.
const PRIORITY_FIELD_BITS: u64 = 8;

/// Shift a library priority into the top `prio_bits` of the 8-bit
/// priority register, as `value << (8 - prio_bits)`.
pub fn shift_priority(value: u64, prio_bits: u64) -> Result<u64, DeriveError> {
    let shift = PRIORITY_FIELD_BITS.checked_sub(prio_bits).ok_or_else(|| {
        DeriveError::Arithmetic(format!(
            "{} priority bits exceed the {}-bit priority field",
            prio_bits, PRIORITY_FIELD_BITS
        ))
    })?;
    let shifted = value
        .checked_shl(shift as u32)
        .filter(|v| v >> shift == value && *v <= 0xFF)
        .ok_or_else(|| {
            DeriveError::Arithmetic(format!(
                "{} << {} does not fit in the 8-bit priority register",
                value, shift
            ))
        })?;
    Ok(shifted)
}

fn kernel_interrupt_priority(l: &Lookup<'_>) -> Result<OptionValue, DeriveError> {
    let lowest = l.u64("library_lowest_interrupt_priority")?;
    let bits = l.u64("prio_bits")?;
    shift_priority(lowest, bits).map(OptionValue::UInt)
}

fn max_syscall_interrupt_priority(l: &Lookup<'_>) -> Result<OptionValue, DeriveError> {
    let max = l.u64("library_max_syscall_interrupt_priority")?;
    let bits = l.u64("prio_bits")?;
    shift_priority(max, bits).map(OptionValue::UInt)
}

fn timer_task_stack_depth(l: &Lookup<'_>) -> Result<OptionValue, DeriveError> {
    Ok(OptionValue::UInt(l.u64("minimal_stack_size")?))
}

fn scheduler() -> Vec<Rule> {
    use Category::Scheduler as S;
    vec![
        Rule::flag("use_preemption", S, true)
            .define("configUSE_PREEMPTION")
            .doc("Preemptive (true) or cooperative (false) scheduling"),
        Rule::flag("use_time_slicing", S, true)
            .define("configUSE_TIME_SLICING")
            .doc("Round-robin between tasks of equal priority on each tick"),
        Rule::flag("idle_should_yield", S, true)
            .define("configIDLE_SHOULD_YIELD")
            .doc("Idle task yields to application tasks at idle priority"),
        Rule::uint("tick_rate_hz", S, 1000)
            .constraint(Constraint::Range { min: 1, max: 1_000_000 })
            .define("configTICK_RATE_HZ")
            .doc("Scheduler tick frequency"),
        Rule::uint("cpu_clock_hz", S, 0)
            .define("configCPU_CLOCK_HZ")
            .doc("Core clock frequency; 0 leaves it to the port"),
        Rule::uint("max_priorities", S, 5)
            .constraint(Constraint::Range { min: 1, max: 32 })
            .define("configMAX_PRIORITIES")
            .doc("Number of task priority levels"),
        Rule::uint("max_task_name_len", S, 16)
            .constraint(Constraint::Range { min: 1, max: 256 })
            .define("configMAX_TASK_NAME_LEN"),
        Rule::flag("use_16_bit_ticks", S, false).define("configUSE_16_BIT_TICKS"),
        Rule::flag("use_tickless_idle", S, false)
            .define("configUSE_TICKLESS_IDLE")
            .doc("Suppress the tick while idle; needs a tick-suppression hook"),
        Rule::flag("use_port_optimised_task_selection", S, false)
            .define("configUSE_PORT_OPTIMISED_TASK_SELECTION"),
        Rule::uint("initial_tick_count", S, 0).define("configINITIAL_TICK_COUNT"),
    ]
}

fn memory() -> Vec<Rule> {
    use Category::Memory as M;
    vec![
        Rule::uint("minimal_stack_size", M, 128)
            .constraint(Constraint::AtLeast { min: 16 })
            .define("configMINIMAL_STACK_SIZE")
            .doc("Idle task stack size, in words"),
        Rule::uint("total_heap_size", M, 16 * 1024)
            .constraint(Constraint::AtLeast { min: 1024 })
            .define("configTOTAL_HEAP_SIZE")
            .doc("Kernel heap size in bytes"),
        Rule::choice("heap_scheme", M, HEAP_SCHEMES, "heap_4")
            .doc("Kernel allocator source, heap_1 to heap_5; picked at build time, not by a macro"),
        Rule::flag("support_dynamic_allocation", M, true)
            .define("configSUPPORT_DYNAMIC_ALLOCATION"),
        Rule::flag("support_static_allocation", M, false)
            .define("configSUPPORT_STATIC_ALLOCATION"),
        Rule::uint("num_thread_local_storage_pointers", M, 0)
            .constraint(Constraint::Range { min: 0, max: 16 })
            .define("configNUM_THREAD_LOCAL_STORAGE_POINTERS"),
        Rule::derived_default(
            "timer_task_stack_depth",
            M,
            ValueKind::UInt,
            Derivation::new(&["minimal_stack_size"], "minimal_stack_size", timer_task_stack_depth),
        )
        .constraint(Constraint::AtLeast { min: 16 })
        .define("configTIMER_TASK_STACK_DEPTH")
        .doc("Timer service task stack, in words"),
        Rule::uint("command_int_max_output_size", M, 0)
            .define("configCOMMAND_INT_MAX_OUTPUT_SIZE")
            .doc("Output buffer of the command interpreter, in bytes"),
    ]
}

fn interrupt() -> Vec<Rule> {
    use Category::Interrupt as I;
    vec![
        Rule::uint("prio_bits", I, 3)
            .constraint(Constraint::Below { limit: 8 })
            .define("configPRIO_BITS")
            .doc("Implemented interrupt priority bits"),
        Rule::uint("library_lowest_interrupt_priority", I, 0x07)
            .constraint(Constraint::Range { min: 0, max: 255 })
            .define("configLIBRARY_LOWEST_INTERRUPT_PRIORITY"),
        Rule::uint("library_max_syscall_interrupt_priority", I, 5)
            .constraint(Constraint::Range { min: 0, max: 255 })
            .define("configLIBRARY_MAX_SYSCALL_INTERRUPT_PRIORITY")
            .doc("Highest priority an ISR calling kernel APIs may have"),
        Rule::derived(
            "kernel_interrupt_priority",
            I,
            ValueKind::UInt,
            Derivation::new(
                &["library_lowest_interrupt_priority", "prio_bits"],
                "library_lowest_interrupt_priority << (8 - prio_bits)",
                kernel_interrupt_priority,
            ),
        )
        .constraint(Constraint::Range { min: 0, max: 255 })
        .define("configKERNEL_INTERRUPT_PRIORITY"),
        Rule::derived(
            "max_syscall_interrupt_priority",
            I,
            ValueKind::UInt,
            Derivation::new(
                &["library_max_syscall_interrupt_priority", "prio_bits"],
                "library_max_syscall_interrupt_priority << (8 - prio_bits)",
                max_syscall_interrupt_priority,
            ),
        )
        .constraint(Constraint::Range { min: 0, max: 255 })
        .define("configMAX_SYSCALL_INTERRUPT_PRIORITY"),
    ]
}

fn feature() -> Vec<Rule> {
    use Category::Feature as F;
    vec![
        Rule::flag("use_mutexes", F, true).define("configUSE_MUTEXES"),
        Rule::flag("use_recursive_mutexes", F, false).define("configUSE_RECURSIVE_MUTEXES"),
        Rule::flag("use_counting_semaphores", F, false).define("configUSE_COUNTING_SEMAPHORES"),
        Rule::flag("use_task_notifications", F, true).define("configUSE_TASK_NOTIFICATIONS"),
        Rule::flag("use_queue_sets", F, false).define("configUSE_QUEUE_SETS"),
        Rule::flag("use_co_routines", F, false).define("configUSE_CO_ROUTINES"),
        Rule::uint("max_co_routine_priorities", F, 2)
            .constraint(Constraint::Range { min: 1, max: 32 })
            .define("configMAX_CO_ROUTINE_PRIORITIES"),
        Rule::flag("use_timers", F, false)
            .define("configUSE_TIMERS")
            .doc("Software timers and the timer service task"),
        Rule::uint("timer_task_priority", F, 3).define("configTIMER_TASK_PRIORITY"),
        Rule::uint("timer_queue_length", F, 5)
            .constraint(Constraint::AtLeast { min: 1 })
            .define("configTIMER_QUEUE_LENGTH"),
        Rule::flag("use_newlib_reentrant", F, false).define("configUSE_NEWLIB_REENTRANT"),
        Rule::flag("use_posix_errno", F, false)
            .define("configUSE_POSIX_ERRNO")
            .doc("Per-task errno in the task control block"),
        Rule::flag("use_alternative_api", F, false).define("configUSE_ALTERNATIVE_API"),
        Rule::flag("use_application_task_tag", F, false).define("configUSE_APPLICATION_TASK_TAG"),
        Rule::flag("use_idle_hook", F, false).define("configUSE_IDLE_HOOK"),
        Rule::flag("use_tick_hook", F, false).define("configUSE_TICK_HOOK"),
        Rule::flag("use_malloc_failed_hook", F, false).define("configUSE_MALLOC_FAILED_HOOK"),
        Rule::flag("use_daemon_task_startup_hook", F, false)
            .define("configUSE_DAEMON_TASK_STARTUP_HOOK"),
        Rule::flag("include_v_task_delay", F, true).define("INCLUDE_vTaskDelay"),
        Rule::flag("include_x_task_get_current_task_handle", F, true)
            .define("INCLUDE_xTaskGetCurrentTaskHandle"),
        Rule::flag("include_v_task_delete", F, false).define("INCLUDE_vTaskDelete"),
        Rule::flag("include_v_task_delay_until", F, false).define("INCLUDE_vTaskDelayUntil"),
        Rule::flag("include_v_task_priority_set", F, false).define("INCLUDE_vTaskPrioritySet"),
        Rule::flag("include_ux_task_priority_get", F, false).define("INCLUDE_uxTaskPriorityGet"),
        Rule::flag("include_e_task_get_state", F, false).define("INCLUDE_eTaskGetState"),
        Rule::flag("include_v_task_suspend", F, false).define("INCLUDE_vTaskSuspend"),
        Rule::flag("include_ux_task_get_stack_high_water_mark", F, false)
            .define("INCLUDE_uxTaskGetStackHighWaterMark"),
        Rule::flag("include_heap_free_size", F, false).define("INCLUDE_HeapFreeSize"),
    ]
}

fn diagnostic() -> Vec<Rule> {
    use Category::Diagnostic as D;
    vec![
        Rule::uint("check_for_stack_overflow", D, 0)
            .constraint(Constraint::OneOf { values: &[0, 1, 2] })
            .define("configCHECK_FOR_STACK_OVERFLOW")
            .doc("Stack overflow detection method (0 = off)"),
        Rule::uint("queue_registry_size", D, 0).define("configQUEUE_REGISTRY_SIZE"),
        Rule::flag("use_trace_facility", D, false).define("configUSE_TRACE_FACILITY"),
        Rule::flag("generate_run_time_stats", D, false).define("configGENERATE_RUN_TIME_STATS"),
        Rule::flag("use_stats_formatting_functions", D, false)
            .define("configUSE_STATS_FORMATTING_FUNCTIONS"),
    ]
}

fn trustzone() -> Vec<Rule> {
    use Category::TrustZone as T;
    vec![
        Rule::choice("trustzone_mode", T, MODE_NAMES, "non-secure-only")
            .define("configRUN_FREERTOS_SECURE_ONLY")
            .doc("secure-only, trustzone-enabled or non-secure-only"),
        Rule::flag("trustzone_enabled", T, false).define("configENABLE_TRUSTZONE"),
        Rule::flag("enable_mpu", T, false).define("configENABLE_MPU"),
        Rule::flag("enable_fpu", T, true).define("configENABLE_FPU"),
        Rule::uint("minimal_secure_stack_size", T, 1024)
            .constraint(Constraint::AtLeast { min: 128 })
            .define("configMINIMAL_SECURE_STACK_SIZE"),
    ]
}

/// Every kernel rule, grouped by category in declaration order.
pub fn all() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(scheduler());
    rules.extend(memory());
    rules.extend(interrupt());
    rules.extend(feature());
    rules.extend(diagnostic());
    rules.extend(trustzone());
    rules
}
