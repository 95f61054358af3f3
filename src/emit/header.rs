//! C header rendering.

use kcfg_resolver::{ResolvedConfig, RuleTable};

use super::defines::defines;
use crate::kernel::SCHEMA_ID;

/// Include guard of the generated header.
pub const HEADER_GUARD: &str = "KCFG_FREERTOS_CONFIG_H";

/// Allocator source the kernel build compiles, e.g. `heap_4.c`.
pub fn heap_source(resolved: &ResolvedConfig) -> Option<String> {
    resolved
        .get_choice("heap_scheme")
        .map(|scheme| format!("{}.c", scheme))
}

/// Render a guarded header with one `#define` per emitted key, grouped by
/// category.
pub fn render(resolved: &ResolvedConfig, rules: &RuleTable) -> String {
    let defines = defines(resolved, rules);
    let width = defines.iter().map(|d| d.name.len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("/* Generated by kcfg ({}). Do not edit. */\n", SCHEMA_ID));
    out.push_str(&format!("#ifndef {}\n", HEADER_GUARD));
    out.push_str(&format!("#define {}\n", HEADER_GUARD));
    if let Some(source) = heap_source(resolved) {
        out.push_str(&format!("\n/* Kernel heap: {} */\n", source));
    }

    let mut current = None;
    for define in &defines {
        if current != Some(define.category) {
            out.push_str(&format!("\n/* {} */\n", define.category));
            current = Some(define.category);
        }
        out.push_str(&format!(
            "#define {:<width$} {}\n",
            define.name,
            define.value,
            width = width
        ));
    }

    out.push_str(&format!("\n#endif /* {} */\n", HEADER_GUARD));
    out
}
