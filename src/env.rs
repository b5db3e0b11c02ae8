//! Environment overrides for kernel selection.
//!
//! Every env read goes through these helpers so truthy parsing lives in one
//! place. Values are read once per process.

use std::sync::OnceLock;

pub(crate) const FORCE_SCALAR_VAR: &str = "VPXDSP_FORCE_SCALAR";
pub(crate) const CPU_LEVEL_VAR: &str = "VPXDSP_CPU_LEVEL";

/// `true` when the variable holds `1`, `true`, `yes` or `on`
/// (case-insensitive, trimmed).
#[inline]
pub(crate) fn env_var_truthy(var_name: &str) -> bool {
    std::env::var(var_name)
        .map(|raw| is_truthy(&raw))
        .unwrap_or(false)
}

fn is_truthy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// Trimmed, non-empty value of the variable.
#[inline]
pub(crate) fn env_var_nonempty(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|value| !value.is_empty())
}

macro_rules! define_env_flag {
    (enabled_when($fn_name:ident, $var:expr)) => {
        #[inline]
        pub(crate) fn $fn_name() -> bool {
            static VALUE: OnceLock<bool> = OnceLock::new();
            *VALUE.get_or_init(|| env_var_truthy($var))
        }
    };
}

define_env_flag!(enabled_when(force_scalar, FORCE_SCALAR_VAR));

/// Raw `VPXDSP_CPU_LEVEL` value; parsing happens in the settings layer.
pub(crate) fn cpu_level_override() -> Option<&'static str> {
    static VALUE: OnceLock<Option<String>> = OnceLock::new();
    VALUE
        .get_or_init(|| env_var_nonempty(CPU_LEVEL_VAR))
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for raw in ["1", "true", " YES ", "On"] {
            assert!(is_truthy(raw), "{raw:?}");
        }
        for raw in ["", "0", "false", "off", "2", "y"] {
            assert!(!is_truthy(raw), "{raw:?}");
        }
    }

    #[test]
    fn unset_variable_is_falsey() {
        assert!(!env_var_truthy("VPXDSP_TEST_SURELY_UNSET_VARIABLE"));
        assert_eq!(env_var_nonempty("VPXDSP_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
