/// Returns `Err($error)` from the enclosing function when `$condition` fails.
///
/// Only used on construction and validation paths; kernels assert instead.
macro_rules! validate_input {
    ($condition:expr, $error:expr $(,)?) => {
        if !$condition {
            return Err($error);
        }
    };
}

pub(crate) use validate_input;
