//! Built-in formula functions (Rust).
//!
//! Conventions:
//! - Formula-facing built-in names are ALL CAPS (e.g. `CELL`, `ROUND`).
//! - `CELL` is the target of positional addresses; formulas never spell it
//!   directly (`$3` is rewritten to `CELL(2)`).

use rhai::{Engine, EvalAltResult, NativeCallContext, Position};
use std::sync::Arc;

use crate::engine::Computed;
use crate::engine::eval::{BatchState, resolve};

const MAX_DECIMALS: usize = 12;

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn to_usize(value: i64, label: &str) -> Result<usize, Box<EvalAltResult>> {
    usize::try_from(value).map_err(|_| invalid_arg(&format!("{} must be >= 0", label)))
}

fn to_decimal_places(value: f64) -> Result<usize, Box<EvalAltResult>> {
    if value.fract() != 0.0 || value < 0.0 {
        return Err(invalid_arg("decimals must be a whole number >= 0"));
    }
    if value > MAX_DECIMALS as f64 {
        return Err(invalid_arg(&format!(
            "decimals must be <= {}",
            MAX_DECIMALS
        )));
    }
    Ok(value as usize)
}

fn round_to(n: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (n * factor).round() / factor
}

/// Register all built-in functions into the Rhai engine.
pub(crate) fn register_builtins(engine: &mut Engine, state: Arc<BatchState>) {
    // CELL(pos): numeric value at a batch position.
    // Unresolved positions raise an error so dependents are unresolved too.
    let cell_state = state.clone();
    engine.register_fn(
        "CELL",
        move |ctx: NativeCallContext, pos: i64| -> Result<f64, Box<EvalAltResult>> {
            let pos = to_usize(pos, "position")?;
            match resolve(ctx.engine(), &cell_state, pos) {
                Computed::Number(n) => Ok(n),
                Computed::Unresolved => Err(invalid_arg(&format!(
                    "unresolved reference to position {}",
                    pos
                ))),
            }
        },
    );

    // ROUND(x, decimals). Integer literals reach builtins as floats.
    engine.register_fn(
        "ROUND",
        |n: f64, decimals: f64| -> Result<f64, Box<EvalAltResult>> {
            Ok(round_to(n, to_decimal_places(decimals)?))
        },
    );
    engine.register_fn("ROUND", |n: f64| -> f64 { n.round() });
}
