// Process-wide runtime setup — thread pool caps for numeric libraries.
//
// Native numeric backends (OpenMP, OpenBLAS, MKL, Accelerate, numexpr) read
// these variables once, when they first spin up their pools. They must be set
// before the ONNX session is created.

use std::sync::Once;

use tracing::debug;

/// Environment variables that cap native thread pools.
pub const THREAD_CAP_VARS: [&str; 5] = [
    "OMP_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "MKL_NUM_THREADS",
    "VECLIB_MAXIMUM_THREADS",
    "NUMEXPR_NUM_THREADS",
];

static CAP_THREADS: Once = Once::new();

/// Force every native numeric thread pool down to a single thread.
///
/// Idempotent: only the first call mutates the environment.
pub fn cap_thread_pools() {
    CAP_THREADS.call_once(|| {
        for var in THREAD_CAP_VARS {
            std::env::set_var(var, "1");
        }
        debug!(vars = ?THREAD_CAP_VARS, "Capped native thread pools to 1");
    });
}
