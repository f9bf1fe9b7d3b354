//! Chaos/failpoint hooks (feature: `failpoints`).
//!
//! Keep this extremely light: the macro expands to nothing unless the feature
//! is enabled. When enabled, a point panics if its name is listed in the
//! comma-separated `AGGBY_FAILPOINTS` environment variable.

#[cfg(feature = "failpoints")]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {{
        let armed = std::env::var("AGGBY_FAILPOINTS")
            .map(|v| v.split(',').any(|p| p.trim() == $name))
            .unwrap_or(false);
        if armed {
            panic!("failpoint triggered: {}", $name);
        }
    }};
}

#[cfg(not(feature = "failpoints"))]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {
        // no-op
        let _ = $name;
    };
}
