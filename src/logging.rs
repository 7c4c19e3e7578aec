//! Logger setup.  Android routes `log` records to logcat; every other target
//! uses env_logger (`RUST_LOG`, default `info`).

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the platform logger.  Safe to call more than once; only the first
/// call has an effect.
pub fn init_logging() {
    INIT.call_once(|| {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("webpush_core"),
        );

        #[cfg(not(target_os = "android"))]
        if env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()
            .is_err()
        {
            log::debug!("[webpush] global logger already installed by host");
        }

        log::debug!("[webpush] logging initialised");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging();
        init_logging();
    }
}
