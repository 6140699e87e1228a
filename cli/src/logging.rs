use env_logger::Env;

/// Installs the stderr logger. Level defaults to `info` and follows
/// `RUST_LOG` when set (e.g. `RUST_LOG=debug` shows canceled records).
pub(crate) fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
