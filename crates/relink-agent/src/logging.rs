use tracing_subscriber::EnvFilter;

/// Console and tracing bring-up.
///
/// The host is a GUI process with no console of its own, so one is
/// allocated for the agent's output. Initialization is idempotent; a
/// second attach event must not panic the loader thread.
pub fn init() {
    use windows::Win32::System::Console::AllocConsole;

    // SAFETY: allocating a console for the current process has no
    // preconditions; failure (e.g. a console already exists) is fine.
    unsafe {
        let _ = AllocConsole();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relink=info,relink_agent=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
