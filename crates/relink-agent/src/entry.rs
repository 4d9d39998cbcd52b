use std::ffi::c_void;

use tracing::{error, info};
use windows::Win32::Foundation::{BOOL, HMODULE, TRUE};
use windows::Win32::System::LibraryLoader::DisableThreadLibraryCalls;
use windows::Win32::System::SystemServices::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};

use relink::engine::InlineBackend;
use relink::resolve::ModuleBase;
use relink::{Replacements, spawn_startup};

/// Host lifecycle entry point.
///
/// The loader thread does the bare minimum: console + logging, then a
/// worker spawn. Everything that can block (config IO, patching) runs on
/// the worker, away from the loader lock.
#[unsafe(no_mangle)]
pub extern "system" fn DllMain(module: HMODULE, reason: u32, _reserved: *mut c_void) -> BOOL {
    match reason {
        DLL_PROCESS_ATTACH => on_attach(module),
        DLL_PROCESS_DETACH => on_detach(),
        _ => {}
    }
    TRUE
}

fn on_attach(module: HMODULE) {
    // SAFETY: standard for a DLL that spawns its own worker; thread
    // attach/detach notifications are not needed.
    unsafe {
        let _ = DisableThreadLibraryCalls(module);
    }

    crate::logging::init();
    info!("Agent attached");

    // The host's main image, not this DLL: hook targets live there.
    let base = match ModuleBase::current_process() {
        Ok(base) => base,
        Err(e) => {
            error!("Failed to resolve host module base: {e}");
            return;
        }
    };

    let replacements = Replacements {
        get_url: relink::get_url_thunk as usize as u64,
        set_ready_for_match: relink::set_ready_for_match_thunk as usize as u64,
    };

    // Handle intentionally dropped: the worker owns its own fate and the
    // loader thread must return immediately.
    let _ = spawn_startup(InlineBackend::new(), base, replacements);
}

fn on_detach() {
    // Hooks are not torn down: the process is going away and the logging
    // sink is the only thing worth a final word.
    info!("Agent detaching");
}
