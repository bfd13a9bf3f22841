//! Context backends.
//!
//! Every backend implements [`GlContextBackend`]; the dispatch layer never
//! branches on which one is active. Current-ness is tracked per context in
//! a process-wide table so that a context current on one thread cannot be
//! made current on another: the binding fails instead of being silently
//! reassigned.

pub(crate) mod null;
#[cfg(feature = "osmesa")]
pub(crate) mod osmesa;

use std::cell::Cell;
use std::collections::HashMap;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

use once_cell::sync::Lazy;

use crate::config::{Api, ClientApi, PixelFormat, Profile, Robustness};
use crate::error::{Error, ErrorKind, Result};

/// Uniform operation set every context backend provides.
pub(crate) trait GlContextBackend {
    fn api(&self) -> Api;
    fn version(&self) -> (u8, u8);
    fn profile(&self) -> Option<Profile>;
    fn robustness(&self) -> Robustness;
    fn forward_compat(&self) -> bool;
    fn debug(&self) -> bool;
    fn pixel_format(&self) -> &PixelFormat;

    fn make_current(&mut self) -> Result<()>;
    fn make_not_current(&mut self) -> Result<()>;
    fn swap_buffers(&mut self) -> Result<()>;
    fn set_swap_interval(&mut self, interval: i32) -> Result<()>;
    fn swap_interval(&self) -> i32;
    fn get_proc_address(&self, symbol: &str) -> *const c_void;
    fn extension_supported(&self, extension: &str) -> bool;

    /// Follows framebuffer resizes of the owning window.
    fn resize(&mut self, width: u32, height: u32);

    /// The rendered color buffer of software backends, row-major RGBA.
    /// `None` on backends that present to a native surface.
    fn color_buffer(&self) -> Option<&[u32]>;
}

/// A context owned by a window, tagged with its process-unique identity.
pub(crate) struct WindowContext {
    pub id: u64,
    /// Contexts sharing GL object namespaces carry the same group id.
    pub share_group: u64,
    pub backend: Box<dyn GlContextBackend>,
}

impl WindowContext {
    pub fn new(backend: Box<dyn GlContextBackend>, share_group: Option<u64>) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self { id, share_group: share_group.unwrap_or(id), backend }
    }

    pub fn client_api(&self) -> ClientApi {
        match self.backend.api() {
            Api::OpenGl => ClientApi::OpenGl,
            Api::OpenGlEs => ClientApi::OpenGlEs,
        }
    }
}

impl Drop for WindowContext {
    fn drop(&mut self) {
        forget(self.id);
    }
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Which thread, if any, each live context is current on.
static CURRENT_THREADS: Lazy<Mutex<HashMap<u64, ThreadId>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

thread_local! {
    static CURRENT_ON_THREAD: Cell<Option<u64>> = const { Cell::new(None) };
}

fn table() -> std::sync::MutexGuard<'static, HashMap<u64, ThreadId>> {
    CURRENT_THREADS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records `id` as current on the calling thread, releasing whatever was
/// current here before. Fails if another thread holds the context.
pub(crate) fn bind(id: u64) -> Result<()> {
    let mut current = table();
    let me = thread::current().id();

    if let Some(holder) = current.get(&id) {
        if *holder != me {
            return Err(Error::new(
                ErrorKind::PlatformError,
                "the context is already current on another thread",
            ));
        }
    }

    if let Some(previous) = CURRENT_ON_THREAD.with(|cell| cell.replace(Some(id))) {
        if previous != id {
            current.remove(&previous);
        }
    }
    current.insert(id, me);
    Ok(())
}

/// Detaches whatever context is current on the calling thread. Returns the
/// detached context id, if any.
pub(crate) fn unbind() -> Option<u64> {
    let previous = CURRENT_ON_THREAD.with(|cell| cell.take());
    if let Some(id) = previous {
        table().remove(&id);
    }
    previous
}

/// Drops all record of a context, wherever it was current. Used on context
/// destruction.
pub(crate) fn forget(id: u64) {
    table().remove(&id);
    CURRENT_ON_THREAD.with(|cell| {
        if cell.get() == Some(id) {
            cell.set(None);
        }
    });
}

/// The context current on the calling thread.
pub(crate) fn current() -> Option<u64> {
    let id = CURRENT_ON_THREAD.with(|cell| cell.get())?;
    // The cell can lag behind if the context was destroyed on another
    // thread; trust the table.
    table().contains_key(&id).then_some(id)
}
