//! Explicit memory reclamation between benchmark iterations.
//!
//! There is no tracing collector to pause; what can add noise to timed
//! sections is the allocator returning freed pages to the OS on its own
//! schedule. In manual mode the executor switches that schedule off for the
//! run and forces the work between iterations instead.

// libmimalloc-sys does not bind this option; 15 is its value in the bundled mimalloc.h.
#[cfg(feature = "mimalloc")]
#[allow(non_upper_case_globals)]
const mi_option_purge_delay: libmimalloc_sys::mi_option_t = 15;

/// Keeps the allocator from purging freed memory on its own while alive.
///
/// Dropping it restores the previous purge delay.
#[must_use = "automatic collection resumes when the guard is dropped"]
pub struct ManualCollection {
    #[cfg(feature = "mimalloc")]
    previous_delay: std::os::raw::c_long,
}

/// Disable the allocator's automatic purging until the guard is dropped.
pub fn disable_automatic() -> ManualCollection {
    #[cfg(feature = "mimalloc")]
    {
        use libmimalloc_sys::{mi_option_get, mi_option_set};

        // SAFETY: option accessors only touch mimalloc's global settings.
        let previous_delay = unsafe { mi_option_get(mi_option_purge_delay) };
        unsafe { mi_option_set(mi_option_purge_delay, -1) };
        tracing::debug!(previous_delay, "mimalloc automatic purging disabled");
        ManualCollection { previous_delay }
    }

    #[cfg(not(feature = "mimalloc"))]
    {
        tracing::debug!("system allocator, automatic collection left as is");
        ManualCollection {}
    }
}

impl Drop for ManualCollection {
    fn drop(&mut self) {
        #[cfg(feature = "mimalloc")]
        {
            use libmimalloc_sys::mi_option_set;

            // SAFETY: see `disable_automatic`.
            unsafe { mi_option_set(mi_option_purge_delay, self.previous_delay) };
            tracing::debug!("mimalloc automatic purging restored");
        }
    }
}

/// Return freed allocator memory to the OS now.
pub fn collect() {
    #[cfg(feature = "mimalloc")]
    {
        // SAFETY: mi_collect only walks mimalloc's own heaps and takes no pointers.
        unsafe { libmimalloc_sys::mi_collect(true) };
        tracing::debug!("mimalloc heaps collected");
    }

    #[cfg(not(feature = "mimalloc"))]
    tracing::debug!("system allocator, nothing to collect");
}
