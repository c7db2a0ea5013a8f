//! Bound flash devices
//!
//! [`bind`] and [`probe`] match a device identifier against the registry
//! and return a [`FlashHandle`] carrying the read path, write engine and
//! erase engine. [`FlashDevice`] abstracts a handle for generic callers.

mod binder;
mod device;
mod handle;

pub use binder::{bind, probe};
pub use device::FlashDevice;
#[cfg(feature = "alloc")]
pub use device::FlashDeviceExt;
pub use handle::FlashHandle;
