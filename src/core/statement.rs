/// Statement Handle Module
///
/// A `StatementHandle` owns exactly one native prepared-statement or
/// result-set object, type-erased so the portable layer never depends on a
/// concrete driver. Drivers recover their native object with the checked
/// downcast accessors; a wrong type or a freed handle is a `DriverBug`, not
/// a portable database error.
use std::any::Any;

use tracing::debug;

use crate::core::error::DriverBug;

type ReleaseFn = Box<dyn FnOnce(Box<dyn Any>)>;

/// Owns a native statement/result object plus an optional release callback.
///
/// A handle is either live (native object present) or freed. Every accessor
/// on a freed handle fails with `DriverBug::NoStatement`, and freeing twice
/// is an error as well.
pub struct StatementHandle {
    native: Option<Box<dyn Any>>,
    release: Option<ReleaseFn>,
    type_name: &'static str,
}

impl StatementHandle {
    /// Wraps a native statement object.
    pub fn new<T: Any>(native: T) -> Self {
        StatementHandle {
            native: Some(Box::new(native)),
            release: None,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wraps a native statement object with a release callback that runs
    /// exactly once when the handle is freed.
    pub fn with_release<T: Any>(native: T, release: impl FnOnce(Box<dyn Any>) + 'static) -> Self {
        StatementHandle {
            native: Some(Box::new(native)),
            release: Some(Box::new(release)),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether the native object is still present.
    pub fn is_live(&self) -> bool {
        self.native.is_some()
    }

    /// Name of the native type this handle was created with.
    pub fn native_type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the native object, checking the handle is live and of the
    /// expected type.
    pub fn native_ref<T: Any>(&self) -> Result<&T, DriverBug> {
        let boxed = self.native.as_ref().ok_or(DriverBug::NoStatement)?;
        boxed
            .downcast_ref::<T>()
            .ok_or(DriverBug::WrongStatementType {
                expected: std::any::type_name::<T>(),
                actual: self.type_name,
            })
    }

    /// Mutably borrows the native object with the same checks as
    /// [`StatementHandle::native_ref`].
    pub fn native_mut<T: Any>(&mut self) -> Result<&mut T, DriverBug> {
        let type_name = self.type_name;
        let boxed = self.native.as_mut().ok_or(DriverBug::NoStatement)?;
        boxed.downcast_mut::<T>().ok_or(DriverBug::WrongStatementType {
            expected: std::any::type_name::<T>(),
            actual: type_name,
        })
    }

    /// Releases the native object, running the release callback if one was
    /// registered. A second free fails with `DriverBug::NoStatement`.
    pub fn free(&mut self) -> Result<(), DriverBug> {
        let native = self.native.take().ok_or(DriverBug::NoStatement)?;
        debug!(native = self.type_name, "freeing statement handle");
        if let Some(release) = self.release.take() {
            release(native);
        }
        Ok(())
    }
}

impl std::fmt::Debug for StatementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementHandle")
            .field("live", &self.is_live())
            .field("native", &self.type_name)
            .finish()
    }
}
