use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::bits::Bits;
use crate::error::SimError;

/// A named wire carrying one [`Bits`] value.
///
/// Cloning a signal clones the handle, not the wire: every clone observes the
/// same value. Readers always receive a copy. A signal starts unbound (width
/// 0); its width is fixed by the first reset or, failing that, by the first
/// write, and only a later reset may change it.
#[derive(Clone)]
pub struct Signal(Arc<Wire>);

struct Wire {
    name: String,
    value: RwLock<Bits>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, Bits::zero(0))
    }

    /// A signal holding a fixed value, e.g. a constant wire.
    pub fn with_value(name: impl Into<String>, value: Bits) -> Self {
        Self(Arc::new(Wire {
            name: name.into(),
            value: RwLock::new(value),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn get(&self) -> Bits {
        *self.0.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn width(&self) -> u8 {
        self.get().width()
    }

    pub fn is_bound(&self) -> bool {
        self.width() > 0
    }

    /// Publish a new value. The width must match the bound width.
    pub fn drive(&self, value: Bits) -> Result<(), SimError> {
        let mut cur = self.0.value.write().unwrap_or_else(PoisonError::into_inner);
        if cur.width() != 0 && cur.width() != value.width() {
            return Err(SimError::WidthMismatch {
                signal: self.0.name.clone(),
                expected: cur.width(),
                found: value.width(),
            });
        }
        *cur = value;
        Ok(())
    }

    /// Rebind to `width` and zero the value.
    pub fn reset(&self, width: u8) {
        *self.0.value.write().unwrap_or_else(PoisonError::into_inner) = Bits::zero(width);
    }

    /// Whether both handles refer to the same wire.
    pub fn same_wire(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the wire, stable for its lifetime.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}", self.name(), self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_binding() {
        let s = Signal::new("w");
        assert!(!s.is_bound());
        s.drive(Bits::from_u32(3, 4)).unwrap();
        assert_eq!(s.width(), 4);
        let err = s.drive(Bits::from_u32(3, 8)).unwrap_err();
        assert!(matches!(err, SimError::WidthMismatch { expected: 4, found: 8, .. }));
        // value untouched by the rejected write
        assert_eq!(s.get().as_u32(), 3);
        s.reset(8);
        s.drive(Bits::from_u32(0xff, 8)).unwrap();
        assert_eq!(s.get().as_u32(), 0xff);
    }

    #[test]
    fn test_shared_handle() {
        let a = Signal::with_value("c", Bits::from_u32(4, 32));
        let b = a.clone();
        assert!(a.same_wire(&b));
        b.drive(Bits::from_u32(8, 32)).unwrap();
        assert_eq!(a.get().as_u32(), 8);
        assert!(!a.same_wire(&Signal::new("c")));
    }
}
