use std::fmt;

/// Signed reference into an [`Arena`](crate::Arena).
///
/// The sign is the success channel: `>= 0` is a live value, `< 0` a fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(i32);

impl Handle {
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn is_fault(self) -> bool {
        self.0 < 0
    }

    pub const fn is_live(self) -> bool {
        self.0 >= 0
    }
}

impl From<i32> for Handle {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<Handle> for i32 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
