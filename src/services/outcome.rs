use std::fmt;

/// Terminal state of one cache-aside request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    HitReturned,
    MissResolvedAndStored,
    /// The upstream answer is returned even though it could not be cached.
    MissResolvedStoreFailed,
    SavedAck,
}

impl CacheOutcome {
    #[must_use]
    pub const fn from_write(stored: bool) -> Self {
        if stored {
            Self::MissResolvedAndStored
        } else {
            Self::MissResolvedStoreFailed
        }
    }

    #[must_use]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::HitReturned)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HitReturned => "hit_returned",
            Self::MissResolvedAndStored => "miss_resolved_and_stored",
            Self::MissResolvedStoreFailed => "miss_resolved_store_failed",
            Self::SavedAck => "saved_ack",
        }
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service result together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub outcome: CacheOutcome,
}

impl<T> Resolved<T> {
    #[must_use]
    pub const fn new(value: T, outcome: CacheOutcome) -> Self {
        Self { value, outcome }
    }
}
