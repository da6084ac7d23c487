use core::alloc::Layout;
use core::fmt;

/// The error type for fallible growth (`try_reserve`, `try_insert`).
///
/// When one of these is returned the container is left exactly as it was
/// before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TryReserveError {
    /// The requested number of slots overflows `usize` or the maximum
    /// allocation size.
    CapacityOverflow,

    /// The allocator refused the request.
    AllocError {
        /// The layout of the array that could not be allocated.
        layout: Layout,
    },
}

impl TryReserveError {
    /// Diverges the way the infallible growth paths do.
    #[cold]
    pub(crate) fn handle(self) -> ! {
        match self {
            TryReserveError::CapacityOverflow => panic!("capacity overflow"),
            TryReserveError::AllocError { layout } => alloc::alloc::handle_alloc_error(layout),
        }
    }
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")?;
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str(" because the computed capacity exceeded the table's maximum")
            }
            TryReserveError::AllocError { layout } => write!(
                f,
                " because the allocator returned an error for {} bytes",
                layout.size()
            ),
        }
    }
}

impl core::error::Error for TryReserveError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_mentions_cause() {
        let overflow = TryReserveError::CapacityOverflow.to_string();
        assert!(overflow.contains("maximum"), "{overflow}");

        let layout = Layout::array::<u64>(4).unwrap();
        let alloc = TryReserveError::AllocError { layout }.to_string();
        assert!(alloc.contains("32 bytes"), "{alloc}");
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn overflow_panics_when_handled() {
        TryReserveError::CapacityOverflow.handle();
    }
}
