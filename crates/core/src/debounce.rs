/// Trailing-edge debouncer state for one entry point.
///
/// Every call replaces the pending value and hands out a new ticket. The
/// caller arms a timer per ticket; only the timer holding the latest
/// ticket gets the value, so a burst collapses into its last call.
#[derive(Debug)]
pub(crate) struct Debouncer<T> {
    ticket: u64,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            ticket: 0,
            pending: None,
        }
    }

    /// Records a call and returns the ticket its timer must present.
    pub fn push(&mut self, value: T) -> u64 {
        if self.pending.is_some() {
            debug!("collapsing a call into the pending one");
        }
        self.ticket += 1;
        self.pending = Some(value);
        self.ticket
    }

    /// Takes the pending value if `ticket` belongs to the latest call.
    pub fn fire(&mut self, ticket: u64) -> Option<T> {
        if ticket != self.ticket {
            return None;
        }
        self.pending.take()
    }
}
