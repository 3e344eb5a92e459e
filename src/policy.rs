/// What an `Observable` does when one of its listeners panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the panic and keep notifying the remaining listeners.
    #[default]
    Isolate,
    /// Stop the notification round, drop queued notifications and resume the
    /// panic in the writer. Values already written stay assigned.
    Propagate,
}
