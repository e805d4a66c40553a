pub type SessionId = u64;
pub type StreamId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedKind {
    /// Structured tool-call deltas keyed by slot index.
    Delta,
    /// Free text carrying fenced instruction blocks.
    Text,
}
