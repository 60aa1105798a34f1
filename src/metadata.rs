/// What a decode touched, filled in when [`DecoderConfig::metadata`](crate::DecoderConfig::metadata) is set.
///
/// Both lists are append-only: reusing the same `Metadata` across several decodes accumulates
/// entries from all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Paths of every target that was dispatched to, in traversal order.
    ///
    /// A path is recorded even when decoding into it failed.
    pub keys: Vec<String>,

    /// Path-qualified source keys that no record field consumed, in source order.
    pub unused: Vec<String>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }
}
