//! Composed print document

/// Ordered, immutable sequence of ESC/POS command segments
///
/// Produced once by [`EscPosBuilder::build`](crate::EscPosBuilder::build).
/// Segments are concatenated in emission order before transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposedDocument {
    segments: Vec<Vec<u8>>,
}

impl ComposedDocument {
    pub(crate) fn from_segments(segments: Vec<Vec<u8>>) -> Self {
        Self { segments }
    }

    /// Command segments in emission order
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Total payload size in bytes
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate all segments into the transport payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.segments.concat()
    }
}
