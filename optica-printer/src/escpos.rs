//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.

use crate::document::ComposedDocument;
use crate::encoding::{CODE_PAGE_WPC1252, encode_latin};

/// ESC/POS command builder
///
/// Every call appends one command segment. Text is encoded to Windows-1252
/// as it is appended, so the built document is ready for transport.
pub struct EscPosBuilder {
    segments: Vec<Vec<u8>>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut segments = Vec::with_capacity(64);
        // Initialize printer (ESC @)
        segments.push(vec![0x1B, 0x40]);
        // Select WPC1252 code page (ESC t n)
        segments.push(vec![0x1B, 0x74, CODE_PAGE_WPC1252]);
        Self { segments, width }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    fn push(&mut self, bytes: &[u8]) -> &mut Self {
        self.segments.push(bytes.to_vec());
        self
    }

    // === Text Output ===

    /// Write raw text (encoded to the printer code page)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.segments.push(encode_latin(s));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        let mut bytes = encode_latin(s);
        bytes.push(b'\n');
        self.segments.push(bytes);
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.push(b"\n")
    }

    /// Write multiple empty lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n - Print and feed n lines
        self.push(&[0x1B, 0x64, lines])
    }

    // === Alignment ===

    /// Align text to center
    pub fn center(&mut self) -> &mut Self {
        self.push(&[0x1B, 0x61, 0x01])
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.push(&[0x1B, 0x61, 0x00])
    }

    /// Align text to right
    pub fn right(&mut self) -> &mut Self {
        self.push(&[0x1B, 0x61, 0x02])
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.push(&[0x1B, 0x45, 0x01])
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.push(&[0x1B, 0x45, 0x00])
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.push(&[0x1D, 0x21, 0x11])
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.push(&[0x1D, 0x21, 0x00])
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Paper Control ===

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        // GS V 0 - Full cut
        self.push(&[0x1D, 0x56, 0x00])
    }

    // === Build ===

    /// Freeze the accumulated segments into a document
    pub fn build(self) -> ComposedDocument {
        ComposedDocument::from_segments(self.segments)
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(32)
    }
}
