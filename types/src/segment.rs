/// One rendering unit of a word-level diff.
///
/// Text always comes from the revised side. A deletion has no revised text,
/// so it is represented by an empty `Changed` placeholder that renders as
/// nothing but still marks where the original lost words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Unchanged(String),
    Changed(String),
}

impl Segment {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Unchanged(text) | Self::Changed(text) => text,
        }
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    /// `true` for the empty `Changed` segment emitted for a pure deletion.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Changed(text) if text.is_empty())
    }
}

/// Rebuild the revised text from its segments.
///
/// Segments are joined with single spaces; deletion placeholders contribute
/// nothing.
#[must_use]
pub fn reconstruct(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
