//! Localised edits over a single mutable source buffer.
//!
//! Call rewriting is expressed as a list of `(start, end, replacement)`
//! edits with non-overlapping spans, collected in authoring order and
//! applied back-to-front so earlier offsets stay valid. Edits that share an
//! anchor position keep their authoring order in the output.

/// One source edit. A zero-width span is an insertion.
#[derive(Debug, Clone)]
pub struct Edit {
    pub start: u32,
    pub end: u32,
    pub text: String,
    /// Authoring order, used to keep same-anchor edits stable.
    index: u32,
}

/// Collects edits for one file.
#[derive(Debug, Default)]
pub struct EditBuffer {
    edits: Vec<Edit>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Insert `text` at `pos`.
    #[inline]
    pub fn insert(&mut self, pos: u32, text: impl Into<String>) {
        self.replace(pos, pos, text);
    }

    /// Replace the span `start..end` with `text`.
    #[inline]
    pub fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        debug_assert!(start <= end);
        let index = self.edits.len() as u32;
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
            index,
        });
    }

    /// Sort edits into ascending span order, same-anchor edits in authoring
    /// order. Spans must not overlap.
    pub fn into_sorted(mut self) -> Vec<Edit> {
        self.edits
            .sort_by(|a, b| (a.start, a.index).cmp(&(b.start, b.index)));
        debug_assert!(
            self.edits.windows(2).all(|w| w[0].end <= w[1].start),
            "rewrite edits must not overlap"
        );
        self.edits
    }
}

/// Apply sorted edits to `source`, producing the rewritten text.
///
/// Application walks back-to-front so offsets of pending edits stay valid;
/// with same-anchor edits sorted by authoring order, the reverse walk lands
/// them in authoring order in the output.
pub fn apply(source: &str, edits: &[Edit]) -> String {
    let mut output = source.to_string();
    for edit in edits.iter().rev() {
        output.replace_range(edit.start as usize..edit.end as usize, &edit.text);
    }
    output
}
