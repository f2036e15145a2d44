//! The fixed stage graphs of the two orchestrators.

use std::fmt;

/// Ingestion states, in order. Each transition is one fallible stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IngestStage {
    Received,
    Converted,
    Cleaned,
    Chunked,
    Embedded,
    Written,
}

impl IngestStage {
    pub const ALL: [IngestStage; 6] = [Self::Received, Self::Converted, Self::Cleaned, Self::Chunked, Self::Embedded, Self::Written];

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Converted),
            Self::Converted => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Chunked),
            Self::Chunked => Some(Self::Embedded),
            Self::Embedded => Some(Self::Written),
            Self::Written => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Converted => "converted",
            Self::Cleaned => "cleaned",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Written => "written",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Query-path nodes. Edges are given by [`QueryStage::inputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStage {
    EmbedQuestion,
    VectorRetrieve,
    KeywordRetrieve,
    Fuse,
    Assemble,
    Generate,
}

impl QueryStage {
    pub const ALL: [QueryStage; 6] = [Self::EmbedQuestion, Self::VectorRetrieve, Self::KeywordRetrieve, Self::Fuse, Self::Assemble, Self::Generate];

    /// Stages whose output this stage consumes.
    pub fn inputs(self) -> &'static [QueryStage] {
        match self {
            Self::EmbedQuestion | Self::KeywordRetrieve => &[],
            Self::VectorRetrieve => &[Self::EmbedQuestion],
            Self::Fuse => &[Self::VectorRetrieve, Self::KeywordRetrieve],
            Self::Assemble => &[Self::Fuse],
            Self::Generate => &[Self::Assemble],
        }
    }

    /// True if `self` transitively consumes the output of `other`.
    pub fn depends_on(self, other: QueryStage) -> bool {
        self.inputs().iter().any(|&input| input == other || input.depends_on(other))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmbedQuestion => "embed_question",
            Self::VectorRetrieve => "vector_retrieve",
            Self::KeywordRetrieve => "keyword_retrieve",
            Self::Fuse => "fuse",
            Self::Assemble => "assemble",
            Self::Generate => "generate",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_stages_form_a_chain() {
        let mut stage = IngestStage::Received;
        let mut walked = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            walked.push(next);
            stage = next;
        }
        assert_eq!(walked, IngestStage::ALL.to_vec());
    }

    #[test]
    fn retrieval_branches_are_independent() {
        use QueryStage::*;
        assert!(!KeywordRetrieve.depends_on(EmbedQuestion));
        assert!(!KeywordRetrieve.depends_on(VectorRetrieve));
        assert!(!VectorRetrieve.depends_on(KeywordRetrieve));
        assert!(Fuse.depends_on(EmbedQuestion));
        assert!(Generate.depends_on(KeywordRetrieve));
        assert!(QueryStage::ALL.iter().all(|s| !s.depends_on(*s)), "graph must be acyclic");
    }
}
