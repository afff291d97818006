//! Index abstractions: terms, postings, segment readers and an in-memory index.

pub mod memory;
pub mod min_frequency;
pub mod posting;
pub mod reader;
pub mod term;
pub mod term_states;

pub use memory::{MemoryIndex, MemoryIndexBuilder, Token};
pub use min_frequency::MinFrequencyPostingIterator;
pub use posting::{NO_MORE_DOCS, PostingFlags, PostingIterator, TermPosition};
pub use reader::{IndexOptions, IndexSnapshot, SegmentReader, SnapshotId};
pub use term::Term;
pub use term_states::TermStates;
