pub mod algorithms;
pub mod cluster;
pub mod delta;
pub mod error;
pub mod nucmer;
pub mod output_format;
pub mod postnuc;
pub mod scores;
pub mod sequence;
pub mod suffix_array;
pub mod suffix_tree;
pub mod sufsort;
pub mod sw_align;

pub use algorithms::{IndexKind, MatchType, SuffixIndex, run_match_finder, to_forward_coords};
pub use cluster::{ClusterParams, cluster_matches, cluster_stream};
pub use error::{Error, IndexCheckError, Result};
pub use nucmer::{NucmerAligner, NucmerOptions, QueryAlignments};
pub use output_format::MatchFormat;
pub use scores::MatrixType;
pub use sequence::{Sequence, read_fasta};
pub use suffix_array::{Match, SparseSuffixArray};
pub use suffix_tree::SuffixTree;
pub use sw_align::{Aligner, BufferedAligner};
