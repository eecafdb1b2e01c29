pub mod reverse;

pub use reverse::ReverseRewriter;
