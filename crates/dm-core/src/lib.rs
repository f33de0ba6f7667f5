pub mod assembler;
pub mod cache;
pub mod chunked;
pub mod error;
pub mod locale;
pub mod paths;

#[cfg(test)]
mod tests;

pub use assembler::{ContentAssembler, LoadState};
pub use cache::FetchCache;
pub use chunked::{ChunkedCollection, ChunkedLoader, CollectionLoad, IndexKind, chunks_needed};
pub use error::AssemblyError;
pub use locale::LocaleResolver;
