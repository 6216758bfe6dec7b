//! Routing and payload adaptation.

pub mod adapt;
pub mod router;

pub use adapt::{adapt_row, StoryRecord};
pub use router::ContentRouter;
