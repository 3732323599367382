//! docdesk-hybrid
//!
//! The merge-and-rank engine: mode dispatch over the document service,
//! document ranking, passage pagination, search supersession and the
//! cancellable summary call.

pub mod dispatch;
pub mod paginate;
pub mod rank;
pub mod session;
pub mod summary;

pub use dispatch::{Dispatcher, SearchOutcome, SearchRequest};
pub use paginate::{OpenedChunk, PageFetch, PassageCursor, PassagePager};
pub use rank::RankedDoc;
pub use session::{SearchSession, SearchStatus};
pub use summary::{summarize, DocSummary, SummarySource};
