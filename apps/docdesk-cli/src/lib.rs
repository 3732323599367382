//! docdesk console: output formatting shared by the `docdesk` binary.

pub mod output;
