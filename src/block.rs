// Block views are split by role: the immutable block snapshot, the per-envelope
// projection, and the forward-only cursor over it.

pub mod cursor;
pub mod transaction;
pub mod view;

pub use cursor::*;
pub use transaction::*;
pub use view::*;
