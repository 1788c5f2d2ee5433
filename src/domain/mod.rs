mod category;
mod clock;
mod money;
mod rollup;
mod transaction;

pub use category::*;
pub use clock::*;
pub use money::*;
pub use rollup::*;
pub use transaction::*;
