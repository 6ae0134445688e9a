pub mod amount;
pub mod complaint;
pub mod notification;
pub mod qr;
pub mod redeem;
pub mod response;
pub mod transaction;
pub mod user;

pub use amount::*;
pub use complaint::*;
pub use notification::*;
pub use qr::*;
pub use redeem::*;
pub use response::*;
pub use transaction::*;
pub use user::*;
