//! SFSS: the storage server half of the simulator. Speaks SFP over UDP,
//! executing each request against a root directory on the real filesystem.

mod handlers;
mod server;

pub use handlers::handle;
pub use server::{Server, ServerError};
