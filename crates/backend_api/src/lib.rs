pub mod render;
pub mod router;
pub mod server;

pub use render::render_page;
pub use router::create_router;
pub use server::run_server;
