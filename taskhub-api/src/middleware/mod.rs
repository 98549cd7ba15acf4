/// Middleware modules for the API server
///
/// - `deadline`: per-request deadline that answers with a JSON `timeout` error
///
/// The authentication gate lives in `taskhub_shared::auth::middleware` and is attached
/// per route group in `app::build_router`.

pub mod deadline;
