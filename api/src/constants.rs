//! Application constants

/// Random bytes behind every generated API token
pub const TOKEN_BYTES: usize = 32;

/// Headroom added to the request body limit above the image cap, so oversized
/// uploads reach the handler and get a 413 with a JSON body
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Multipart field carrying the uploaded image
pub const UPLOAD_FIELD: &str = "file";

/// Default number of usage records returned by the usage endpoint
pub const DEFAULT_USAGE_LIMIT: i64 = 100;

/// Maximum number of usage records returned by the usage endpoint
pub const MAX_USAGE_LIMIT: i64 = 1000;

/// Usage endpoint names recorded against tokens
pub mod endpoints {
    pub const API_CALL: &str = "api_call";
    pub const ADMIN_CALL: &str = "admin_call";
    pub const MODERATE_IMAGE: &str = "moderate_image";
}
