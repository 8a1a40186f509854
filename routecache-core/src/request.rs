//! Read access to an incoming request.

use crate::Params;

/// The parts of a request the caching pipeline reads.
///
/// Protocol crates implement this over their own request type. Parameter
/// accessors return empty mappings when the request has none.
pub trait RequestContext: Send + Sync {
    /// Name of the route matched for this request, if any.
    fn route(&self) -> Option<&str>;

    /// Handler reference (`Type::method`) the router dispatched to.
    fn handler(&self) -> Option<&str>;

    /// Parameters captured from the route path.
    fn route_params(&self) -> &Params;

    /// Query string parameters.
    fn query_params(&self) -> &Params;

    /// Body parameters (form fields or a JSON object).
    fn body_params(&self) -> &Params;

    /// Value of header `name`, looked up case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// `false` for sub-requests issued while serving another request.
    fn is_main_request(&self) -> bool {
        true
    }
}
