//! Client control over caching through a request header.

/// Header value that deletes the stored entry before the handler runs.
pub const INVALIDATE: &str = "invalidate";
/// Header value that bypasses the cache for one request.
pub const SKIP: &str = "skip";

/// What the control header asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlAction {
    /// Normal caching.
    #[default]
    None,
    /// Delete the entry, do not read it, store the fresh response.
    Invalidate,
    /// Neither read nor write the cache.
    Skip,
}

impl ControlAction {
    /// Returns `true` if the cache must not be read for this request.
    pub fn bypasses_read(&self) -> bool {
        matches!(self, ControlAction::Invalidate | ControlAction::Skip)
    }

    /// Returns `true` if the response must not be stored.
    pub fn forbids_write(&self) -> bool {
        matches!(self, ControlAction::Skip)
    }
}

/// Maps the control header value to a [`ControlAction`].
///
/// Values are matched ASCII case-insensitively after trimming. Anything
/// unrecognized means [`ControlAction::None`].
///
/// ```
/// use routecache::{ControlAction, InvalidationController};
///
/// assert_eq!(InvalidationController::resolve(Some("Invalidate")), ControlAction::Invalidate);
/// assert_eq!(InvalidationController::resolve(Some("refresh")), ControlAction::None);
/// assert_eq!(InvalidationController::resolve(None), ControlAction::None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidationController;

impl InvalidationController {
    /// Resolves the action for a header value.
    pub fn resolve(header: Option<&str>) -> ControlAction {
        let Some(value) = header.map(str::trim) else {
            return ControlAction::None;
        };
        if value.eq_ignore_ascii_case(INVALIDATE) {
            ControlAction::Invalidate
        } else if value.eq_ignore_ascii_case(SKIP) {
            ControlAction::Skip
        } else {
            ControlAction::None
        }
    }
}
