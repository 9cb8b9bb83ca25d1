#[cfg_attr(docsrs, doc(cfg(feature = "link-audit")))]
#[cfg(feature = "link-audit")]
#[doc(hidden)]
pub mod audit;

#[cfg(feature = "link-audit")]
pub use audit::{Audit, AuditHandle};
