pub mod cancel;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod observer;
pub mod policy;
pub mod probe;
pub mod ratelimit;
pub mod result;
pub mod transport;

pub use cancel::CancelSignal;
pub use dispatcher::{DEFAULT_USER_AGENT, Dispatcher, ScanReport};
pub use error::{ProbeFailure, ScanError};
pub use observer::{NoopObserver, ScanObserver, ScanPhase};
pub use policy::{HttpMethod, RequestPolicy};
pub use result::{Candidate, ProbeResult, ResultSet};
pub use transport::{RawResponse, ReqwestTransport, Transport};
