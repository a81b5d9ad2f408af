//! Failure vocabulary shared by every port backed by the hosted platform.
//!
//! All remote collaborators (tables, remote procedures, auth endpoints) sit
//! behind one SDK surface, so their adapters report the same small set of
//! failure kinds.

use super::define_port_error;

define_port_error! {
    /// Errors raised by adapters that call the hosted database platform.
    pub enum RemoteError {
        /// The platform could not be reached or answered with a server error.
        Transport { message: String } =>
            ServiceUnavailable: "platform call failed: {message}",
        /// The caller's credentials were missing, expired or rejected.
        Unauthorized { message: String } =>
            Unauthorized: "platform rejected credentials: {message}",
        /// Row-level security or a role check denied the operation.
        Forbidden { message: String } =>
            Forbidden: "platform denied access: {message}",
        /// The addressed row or procedure does not exist.
        NotFound { message: String } =>
            NotFound: "platform resource missing: {message}",
        /// The platform refused the request as invalid.
        Rejected { status: u16, message: String } =>
            InvalidRequest: "platform rejected request ({status}): {message}",
        /// The payload could not be decoded or failed schema checks.
        Malformed { message: String } =>
            MalformedResponse: "platform returned malformed data: {message}",
    }
}
