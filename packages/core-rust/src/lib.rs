//! String service core: the `StringService` capability, its raw implementation,
//! and the HTTP message schemas shared by server and clients.

pub mod messages;
pub mod service;

pub use messages::{CountRequest, CountResponse, UppercaseRequest, UppercaseResponse};
pub use service::{BasicStringService, ServiceError, StringService};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
