//! 基础设施层
//!
//! 持有稀缺资源（HTTP 客户端与 cookie jar），只暴露能力

pub mod retry;
pub mod transport;

pub use retry::{with_retry, AttemptFailure, RetryPolicy};
pub use transport::{
    HttpTransport, Method, RequestBody, StatusCode, Transport, TransportRequest,
    TransportResponse, Url,
};
