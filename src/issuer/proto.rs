//! Messages and client stub for the `gcert.CertificateService` gRPC API.
//!
//! Kept in source instead of generated at build time so building the crate
//! does not need `protoc`. The wire contract is `proto/gcert.proto`.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CertificateRequest {
    #[prost(string, repeated, tag = "1")]
    pub domains: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(enumeration = "certificate_request::Endpoint", tag = "2")]
    pub endpoint: i32,
}

/// Nested types of [`CertificateRequest`].
pub mod certificate_request {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Endpoint {
        LeStaging = 0,
        LeProduction = 1,
    }

    impl Endpoint {
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Endpoint::LeStaging => "LE_STAGING",
                Endpoint::LeProduction => "LE_PRODUCTION",
            }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CertificateResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, repeated, tag = "2")]
    pub vault_paths: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

pub const GET_CERTIFICATE_PATH: &str = "/gcert.CertificateService/GetCertificate";

/// Client for `gcert.CertificateService`.
#[derive(Debug, Clone)]
pub struct CertificateServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl CertificateServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get_certificate(
        &mut self,
        request: impl tonic::IntoRequest<CertificateRequest>,
    ) -> Result<tonic::Response<CertificateResponse>, tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {e}")))?;

        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static(GET_CERTIFICATE_PATH);
        self.inner.unary(request.into_request(), path, codec).await
    }
}
