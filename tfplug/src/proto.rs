//! Protocol buffer types for the Terraform Plugin Protocol v6
//!
//! The types are generated at build time by tonic-build from
//! `proto/tfplugin6.proto` and included here. Several protobuf messages
//! share names with framework types (`Schema`, `Diagnostic`); always access
//! them through the `tfplugin6` module to disambiguate.
//!
//! Naming follows prost conventions: RPC request/response pairs live in
//! snake_case modules (`get_provider_schema::Request`), nested messages in
//! sub-modules (`diagnostic::Severity`), and the gRPC service trait is
//! `provider_server::Provider`.

pub mod tfplugin6 {
    #![allow(clippy::all)]

    include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));
}

#[cfg(test)]
mod tests {
    use super::tfplugin6::*;

    #[test]
    fn proto_types_accessible() {
        let _ = DynamicValue::default();
        let _ = Diagnostic::default();
        let _ = AttributePath::default();
        let _ = ServerCapabilities::default();
        let _ = ClientCapabilities::default();
    }

    #[test]
    fn nested_types_accessible() {
        let _ = diagnostic::Severity::Invalid;
        let _ = attribute_path::step::Selector::AttributeName("test".to_string());
        let _ = schema::nested_block::NestingMode::Single;
    }

    #[test]
    fn request_response_types_accessible() {
        let _ = get_provider_schema::Request::default();
        let _ = get_provider_schema::Response::default();
        let _ = read_resource::Request::default();
        let _ = read_resource::Response::default();
    }
}
