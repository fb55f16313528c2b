//! gRPC service implementation for the Terraform Plugin Protocol v6
//!
//! `ProviderServer` hosts a `Provider` behind the tfplugin6 gRPC service,
//! prints the go-plugin handshake line, and serves on an ephemeral loopback
//! port. Resources are created on demand through the provider factory, so
//! no locks are held across resource operations.

use crate::context::Context;
use crate::defaults::DefaultRequest;
use crate::error::TfplugError;
use crate::plan_modifier::PlanModifyRequest;
use crate::proto::tfplugin6::{
    provider_server::{Provider as ProtoProvider, ProviderServer as ProtoProviderServer},
    *,
};
use crate::provider::Provider;
use crate::request::{
    ConfigureRequest, CreateRequest, DeleteRequest, ImportRequest, ReadRequest, UpdateRequest,
};
use crate::schema::Schema as FrameworkSchema;
use crate::types::{Config, Diagnostics as TfplugDiagnostics, Dynamic, State};
use crate::Result;
use rmp_serde::{decode, encode};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};

pub struct ProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    tls_identity: Option<(PathBuf, PathBuf)>,
}

impl<P: Provider + 'static> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            tls_identity: None,
        }
    }

    /// Serve with a TLS identity loaded from PEM files. Without this the
    /// server speaks plaintext gRPC on the loopback interface.
    pub fn with_tls(mut self, cert_path: PathBuf, key_path: PathBuf) -> Self {
        self.tls_identity = Some((cert_path, key_path));
        self
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let bound_addr = listener.local_addr()?;

        let service = ProviderService {
            provider: self.provider.clone(),
        };

        let mut builder = Server::builder();

        if let Some((cert_path, key_path)) = &self.tls_identity {
            if rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .is_err()
            {
                tracing::debug!("rustls crypto provider already installed");
            }

            let cert = tokio::fs::read(cert_path)
                .await
                .map_err(|e| TfplugError::TlsError(format!("failed to read certificate: {}", e)))?;
            let key = tokio::fs::read(key_path)
                .await
                .map_err(|e| TfplugError::TlsError(format!("failed to read key: {}", e)))?;

            let identity = Identity::from_pem(cert, key);
            builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        }

        // go-plugin handshake: core-version|protocol-version|network|addr|protocol
        println!("1|6|tcp|127.0.0.1:{}|grpc", bound_addr.port());
        tracing::info!(port = bound_addr.port(), "provider server listening");

        let stream = TcpListenerStream::new(listener);

        builder
            .add_service(ProtoProviderServer::new(service))
            .serve_with_incoming(stream)
            .await?;

        Ok(())
    }
}

struct ProviderService<P: Provider> {
    provider: Arc<RwLock<P>>,
}

#[tonic::async_trait]
impl<P: Provider + 'static> ProtoProvider for ProviderService<P> {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> std::result::Result<Response<get_metadata::Response>, Status> {
        let provider = self.provider.read().await;
        let mut resources: Vec<get_metadata::ResourceMetadata> = provider
            .resource_schemas()
            .await
            .into_keys()
            .map(|type_name| get_metadata::ResourceMetadata { type_name })
            .collect();
        resources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(Response::new(get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            data_sources: vec![],
            resources,
            functions: vec![],
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> std::result::Result<Response<get_provider_schema::Response>, Status> {
        let provider = self.provider.read().await;

        let provider_schema = convert_schema(&provider.provider_schema());

        let mut resources = HashMap::new();
        for (name, schema) in provider.resource_schemas().await {
            resources.insert(name, convert_schema(&schema));
        }

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(provider_schema),
            resource_schemas: resources,
            data_source_schemas: HashMap::new(),
            diagnostics: vec![],
            provider_meta: None,
            server_capabilities: Some(server_capabilities()),
            functions: HashMap::new(),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> std::result::Result<Response<validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let _config = decode_dynamic_value(&req.config)?;

        Ok(Response::new(validate_provider_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> std::result::Result<Response<validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name;

        let provider = self.provider.read().await;
        let schemas = provider.resource_schemas().await;
        let schema = match schemas.get(&type_name) {
            Some(s) => s,
            None => {
                return Ok(Response::new(validate_resource_config::Response {
                    diagnostics: vec![error_diagnostic(
                        format!("Unknown resource type: {}", type_name),
                        String::new(),
                        None,
                    )],
                }))
            }
        };

        let config = match decode_dynamic_value(&req.config) {
            Ok(config) => config,
            Err(e) => {
                // Configs holding unknown values cannot be decoded during
                // planning; validation reruns at apply time.
                tracing::debug!(error = %e.message(), "skipping validation of undecodable config");
                return Ok(Response::new(validate_resource_config::Response {
                    diagnostics: vec![],
                }));
            }
        };

        let mut diagnostics = Vec::new();

        for (attr_name, attr) in &schema.attributes {
            if attr.required && !config.values.contains_key(attr_name) {
                diagnostics.push(error_diagnostic(
                    format!("Missing required field: {}", attr_name),
                    format!("The field '{}' is required but was not provided", attr_name),
                    Some(attribute_path(attr_name)),
                ));
            }
        }

        for (field_name, value) in &config.values {
            match schema.attributes.get(field_name) {
                Some(attr) => {
                    if !validate_dynamic_type(value, &attr.r#type) {
                        diagnostics.push(error_diagnostic(
                            format!("Type mismatch for field: {}", field_name),
                            format!(
                                "Field '{}' expects type {:?} but got {}",
                                field_name,
                                attr.r#type,
                                value.type_name()
                            ),
                            Some(attribute_path(field_name)),
                        ));
                        continue;
                    }

                    let mut validator_diags = TfplugDiagnostics::new();
                    for validator in &attr.validators {
                        validator.validate(value, field_name, &mut validator_diags);
                    }
                    diagnostics.extend(encode_diagnostics(&validator_diags));
                }
                None => {
                    diagnostics.push(error_diagnostic(
                        format!("Unknown field: {}", field_name),
                        format!(
                            "The field '{}' is not defined in the resource schema",
                            field_name
                        ),
                        Some(attribute_path(field_name)),
                    ));
                }
            }
        }

        Ok(Response::new(validate_resource_config::Response {
            diagnostics,
        }))
    }

    async fn validate_data_resource_config(
        &self,
        _request: Request<validate_data_resource_config::Request>,
    ) -> std::result::Result<Response<validate_data_resource_config::Response>, Status> {
        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> std::result::Result<Response<upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();

        // Schemas are all still at version 0; hand the stored JSON state
        // back unchanged.
        let upgraded_state = req.raw_state.as_ref().map(|raw| DynamicValue {
            msgpack: vec![],
            json: raw.json.clone(),
        });

        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state,
            diagnostics: vec![],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> std::result::Result<Response<configure_provider::Response>, Status> {
        let req = request.into_inner();
        let config = decode_dynamic_value(&req.config)?;

        tracing::debug!(
            keys = ?config.values.keys().collect::<Vec<_>>(),
            terraform_version = %req.terraform_version,
            "configuring provider"
        );

        let configure_req = ConfigureRequest {
            context: Context::new(),
            config,
        };

        let mut provider = self.provider.write().await;
        let response = provider.configure(configure_req).await;

        Ok(Response::new(configure_provider::Response {
            diagnostics: encode_diagnostics(&response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> std::result::Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name;

        let provider = self.provider.read().await;
        let resource = provider
            .create_resource(&type_name)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let current_state = decode_dynamic_value(&req.current_state)?;

        let read_resp = resource
            .read(ReadRequest {
                context: Context::new(),
                current_state: State {
                    values: current_state.values,
                },
            })
            .await;

        // None signals that the remote object vanished; returning no state
        // makes Terraform drop it and plan a create.
        let new_state = match read_resp.state {
            Some(state) => Some(encode_state(&state)?),
            None => None,
        };

        Ok(Response::new(read_resource::Response {
            new_state,
            diagnostics: encode_diagnostics(&read_resp.diagnostics),
            private: vec![],
            deferred: None,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> std::result::Result<Response<plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name.clone();

        let provider = self.provider.read().await;
        let resource_schemas = provider.resource_schemas().await;
        let resource_schema = resource_schemas
            .get(&type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))?;

        let prior_state = decode_dynamic_value(&req.prior_state)?.values;
        let config = decode_dynamic_value(&req.config)?.values;
        let proposed_new_state = decode_dynamic_value(&req.proposed_new_state)?.values;

        // Destroy plans pass through untouched.
        if proposed_new_state.is_empty() && !prior_state.is_empty() {
            return Ok(Response::new(plan_resource_change::Response {
                planned_state: Some(encode_dynamic_values(&proposed_new_state)?),
                requires_replace: vec![],
                planned_private: vec![],
                diagnostics: vec![],
                legacy_type_system: false,
                deferred: None,
            }));
        }

        let mut planned_state = proposed_new_state;
        let mut requires_replace = Vec::new();
        let mut all_diagnostics = TfplugDiagnostics::new();

        // Defaults fill optional+computed attributes the config left unset.
        for (attr_name, attr_schema) in &resource_schema.attributes {
            if let Some(default) = &attr_schema.default {
                if attr_schema.optional && attr_schema.computed {
                    let config_missing = config
                        .get(attr_name)
                        .map(|v| v.is_null())
                        .unwrap_or(true);
                    let planned_missing = planned_state
                        .get(attr_name)
                        .map(|v| v.is_null())
                        .unwrap_or(true);
                    if config_missing && planned_missing {
                        let response = default.default_value(DefaultRequest {
                            attribute_path: attr_name.clone(),
                        });
                        planned_state.insert(attr_name.clone(), response.value);
                    }
                }
            }
        }

        // Plan modifiers run per attribute, in registration order.
        for (attr_name, attr_schema) in &resource_schema.attributes {
            if attr_schema.plan_modifiers.is_empty() {
                continue;
            }

            let state_value = prior_state.get(attr_name).cloned().unwrap_or(Dynamic::Null);
            let config_value = config.get(attr_name).cloned().unwrap_or(Dynamic::Null);
            let mut current_plan_value = planned_state
                .get(attr_name)
                .cloned()
                .unwrap_or(Dynamic::Null);

            for modifier in &attr_schema.plan_modifiers {
                let response = modifier.modify_plan(PlanModifyRequest {
                    state: state_value.clone(),
                    plan: current_plan_value.clone(),
                    config: config_value.clone(),
                    attribute_path: attr_name.clone(),
                });

                current_plan_value = response.plan_value;

                if response.requires_replace {
                    tracing::debug!(
                        attribute = %attr_name,
                        modifier = %modifier.description(),
                        "attribute requires resource replacement"
                    );
                    requires_replace.push(attribute_path(attr_name));
                }

                all_diagnostics.extend(response.diagnostics);
            }

            match current_plan_value {
                Dynamic::Null => {
                    planned_state.remove(attr_name);
                }
                value => {
                    planned_state.insert(attr_name.clone(), value);
                }
            }
        }

        Ok(Response::new(plan_resource_change::Response {
            planned_state: Some(encode_dynamic_values(&planned_state)?),
            requires_replace,
            planned_private: vec![],
            diagnostics: encode_diagnostics(&all_diagnostics),
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> std::result::Result<Response<apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name;

        let provider = self.provider.read().await;
        let resource = provider
            .create_resource(&type_name)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let prior_state = decode_dynamic_value(&req.prior_state)?.values;
        let config = decode_dynamic_value(&req.config)?.values;
        let planned_state = decode_dynamic_value(&req.planned_state)?.values;

        let context = Context::new();

        let is_create = prior_state.is_empty() && !planned_state.is_empty();
        let is_delete = !prior_state.is_empty() && planned_state.is_empty();
        let is_update = !prior_state.is_empty() && !planned_state.is_empty();

        let (new_state, diagnostics) = if is_create {
            let create_resp = resource
                .create(CreateRequest {
                    context,
                    config: Config { values: config },
                    planned_state: State {
                        values: planned_state.clone(),
                    },
                })
                .await;
            (create_resp.state, create_resp.diagnostics)
        } else if is_delete {
            let delete_resp = resource
                .delete(DeleteRequest {
                    context,
                    current_state: State {
                        values: prior_state.clone(),
                    },
                })
                .await;
            (State::new(), delete_resp.diagnostics)
        } else if is_update {
            let update_resp = resource
                .update(UpdateRequest {
                    context,
                    config: Config { values: config },
                    planned_state: State {
                        values: planned_state.clone(),
                    },
                    current_state: State {
                        values: prior_state.clone(),
                    },
                })
                .await;
            (update_resp.state, update_resp.diagnostics)
        } else {
            (
                State {
                    values: planned_state.clone(),
                },
                TfplugDiagnostics::new(),
            )
        };

        if diagnostics.has_errors() {
            // Failed creates report the planned state so Terraform can
            // retry; other failures keep the prior state.
            let state_to_return = if is_create {
                &planned_state
            } else {
                &prior_state
            };

            return Ok(Response::new(apply_resource_change::Response {
                new_state: Some(encode_dynamic_values(state_to_return)?),
                diagnostics: encode_diagnostics(&diagnostics),
                private: vec![],
                legacy_type_system: false,
            }));
        }

        let new_state_value = if is_delete && new_state.values.is_empty() {
            None
        } else {
            Some(encode_state(&new_state)?)
        };

        Ok(Response::new(apply_resource_change::Response {
            new_state: new_state_value,
            diagnostics: encode_diagnostics(&diagnostics),
            private: vec![],
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> std::result::Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();

        let provider = self.provider.read().await;
        let resource = provider
            .create_resource(&req.type_name)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let import_resp = resource
            .import(ImportRequest {
                context: Context::new(),
                id: req.id.clone(),
            })
            .await;

        let mut imported_resources = Vec::new();
        if let Some(state) = import_resp.state {
            imported_resources.push(import_resource_state::ImportedResource {
                type_name: req.type_name.clone(),
                state: Some(encode_state(&state)?),
                private: vec![],
            });
        }

        Ok(Response::new(import_resource_state::Response {
            imported_resources,
            diagnostics: encode_diagnostics(&import_resp.diagnostics),
            deferred: None,
        }))
    }

    async fn read_data_source(
        &self,
        _request: Request<read_data_source::Request>,
    ) -> std::result::Result<Response<read_data_source::Response>, Status> {
        Err(Status::unimplemented(
            "this provider does not serve data sources",
        ))
    }

    async fn get_functions(
        &self,
        _request: Request<get_functions::Request>,
    ) -> std::result::Result<Response<get_functions::Response>, Status> {
        Ok(Response::new(get_functions::Response {
            functions: HashMap::new(),
            diagnostics: vec![],
        }))
    }

    async fn call_function(
        &self,
        _request: Request<call_function::Request>,
    ) -> std::result::Result<Response<call_function::Response>, Status> {
        Err(Status::unimplemented(
            "this provider does not serve functions",
        ))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> std::result::Result<Response<stop_provider::Response>, Status> {
        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}

// Helper functions

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

fn convert_schema(schema: &FrameworkSchema) -> Schema {
    let mut attributes: Vec<schema::Attribute> = schema
        .attributes
        .values()
        .map(|attr| schema::Attribute {
            name: attr.name.clone(),
            r#type: attr.r#type.to_wire_json(),
            nested_type: None,
            description: attr.description.clone(),
            required: attr.required,
            optional: attr.optional,
            computed: attr.computed,
            sensitive: attr.sensitive,
            description_kind: StringKind::Plain as i32,
            deprecated: false,
            write_only: false,
        })
        .collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    Schema {
        version: schema.version,
        block: Some(schema::Block {
            version: schema.version,
            attributes,
            block_types: vec![],
            description: schema.description.clone(),
            description_kind: StringKind::Plain as i32,
            deprecated: false,
        }),
    }
}

fn attribute_path(name: &str) -> AttributePath {
    AttributePath {
        steps: vec![attribute_path::Step {
            selector: Some(attribute_path::step::Selector::AttributeName(
                name.to_string(),
            )),
        }],
    }
}

fn error_diagnostic(summary: String, detail: String, attribute: Option<AttributePath>) -> Diagnostic {
    Diagnostic {
        severity: diagnostic::Severity::Error as i32,
        summary,
        detail,
        attribute,
    }
}

#[allow(clippy::result_large_err)]
fn decode_dynamic_value(value: &Option<DynamicValue>) -> std::result::Result<Config, Status> {
    let value = match value {
        Some(v) => v,
        None => return Ok(Config::new()),
    };

    if !value.msgpack.is_empty() {
        match decode::from_slice::<HashMap<String, Dynamic>>(&value.msgpack) {
            Ok(values) => Ok(Config { values }),
            Err(e) => {
                // A whole-value null arrives as a bare msgpack nil.
                match decode::from_slice::<Option<HashMap<String, Dynamic>>>(&value.msgpack) {
                    Ok(None) => Ok(Config::new()),
                    Ok(Some(values)) => Ok(Config { values }),
                    Err(_) => Err(Status::invalid_argument(format!(
                        "failed to decode msgpack value: {}",
                        e
                    ))),
                }
            }
        }
    } else if !value.json.is_empty() {
        match serde_json::from_slice::<Option<HashMap<String, Dynamic>>>(&value.json) {
            Ok(Some(values)) => Ok(Config { values }),
            Ok(None) => Ok(Config::new()),
            Err(e) => Err(Status::invalid_argument(format!(
                "failed to decode json value: {}",
                e
            ))),
        }
    } else {
        Ok(Config::new())
    }
}

#[allow(clippy::result_large_err)]
fn encode_dynamic_values(
    values: &HashMap<String, Dynamic>,
) -> std::result::Result<DynamicValue, Status> {
    let msgpack = encode::to_vec_named(values)
        .map_err(|e| Status::internal(format!("failed to encode msgpack value: {}", e)))?;

    Ok(DynamicValue {
        msgpack,
        json: vec![],
    })
}

#[allow(clippy::result_large_err)]
fn encode_state(state: &State) -> std::result::Result<DynamicValue, Status> {
    encode_dynamic_values(&state.values)
}

fn validate_dynamic_type(value: &Dynamic, expected_type: &crate::AttributeType) -> bool {
    use crate::AttributeType;

    match (value, expected_type) {
        // Null and unknown satisfy any type; they may be computed later.
        (Dynamic::Null, _) => true,
        (Dynamic::Unknown, _) => true,
        (Dynamic::String(_), AttributeType::String) => true,
        (Dynamic::Number(_), AttributeType::Number) => true,
        (Dynamic::Bool(_), AttributeType::Bool) => true,
        (Dynamic::List(list), AttributeType::List(elem_type)) => list
            .iter()
            .all(|elem| validate_dynamic_type(elem, elem_type)),
        (Dynamic::List(list), AttributeType::Set(elem_type)) => list
            .iter()
            .all(|elem| validate_dynamic_type(elem, elem_type)),
        (Dynamic::Map(map), AttributeType::Map(elem_type)) => map
            .values()
            .all(|elem| validate_dynamic_type(elem, elem_type)),
        (Dynamic::Map(map), AttributeType::Object(attrs)) => attrs.iter().all(
            |(field_name, field_type)| match map.get(field_name) {
                Some(field_value) => validate_dynamic_type(field_value, field_type),
                None => true,
            },
        ),
        _ => false,
    }
}

fn encode_diagnostics(diags: &TfplugDiagnostics) -> Vec<Diagnostic> {
    diags
        .errors
        .iter()
        .map(|e| Diagnostic {
            severity: diagnostic::Severity::Error as i32,
            summary: e.summary.clone(),
            detail: e.detail.clone().unwrap_or_default(),
            attribute: None,
        })
        .chain(diags.warnings.iter().map(|w| Diagnostic {
            severity: diagnostic::Severity::Warning as i32,
            summary: w.summary.clone(),
            detail: w.detail.clone().unwrap_or_default(),
            attribute: None,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::request::{
        ConfigureResponse, CreateResponse, DeleteResponse, ImportResponse, ReadResponse,
        UpdateResponse,
    };
    use crate::resource::Resource;
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::validator::NumberRangeValidator;
    use async_trait::async_trait;

    struct TestProvider;

    fn test_schema() -> FrameworkSchema {
        SchemaBuilder::new()
            .version(0)
            .description("Test resource")
            .attribute(AttributeBuilder::string("name").required().requires_replace())
            .attribute(
                AttributeBuilder::number("port")
                    .optional()
                    .validator(Arc::new(NumberRangeValidator {
                        min: Some(0.0),
                        max: Some(65535.0),
                    })),
            )
            .attribute(
                AttributeBuilder::bool("enabled")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(true)),
            )
            .build()
    }

    #[async_trait]
    impl Provider for TestProvider {
        fn provider_schema(&self) -> FrameworkSchema {
            SchemaBuilder::new()
                .description("Test provider")
                .attribute(AttributeBuilder::string("endpoint").optional())
                .build()
        }

        async fn configure(&mut self, _request: ConfigureRequest) -> ConfigureResponse {
            ConfigureResponse {
                diagnostics: TfplugDiagnostics::new(),
            }
        }

        async fn create_resource(&self, type_name: &str) -> Result<Box<dyn Resource>> {
            match type_name {
                "test_resource" => Ok(Box::new(TestResource)),
                _ => Err(TfplugError::ResourceNotFound(type_name.to_string())),
            }
        }

        async fn resource_schemas(&self) -> HashMap<String, FrameworkSchema> {
            let mut schemas = HashMap::new();
            schemas.insert("test_resource".to_string(), test_schema());
            schemas
        }
    }

    struct TestResource;

    #[async_trait]
    impl Resource for TestResource {
        async fn create(&self, request: CreateRequest) -> CreateResponse {
            CreateResponse {
                state: State {
                    values: request.planned_state.values,
                },
                diagnostics: TfplugDiagnostics::new(),
            }
        }

        async fn read(&self, request: ReadRequest) -> ReadResponse {
            ReadResponse {
                state: Some(request.current_state),
                diagnostics: TfplugDiagnostics::new(),
            }
        }

        async fn update(&self, request: UpdateRequest) -> UpdateResponse {
            UpdateResponse {
                state: request.planned_state,
                diagnostics: TfplugDiagnostics::new(),
            }
        }

        async fn delete(&self, _request: DeleteRequest) -> DeleteResponse {
            DeleteResponse {
                diagnostics: TfplugDiagnostics::new(),
            }
        }

        async fn import(&self, request: ImportRequest) -> ImportResponse {
            let mut values = HashMap::new();
            values.insert("name".to_string(), Dynamic::String(request.id));
            ImportResponse {
                state: Some(State { values }),
                diagnostics: TfplugDiagnostics::new(),
            }
        }
    }

    fn service() -> ProviderService<TestProvider> {
        ProviderService {
            provider: Arc::new(RwLock::new(TestProvider)),
        }
    }

    fn encoded(values: &HashMap<String, Dynamic>) -> Option<DynamicValue> {
        Some(encode_dynamic_values(values).unwrap())
    }

    #[tokio::test]
    async fn provider_schema_includes_resources() {
        let response = service()
            .get_provider_schema(Request::new(get_provider_schema::Request {}))
            .await
            .unwrap()
            .into_inner();

        assert!(response.provider.is_some());
        assert!(response.resource_schemas.contains_key("test_resource"));
        assert!(response.data_source_schemas.is_empty());

        let block = response.resource_schemas["test_resource"]
            .block
            .clone()
            .unwrap();
        let name_attr = block.attributes.iter().find(|a| a.name == "name").unwrap();
        assert!(name_attr.required);
        assert_eq!(name_attr.r#type, b"\"string\"");
    }

    #[tokio::test]
    async fn metadata_lists_resources() {
        let response = service()
            .get_metadata(Request::new(get_metadata::Request {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.resources.len(), 1);
        assert_eq!(response.resources[0].type_name, "test_resource");
    }

    #[tokio::test]
    async fn validate_reports_missing_required_and_validator_failures() {
        let mut values = HashMap::new();
        values.insert("port".to_string(), Dynamic::Number(90000.0));

        let response = service()
            .validate_resource_config(Request::new(validate_resource_config::Request {
                type_name: "test_resource".to_string(),
                config: encoded(&values),
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        let summaries: Vec<&str> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert!(summaries.iter().any(|s| s.contains("Missing required field: name")));
        assert!(summaries.iter().any(|s| s.contains("port must be at most")));
    }

    #[tokio::test]
    async fn plan_applies_defaults_and_requires_replace() {
        let mut prior = HashMap::new();
        prior.insert("name".to_string(), Dynamic::String("old".to_string()));

        let mut proposed = HashMap::new();
        proposed.insert("name".to_string(), Dynamic::String("new".to_string()));

        let response = service()
            .plan_resource_change(Request::new(plan_resource_change::Request {
                type_name: "test_resource".to_string(),
                prior_state: encoded(&prior),
                proposed_new_state: encoded(&proposed),
                config: encoded(&proposed),
                prior_private: vec![],
                provider_meta: None,
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.requires_replace.len(), 1);

        let planned =
            decode_dynamic_value(&response.planned_state).unwrap().values;
        assert_eq!(planned.get("enabled"), Some(&Dynamic::Bool(true)));
    }

    #[tokio::test]
    async fn plan_passes_destroy_through() {
        let mut prior = HashMap::new();
        prior.insert("name".to_string(), Dynamic::String("old".to_string()));

        let response = service()
            .plan_resource_change(Request::new(plan_resource_change::Request {
                type_name: "test_resource".to_string(),
                prior_state: encoded(&prior),
                proposed_new_state: encoded(&HashMap::new()),
                config: encoded(&HashMap::new()),
                prior_private: vec![],
                provider_meta: None,
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.requires_replace.is_empty());
        let planned = decode_dynamic_value(&response.planned_state).unwrap().values;
        assert!(planned.is_empty());
    }

    #[tokio::test]
    async fn apply_dispatches_create() {
        let mut planned = HashMap::new();
        planned.insert("name".to_string(), Dynamic::String("fresh".to_string()));

        let response = service()
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "test_resource".to_string(),
                prior_state: encoded(&HashMap::new()),
                planned_state: encoded(&planned),
                config: encoded(&planned),
                planned_private: vec![],
                provider_meta: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        let new_state = decode_dynamic_value(&response.new_state).unwrap().values;
        assert_eq!(
            new_state.get("name").and_then(|v| v.as_string()),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn apply_delete_returns_no_state() {
        let mut prior = HashMap::new();
        prior.insert("name".to_string(), Dynamic::String("gone".to_string()));

        let response = service()
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "test_resource".to_string(),
                prior_state: encoded(&prior),
                planned_state: encoded(&HashMap::new()),
                config: encoded(&HashMap::new()),
                planned_private: vec![],
                provider_meta: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn apply_rejects_unknown_resource_type() {
        let result = service()
            .apply_resource_change(Request::new(apply_resource_change::Request {
                type_name: "nonexistent".to_string(),
                prior_state: encoded(&HashMap::new()),
                planned_state: encoded(&HashMap::new()),
                config: encoded(&HashMap::new()),
                planned_private: vec![],
                provider_meta: None,
            }))
            .await;

        assert!(result.is_err());
        assert!(result.unwrap_err().message().contains("nonexistent"));
    }

    #[tokio::test]
    async fn import_round_trips_through_resource() {
        let response = service()
            .import_resource_state(Request::new(import_resource_state::Request {
                type_name: "test_resource".to_string(),
                id: "imported-name".to_string(),
                client_capabilities: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.imported_resources.len(), 1);
        let state =
            decode_dynamic_value(&response.imported_resources[0].state).unwrap().values;
        assert_eq!(
            state.get("name").and_then(|v| v.as_string()),
            Some("imported-name")
        );
    }
}
