//! Server Instance resource and data sources.
//!
//! Server instances register themselves in the topology when they are set
//! up, so Terraform only adopts and edits them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    adopt_existing, data_source_schema, error_summary, from_state, list_data_source_schema,
    list_filter, list_state, name_attribute, read_existing, read_messages, required_value,
    retain_schema_attributes, to_state, type_attribute, update_existing, with_common_attributes,
    ConfigModel, DataSource, Resource, TypeRules,
};
use crate::client::wire::oneof_response;
use crate::client::{collection_path, object_path, ConfigClient, ListResponse, Messages};
use crate::error::ProviderError;
use crate::internaltypes::{
    bool_type_or_nil, int64_set, int64_type_or_nil, is_empty_string, string_set, string_type_or_nil,
};
use crate::operations::{
    add_bool_operation_if_necessary, add_int64_operation_if_necessary,
    add_set_operation_if_necessary, add_string_operation_if_necessary, Operation,
};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};
use crate::types::{
    ReadResult, Value, ValueBool, ValueInt64, ValueInt64Set, ValueString, ValueStringSet,
};

const COLLECTION: &str = "server-instances";
const OBJECT_NAME: &str = "Server Instance";

const PREFERRED_SECURITY: &[&str] = &["none", "ssl", "starttls"];

/// Attributes every kind of server instance carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInstanceFields {
    /// Schema URNs naming the object kind.
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Name of the object.
    pub id: String,
    /// Name of the server instance.
    pub server_instance_name: String,
    /// Cluster the instance belongs to.
    pub cluster_name: String,
    /// Location of the server instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_instance_location: Option<String>,
    /// Host name of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Installation directory of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_root: Option<String>,
    /// Version of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    /// Certificate used for inter-server communication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter_server_certificate: Option<String>,
    /// LDAP port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldap_port: Option<i64>,
    /// LDAPS port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldaps_port: Option<i64>,
    /// HTTP port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<i64>,
    /// HTTPS port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_port: Option<i64>,
    /// JMX port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jmx_port: Option<i64>,
    /// JMXS port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jmxs_port: Option<i64>,
    /// Preferred security for connections to this instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_security: Option<String>,
    /// Whether StartTLS is enabled on the LDAP port.
    #[serde(rename = "startTLSEnabled", default, skip_serializing_if = "Option::is_none")]
    pub start_tls_enabled: Option<bool>,
    /// Base DNs served by this instance.
    #[serde(rename = "baseDN", default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<Vec<String>>,
    /// Server groups this instance belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_of_server_group: Option<Vec<String>>,
    /// Notifications and required actions from the server.
    #[serde(
        rename = "urn:pingidentity:schemas:configuration:messages:2.0",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Messages>,
}

/// A `directory` server instance, which adds replication settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryServerInstanceResponse {
    /// Access log field names.
    #[serde(flatten)]
    pub fields: ServerInstanceFields,
    /// Replication port (`directory` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_port: Option<i64>,
    /// Replication server ID (`directory` only).
    #[serde(rename = "replicationServerID", default, skip_serializing_if = "Option::is_none")]
    pub replication_server_id: Option<i64>,
    /// Replication domain server IDs (`directory` only).
    #[serde(rename = "replicationDomainServerID", default, skip_serializing_if = "Option::is_none")]
    pub replication_domain_server_id: Option<Vec<i64>>,
    /// Replication domain server ID to DN mappings (`directory` only).
    #[serde(
        rename = "replicationDomainServerIDToReplicationDomainDN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub replication_domain_server_id_to_replication_domain_dn: Option<Vec<String>>,
}

oneof_response!(
    /// A server instance as returned by the configuration API.
    ServerInstanceResponse, "server-instance" {
        "proxy" => Proxy(ServerInstanceFields),
        "metrics-engine" => MetricsEngine(ServerInstanceFields),
        "authorize" => Authorize(ServerInstanceFields),
        "sync" => SyncServer(ServerInstanceFields),
        "directory" => Directory(DirectoryServerInstanceResponse),
    }
);

impl ServerInstanceResponse {
    /// The attributes every kind carries.
    pub fn fields(&self) -> &ServerInstanceFields {
        match self {
            Self::Proxy(f) | Self::MetricsEngine(f) | Self::Authorize(f) | Self::SyncServer(f) => f,
            Self::Directory(r) => &r.fields,
        }
    }
}

impl ConfigClient {
    /// GET a server instance.
    pub async fn get_server_instance(
        &self,
        name: &str,
    ) -> Result<ServerInstanceResponse, ProviderError> {
        self.get(&object_path(COLLECTION, name)).await
    }

    /// List server instances.
    pub async fn list_server_instances(
        &self,
        filter: Option<&str>,
    ) -> Result<ListResponse<ServerInstanceResponse>, ProviderError> {
        self.list(&collection_path(COLLECTION), filter).await
    }
}

/// Plan and state of a server instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerInstanceModel {
    /// Name of the object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub id: ValueString,
    /// Name of the object.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub name: ValueString,
    /// Timestamp of the last update made by this provider.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub last_updated: ValueString,
    /// Notifications returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub notifications: ValueStringSet,
    /// Required actions returned by the configuration API.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub required_actions: ValueStringSet,
    /// The object's kind.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub r#type: ValueString,
    /// Name of the server instance.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub server_instance_name: ValueString,
    /// Cluster the instance belongs to.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub cluster_name: ValueString,
    /// Location of the server instance.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub server_instance_location: ValueString,
    /// Host name of the server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub hostname: ValueString,
    /// Installation directory of the server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub server_root: ValueString,
    /// Version of the server.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub server_version: ValueString,
    /// Certificate used for inter-server communication.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub inter_server_certificate: ValueString,
    /// LDAP port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub ldap_port: ValueInt64,
    /// LDAPS port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub ldaps_port: ValueInt64,
    /// HTTP port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub http_port: ValueInt64,
    /// HTTPS port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub https_port: ValueInt64,
    /// Replication port (`directory` only).
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub replication_port: ValueInt64,
    /// Replication server ID (`directory` only).
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub replication_server_id: ValueInt64,
    /// Replication domain server IDs (`directory` only).
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub replication_domain_server_id: ValueInt64Set,
    /// Replication domain server ID to DN mappings (`directory` only).
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub replication_domain_server_id_to_replication_domain_dn: ValueStringSet,
    /// JMX port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub jmx_port: ValueInt64,
    /// JMXS port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub jmxs_port: ValueInt64,
    /// Preferred security for connections to this instance.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub preferred_security: ValueString,
    /// Whether StartTLS is enabled on the LDAP port.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub start_tls_enabled: ValueBool,
    /// Base DNs served by this instance.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub base_dn: ValueStringSet,
    /// Server groups this instance belongs to.
    #[serde(default, skip_serializing_if = "Value::is_unknown")]
    pub member_of_server_group: ValueStringSet,
}

/// Copy a server instance response into state.
pub fn read_server_instance_response(
    response: &ServerInstanceResponse,
    state: &mut ServerInstanceModel,
    expected: Option<&ServerInstanceModel>,
) {
    let empty = |value: Option<&ValueString>| value.is_some_and(is_empty_string);
    let f = response.fields();

    state.r#type = Value::Known(response.type_name().to_string());
    state.id = Value::Known(f.id.clone());
    if state.name.is_unknown() {
        state.name = Value::Known(f.id.clone());
    }
    state.server_instance_name = Value::Known(f.server_instance_name.clone());
    state.cluster_name = Value::Known(f.cluster_name.clone());
    state.server_instance_location = string_type_or_nil(
        f.server_instance_location.as_deref(),
        empty(expected.map(|e| &e.server_instance_location)),
    );
    state.hostname =
        string_type_or_nil(f.hostname.as_deref(), empty(expected.map(|e| &e.hostname)));
    state.server_root =
        string_type_or_nil(f.server_root.as_deref(), empty(expected.map(|e| &e.server_root)));
    state.server_version =
        string_type_or_nil(f.server_version.as_deref(), empty(expected.map(|e| &e.server_version)));
    state.inter_server_certificate = string_type_or_nil(
        f.inter_server_certificate.as_deref(),
        empty(expected.map(|e| &e.inter_server_certificate)),
    );
    state.ldap_port = int64_type_or_nil(f.ldap_port);
    state.ldaps_port = int64_type_or_nil(f.ldaps_port);
    state.http_port = int64_type_or_nil(f.http_port);
    state.https_port = int64_type_or_nil(f.https_port);
    state.jmx_port = int64_type_or_nil(f.jmx_port);
    state.jmxs_port = int64_type_or_nil(f.jmxs_port);
    state.preferred_security = string_type_or_nil(
        f.preferred_security.as_deref(),
        empty(expected.map(|e| &e.preferred_security)),
    );
    state.start_tls_enabled = bool_type_or_nil(f.start_tls_enabled);
    state.base_dn = string_set(f.base_dn.as_deref());
    state.member_of_server_group = string_set(f.member_of_server_group.as_deref());

    match response {
        ServerInstanceResponse::Directory(r) => {
            state.replication_port = int64_type_or_nil(r.replication_port);
            state.replication_server_id = int64_type_or_nil(r.replication_server_id);
            state.replication_domain_server_id =
                int64_set(r.replication_domain_server_id.as_deref());
            state.replication_domain_server_id_to_replication_domain_dn =
                string_set(r.replication_domain_server_id_to_replication_domain_dn.as_deref());
        },
        _ => {
            state.replication_port = Value::Null;
            state.replication_server_id = Value::Null;
            state.replication_domain_server_id = Value::Null;
            state.replication_domain_server_id_to_replication_domain_dn = Value::Null;
        },
    }

    let (notifications, required_actions) = read_messages(f.messages.as_ref());
    state.notifications = notifications;
    state.required_actions = required_actions;
}

/// Operations turning `state` into `plan`.
pub fn create_server_instance_operations(
    plan: &ServerInstanceModel,
    state: &ServerInstanceModel,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    add_string_operation_if_necessary(
        &mut ops,
        &plan.server_instance_name,
        &state.server_instance_name,
        "serverInstanceName",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.cluster_name,
        &state.cluster_name,
        "clusterName",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.server_instance_location,
        &state.server_instance_location,
        "serverInstanceLocation",
    );
    add_string_operation_if_necessary(&mut ops, &plan.hostname, &state.hostname, "hostname");
    add_string_operation_if_necessary(
        &mut ops,
        &plan.server_root,
        &state.server_root,
        "serverRoot",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.server_version,
        &state.server_version,
        "serverVersion",
    );
    add_string_operation_if_necessary(
        &mut ops,
        &plan.inter_server_certificate,
        &state.inter_server_certificate,
        "interServerCertificate",
    );
    add_int64_operation_if_necessary(&mut ops, &plan.ldap_port, &state.ldap_port, "ldapPort");
    add_int64_operation_if_necessary(&mut ops, &plan.ldaps_port, &state.ldaps_port, "ldapsPort");
    add_int64_operation_if_necessary(&mut ops, &plan.http_port, &state.http_port, "httpPort");
    add_int64_operation_if_necessary(&mut ops, &plan.https_port, &state.https_port, "httpsPort");
    add_int64_operation_if_necessary(
        &mut ops,
        &plan.replication_port,
        &state.replication_port,
        "replicationPort",
    );
    add_int64_operation_if_necessary(
        &mut ops,
        &plan.replication_server_id,
        &state.replication_server_id,
        "replicationServerID",
    );
    add_set_operation_if_necessary(
        &mut ops,
        &plan.replication_domain_server_id,
        &state.replication_domain_server_id,
        "replicationDomainServerID",
    );
    add_set_operation_if_necessary(
        &mut ops,
        &plan.replication_domain_server_id_to_replication_domain_dn,
        &state.replication_domain_server_id_to_replication_domain_dn,
        "replicationDomainServerIDToReplicationDomainDN",
    );
    add_int64_operation_if_necessary(&mut ops, &plan.jmx_port, &state.jmx_port, "jmxPort");
    add_int64_operation_if_necessary(&mut ops, &plan.jmxs_port, &state.jmxs_port, "jmxsPort");
    add_string_operation_if_necessary(
        &mut ops,
        &plan.preferred_security,
        &state.preferred_security,
        "preferredSecurity",
    );
    add_bool_operation_if_necessary(
        &mut ops,
        &plan.start_tls_enabled,
        &state.start_tls_enabled,
        "startTLSEnabled",
    );
    add_set_operation_if_necessary(&mut ops, &plan.base_dn, &state.base_dn, "baseDN");
    add_set_operation_if_necessary(
        &mut ops,
        &plan.member_of_server_group,
        &state.member_of_server_group,
        "memberOfServerGroup",
    );
    ops
}

impl ConfigModel for ServerInstanceModel {
    type Response = ServerInstanceResponse;

    fn read_response(&mut self, response: &Self::Response, expected: Option<&Self>) {
        read_server_instance_response(response, self, expected);
    }

    fn operations(plan: &Self, state: &Self) -> Vec<Operation> {
        create_server_instance_operations(plan, state)
    }

    fn populate_unknown_values(&mut self) {
        self.id.null_if_unknown();
        self.name.null_if_unknown();
        self.last_updated.null_if_unknown();
        self.notifications.null_if_unknown();
        self.required_actions.null_if_unknown();
        self.r#type.null_if_unknown();
        self.server_instance_name.null_if_unknown();
        self.cluster_name.null_if_unknown();
        self.server_instance_location.null_if_unknown();
        self.hostname.null_if_unknown();
        self.server_root.null_if_unknown();
        self.server_version.null_if_unknown();
        self.inter_server_certificate.null_if_unknown();
        self.ldap_port.null_if_unknown();
        self.ldaps_port.null_if_unknown();
        self.http_port.null_if_unknown();
        self.https_port.null_if_unknown();
        self.replication_port.null_if_unknown();
        self.replication_server_id.null_if_unknown();
        self.replication_domain_server_id.null_if_unknown();
        self.replication_domain_server_id_to_replication_domain_dn.null_if_unknown();
        self.jmx_port.null_if_unknown();
        self.jmxs_port.null_if_unknown();
        self.preferred_security.null_if_unknown();
        self.start_tls_enabled.null_if_unknown();
        self.base_dn.null_if_unknown();
        self.member_of_server_group.null_if_unknown();
    }

    fn set_last_updated(&mut self, value: ValueString) {
        self.last_updated = value;
    }

    fn type_attr(&self) -> Option<&ValueString> {
        Some(&self.r#type)
    }
}

const RULES: TypeRules = TypeRules {
    allowed: &[
        ("replication_port", &["directory"]),
        ("replication_server_id", &["directory"]),
        ("replication_domain_server_id", &["directory"]),
        ("replication_domain_server_id_to_replication_domain_dn", &["directory"]),
    ],
    required: &[],
};

/// Schema of `pingdirectory_default_server_instance`.
pub fn server_instance_schema() -> Schema {
    let port = |description: &str| {
        Attribute::optional_computed_int64()
            .with_validator(Validator::Between(1, 65535))
            .with_description(description.to_string())
    };
    let string = |description: &str| {
        Attribute::optional_computed_string().with_description(description.to_string())
    };

    let schema = Schema::v0()
        .with_description("Manages a Server Instance that already exists in the topology.")
        .with_attribute("name", name_attribute(OBJECT_NAME))
        .with_attribute(
            "type",
            type_attribute(ServerInstanceResponse::TYPES, OBJECT_NAME, true),
        )
        .with_attribute(
            "server_instance_name",
            string("The name of this Server Instance. The instance name needs to be unique."),
        )
        .with_attribute(
            "cluster_name",
            string("The name of the cluster to which this Server Instance belongs."),
        )
        .with_attribute(
            "server_instance_location",
            string("Specifies the location for the Server Instance."),
        )
        .with_attribute(
            "hostname",
            string("The name of the host where this Server Instance is installed."),
        )
        .with_attribute(
            "server_root",
            string("The file system path where this Server Instance is installed."),
        )
        .with_attribute("server_version", string("The version of the server."))
        .with_attribute(
            "inter_server_certificate",
            string("The public component of the certificate used by this instance to protect \
                    inter-server communication."),
        )
        .with_attribute(
            "ldap_port",
            port("The TCP port on which this server is listening for LDAP connections."),
        )
        .with_attribute(
            "ldaps_port",
            port("The TCP port on which this server is listening for LDAP secure connections."),
        )
        .with_attribute(
            "http_port",
            port("The TCP port on which this server is listening for HTTP connections."),
        )
        .with_attribute(
            "https_port",
            port("The TCP port on which this server is listening for HTTPS connections."),
        )
        .with_attribute(
            "replication_port",
            port("When the `type` attribute is set to `directory`: the replication TCP port."),
        )
        .with_attribute(
            "replication_server_id",
            port("When the `type` attribute is set to `directory`: specifies a unique identifier \
                  for the replication server on this server instance."),
        )
        .with_attribute(
            "replication_domain_server_id",
            Attribute::optional_computed_int64_set().with_description(
                "When the `type` attribute is set to `directory`: specifies a unique identifier \
                 for the Directory Server within the replication domain.",
            ),
        )
        .with_attribute(
            "replication_domain_server_id_to_replication_domain_dn",
            Attribute::optional_computed_string_set().with_description(
                "When the `type` attribute is set to `directory`: maps the replication domain \
                 server ID to the replication domain DN.",
            ),
        )
        .with_attribute(
            "jmx_port",
            port("The TCP port on which this server is listening for JMX connections."),
        )
        .with_attribute(
            "jmxs_port",
            port("The TCP port on which this server is listening for JMX secure connections."),
        )
        .with_attribute(
            "preferred_security",
            string(
                "Specifies the preferred mechanism to use for securing connections to the server.",
            )
            .with_validator(Validator::one_of(PREFERRED_SECURITY)),
        )
        .with_attribute(
            "start_tls_enabled",
            Attribute::optional_computed_bool()
                .with_description("Indicates whether StartTLS is enabled on this server."),
        )
        .with_attribute(
            "base_dn",
            Attribute::optional_computed_string_set()
                .with_description("The set of base DNs under the root DSE."),
        )
        .with_attribute(
            "member_of_server_group",
            Attribute::optional_computed_string_set()
                .with_description("The set of groups of which this server is a member."),
        );
    with_common_attributes(schema, OBJECT_NAME)
}

/// `pingdirectory_default_server_instance`.
pub struct DefaultServerInstanceResource;

#[async_trait]
impl Resource for DefaultServerInstanceResource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_default_server_instance"
    }

    fn schema(&self) -> Schema {
        server_instance_schema()
    }

    fn validate_config(&self, config: &JsonValue) -> Vec<Diagnostic> {
        RULES.check(config, self.type_name(), false)
    }

    async fn create(
        &self,
        client: &ConfigClient,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let plan: ServerInstanceModel = from_state(plan)?;
        let name = required_value(&plan.name, "name")?;
        let state =
            adopt_existing(client, &object_path(COLLECTION, &name), plan, OBJECT_NAME).await?;
        to_state(&state)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        state: JsonValue,
    ) -> Result<ReadResult, ProviderError> {
        let state: ServerInstanceModel = from_state(state)?;
        let name = required_value(&state.name, "name")?;
        read_existing(client, &object_path(COLLECTION, &name), state, OBJECT_NAME).await
    }

    async fn update(
        &self,
        client: &ConfigClient,
        prior: JsonValue,
        plan: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let prior: ServerInstanceModel = from_state(prior)?;
        let plan: ServerInstanceModel = from_state(plan)?;
        let name = required_value(&prior.name, "name")?;
        update_existing(client, &object_path(COLLECTION, &name), prior, plan, OBJECT_NAME).await
    }

    async fn delete(&self, _client: &ConfigClient, state: JsonValue) -> Result<(), ProviderError> {
        debug!(state = %state, "Server Instance is left in place on delete");
        Ok(())
    }
}

/// `pingdirectory_server_instance` data source.
pub struct ServerInstanceDataSource;

#[async_trait]
impl DataSource for ServerInstanceDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_server_instance"
    }

    fn schema(&self) -> Schema {
        data_source_schema(&server_instance_schema(), Some("name"))
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let mut state: ServerInstanceModel = from_state(config)?;
        let name = required_value(&state.name, "name")?;
        let response = client
            .get_server_instance(&name)
            .await
            .map_err(|e| e.context(error_summary("getting", OBJECT_NAME)))?;
        read_server_instance_response(&response, &mut state, None);
        state.populate_unknown_values();
        Ok(retain_schema_attributes(to_state(&state)?, &self.schema()))
    }
}

/// `pingdirectory_server_instances` list data source.
pub struct ServerInstancesDataSource;

#[async_trait]
impl DataSource for ServerInstancesDataSource {
    fn type_name(&self) -> &'static str {
        "pingdirectory_server_instances"
    }

    fn schema(&self) -> Schema {
        list_data_source_schema(OBJECT_NAME)
    }

    async fn read(
        &self,
        client: &ConfigClient,
        config: JsonValue,
    ) -> Result<JsonValue, ProviderError> {
        let filter = list_filter(&config);
        let list = client
            .list_server_instances(filter)
            .await
            .map_err(|e| e.context(error_summary("listing", OBJECT_NAME)))?;
        Ok(list_state(filter, list.resources.iter().map(|r| r.fields().id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ConfigClient {
        ConfigClient::with_base_url(
            format!("{}/config", server.uri()),
            "cn=administrator",
            "password",
        )
    }

    fn directory_response() -> JsonValue {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:server-instance:directory"],
            "id": "ds1",
            "serverInstanceName": "ds1",
            "clusterName": "cluster_ds1",
            "hostname": "ds1.example.com",
            "serverRoot": "/opt/out/instance",
            "serverVersion": "10.3.0.0",
            "ldapPort": 1389,
            "ldapsPort": 1636,
            "httpsPort": 1443,
            "replicationPort": 8989,
            "replicationServerID": 25,
            "replicationDomainServerID": [4, 1],
            "replicationDomainServerIDToReplicationDomainDN": [
                "4:dc=example,dc=com",
                "1:cn=schema"
            ],
            "preferredSecurity": "ssl",
            "startTLSEnabled": true,
            "baseDN": ["dc=example,dc=com"]
        })
    }

    fn directory_state() -> ServerInstanceModel {
        let response: ServerInstanceResponse =
            serde_json::from_value(directory_response()).unwrap();
        let mut state = ServerInstanceModel::default();
        read_server_instance_response(&response, &mut state, None);
        state
    }

    #[test]
    fn test_read_directory_instance() {
        let state = directory_state();
        assert_eq!(state.r#type, ValueString::from("directory"));
        assert_eq!(state.ldap_port, Value::Known(1389));
        assert!(state.http_port.is_null());
        assert_eq!(state.replication_server_id, Value::Known(25));
        assert_eq!(
            state.replication_domain_server_id,
            Value::Known([1, 4].into_iter().collect())
        );
        assert_eq!(state.member_of_server_group, Value::Known(Default::default()));
        assert_eq!(state.start_tls_enabled, Value::Known(true));
        assert!(create_server_instance_operations(&state, &state).is_empty());
    }

    #[test]
    fn test_proxy_instance_has_no_replication_settings() {
        let mut response = directory_response();
        response["schemas"] =
            json!(["urn:pingidentity:schemas:configuration:2.0:server-instance:proxy"]);
        let response: ServerInstanceResponse = serde_json::from_value(response).unwrap();
        let mut state = ServerInstanceModel::default();
        read_server_instance_response(&response, &mut state, None);
        assert_eq!(state.r#type, ValueString::from("proxy"));
        assert!(state.replication_port.is_null());
        assert!(state.replication_domain_server_id.is_null());
    }

    #[test]
    fn test_set_diff_ignores_order_and_sends_strings() {
        let state = directory_state();
        let mut plan = state.clone();
        plan.replication_domain_server_id = Value::Known([4, 1].into_iter().collect());
        assert!(create_server_instance_operations(&plan, &state).is_empty());

        plan.base_dn = Value::Known(Default::default());
        plan.member_of_server_group =
            Value::Known(["group-a".to_string()].into_iter().collect());
        assert_eq!(
            create_server_instance_operations(&plan, &state),
            vec![
                Operation::remove("baseDN"),
                Operation::replace("memberOfServerGroup", json!(["group-a"])),
            ]
        );
    }

    #[test]
    fn test_validation() {
        let resource = DefaultServerInstanceResource;
        let schema = resource.schema();
        let diagnostics =
            validation::validate(&schema, &json!({"name": "ds1", "ldap_port": 70000}));
        assert_eq!(diagnostics.len(), 1);
        let diagnostics =
            validation::validate(&schema, &json!({"name": "ds1", "preferred_security": "tls"}));
        assert_eq!(diagnostics.len(), 1);
        let diagnostics = resource.validate_config(
            &json!({"name": "p1", "type": "proxy", "replication_port": 8989}),
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_update_changes_port() {
        let server = MockServer::start().await;
        let mut updated = directory_response();
        updated["ldapPort"] = json!(389);
        Mock::given(method("PATCH"))
            .and(path("/config/server-instances/ds1"))
            .and(body_json(json!({"operations": [
                {"op": "replace", "path": "ldapPort", "value": "389"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(updated))
            .expect(1)
            .mount(&server)
            .await;

        let mut prior = directory_state();
        prior.last_updated = Value::Null;
        let mut plan = prior.clone();
        plan.ldap_port = Value::Known(389);
        plan.last_updated = Value::Unknown;

        let state = DefaultServerInstanceResource
            .update(&client(&server), to_state(&prior).unwrap(), to_state(&plan).unwrap())
            .await
            .unwrap();
        assert_eq!(state["ldap_port"], 389);
        assert!(state["last_updated"].is_string());
    }

    #[tokio::test]
    async fn test_read_error_is_reported_with_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = DefaultServerInstanceResource
            .read(&client(&server), json!({"name": "ds1"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_diagnostic().summary,
            "An error occurred while getting the Server Instance"
        );
    }
}
